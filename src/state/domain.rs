//! Estado compartido del tablero.
//!
//! `FarmState` es un handle clonable que agrupa los dos stores. Cada store queda
//! detrás de su propio `Mutex`, de modo que las escrituras concurrentes del polling
//! y del canal push quedan serializadas (orden total, "última escritura gana").
//! La vista lee un `DashboardSnapshot` consistente en cada tick de render.


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::device::domain::{ActivityEvent, DeviceState, DeviceStateStore, SystemStateSnapshot};
use crate::metric::domain::{HistoryPoint, MetricStore, Reading};


/// Copia inmutable del estado completo en un instante.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub reading: Option<Reading>,
    pub history: Vec<HistoryPoint>,
    pub devices: DeviceState,
    pub feed_alert: bool,
    pub activity: Vec<ActivityEvent>,
}


#[derive(Clone, Debug, Default)]
pub struct FarmState {
    metrics: Arc<Mutex<MetricStore>>,
    devices: Arc<Mutex<DeviceStateStore>>,
}


pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Los stores no quedan en estado inválido si un escritor entra en pánico.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}


impl FarmState {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_reading(&self, reading: Reading) {
        lock(&self.metrics).update(reading);
    }

    pub fn apply_activity_event(&self, event: ActivityEvent) -> bool {
        lock(&self.devices).apply_activity_event(event)
    }

    pub fn apply_system_state(&self, snapshot: SystemStateSnapshot) {
        lock(&self.devices).apply_system_state(snapshot);
    }

    #[cfg(test)]
    pub fn current_reading(&self) -> Option<Reading> {
        lock(&self.metrics).current()
    }

    #[cfg(test)]
    pub fn current_devices(&self) -> DeviceState {
        lock(&self.devices).current()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let metrics = lock(&self.metrics);
        let devices = lock(&self.devices);
        DashboardSnapshot {
            reading: metrics.current(),
            history: metrics.history().iter().cloned().collect(),
            devices: devices.current(),
            feed_alert: devices.feed_alert(),
            activity: devices.activity().iter().cloned().collect(),
        }
    }
}
