//! Estado de los actuadores (ventilador, bomba, luz) y feed de actividad.
//!
//! El estado se modifica por dos caminos independientes:
//! 1. `ActivityEvent`: notificación discreta que enciende o apaga un actuador.
//! 2. `SystemStateSnapshot`: estado autoritativo y parcial; solo los campos
//!    presentes sobrescriben.
//!
//! La consistencia es "última escritura gana" por campo, en orden de llegada.


use std::collections::VecDeque;
use chrono::Local;
use serde::Deserialize;
use crate::config::devices::ACTIVITY_FEED_CAPACITY;


#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub fan: bool,
    pub pump: bool,
    pub light: bool,
}


/// Notificación discreta de un actuador, ej. `{"title": "Fan", "detail": "Activated"}`.
#[derive(Default, Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ActivityEvent {
    pub title: String,
    pub detail: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}


/// Estado parcial enviado por el simulador. Campos ausentes no se tocan.
#[derive(Default, Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SystemStateSnapshot {
    #[serde(default)]
    pub fan: Option<bool>,
    #[serde(default)]
    pub pump: Option<bool>,
    #[serde(default)]
    pub light_on: Option<bool>,
    #[serde(default)]
    pub feed_alert: Option<bool>,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Actuator {
    Fan,
    Pump,
    Light,
}


fn parse_activity(event: &ActivityEvent) -> Option<(Actuator, bool)> {
    let actuator = match event.title.to_ascii_lowercase().as_str() {
        "fan" => Actuator::Fan,
        "pump" => Actuator::Pump,
        "light" => Actuator::Light,
        _ => return None,
    };
    let on = match event.detail.to_ascii_lowercase().as_str() {
        "activated" => true,
        "deactivated" => false,
        _ => return None,
    };
    Some((actuator, on))
}


#[derive(Debug, Clone)]
pub struct DeviceStateStore {
    state: DeviceState,
    feed_alert: bool,
    activity: VecDeque<ActivityEvent>,
}


impl DeviceStateStore {

    pub fn new() -> Self {
        Self {
            state: DeviceState::default(),
            feed_alert: false,
            activity: VecDeque::with_capacity(ACTIVITY_FEED_CAPACITY),
        }
    }

    /// Aplica un evento de actividad.
    ///
    /// Título y detalle se comparan sin distinguir mayúsculas. Combinaciones
    /// desconocidas no modifican el estado pero sí quedan en el feed.
    ///
    /// # Retorno
    /// * `true`: el evento correspondía a un actuador conocido.
    /// * `false`: el evento fue ignorado para el estado.
    pub fn apply_activity_event(&mut self, mut event: ActivityEvent) -> bool {
        let parsed = parse_activity(&event);

        if let Some((actuator, on)) = parsed {
            match actuator {
                Actuator::Fan => self.state.fan = on,
                Actuator::Pump => self.state.pump = on,
                Actuator::Light => self.state.light = on,
            }
        }

        if event.time.is_none() {
            event.time = Some(Local::now().format("%H:%M:%S").to_string());
        }
        if self.activity.len() == ACTIVITY_FEED_CAPACITY {
            self.activity.pop_front();
        }
        self.activity.push_back(event);

        parsed.is_some()
    }

    /// Sobrescribe únicamente los campos presentes en el snapshot.
    pub fn apply_system_state(&mut self, snapshot: SystemStateSnapshot) {
        if let Some(fan) = snapshot.fan {
            self.state.fan = fan;
        }
        if let Some(pump) = snapshot.pump {
            self.state.pump = pump;
        }
        if let Some(light) = snapshot.light_on {
            self.state.light = light;
        }
        if let Some(feed_alert) = snapshot.feed_alert {
            self.feed_alert = feed_alert;
        }
    }

    pub fn current(&self) -> DeviceState {
        self.state
    }

    pub fn feed_alert(&self) -> bool {
        self.feed_alert
    }

    /// Eventos recientes, más antiguo primero.
    pub fn activity(&self) -> &VecDeque<ActivityEvent> {
        &self.activity
    }
}


impl Default for DeviceStateStore {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn event(title: &str, detail: &str) -> ActivityEvent {
        ActivityEvent {
            title: title.to_string(),
            detail: detail.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn activity_matching_ignores_case() {
        let mut store = DeviceStateStore::new();
        assert!(store.apply_activity_event(event("Fan", "Activated")));
        assert!(store.current().fan);

        assert!(store.apply_activity_event(event("PUMP", "activated")));
        assert!(store.apply_activity_event(event("light", "ACTIVATED")));
        assert_eq!(store.current(), DeviceState { fan: true, pump: true, light: true });

        assert!(store.apply_activity_event(event("fAn", "Deactivated")));
        assert_eq!(store.current(), DeviceState { fan: false, pump: true, light: true });
    }

    #[test]
    fn unknown_activity_is_a_no_op() {
        let mut store = DeviceStateStore::new();
        store.apply_system_state(SystemStateSnapshot { pump: Some(true), ..Default::default() });
        let before = store.current();

        assert!(!store.apply_activity_event(event("oven", "activated")));
        assert!(!store.apply_activity_event(event("Fan", "exploded")));
        assert!(!store.apply_activity_event(event("Feed", "Low Feed Alert")));
        assert!(!store.apply_activity_event(event(" fan ", "activated")));
        assert!(!store.apply_activity_event(event("Fan", "Activated ")));

        assert_eq!(store.current(), before);
    }

    #[test]
    fn system_state_is_a_partial_update() {
        let mut store = DeviceStateStore::new();
        store.apply_system_state(SystemStateSnapshot { fan: Some(true), ..Default::default() });
        store.apply_system_state(SystemStateSnapshot { pump: Some(false), ..Default::default() });
        assert_eq!(store.current(), DeviceState { fan: true, pump: false, light: false });

        store.apply_system_state(SystemStateSnapshot { light_on: Some(true), ..Default::default() });
        assert_eq!(store.current(), DeviceState { fan: true, pump: false, light: true });
    }

    #[test]
    fn last_write_wins_across_both_paths() {
        let mut store = DeviceStateStore::new();
        store.apply_activity_event(event("fan", "activated"));
        store.apply_system_state(SystemStateSnapshot { fan: Some(false), ..Default::default() });
        assert!(!store.current().fan);

        store.apply_system_state(SystemStateSnapshot { fan: Some(false), ..Default::default() });
        store.apply_activity_event(event("fan", "activated"));
        assert!(store.current().fan);
    }

    #[test]
    fn feed_alert_follows_partial_semantics() {
        let mut store = DeviceStateStore::new();
        store.apply_system_state(SystemStateSnapshot { feed_alert: Some(true), ..Default::default() });
        store.apply_system_state(SystemStateSnapshot { fan: Some(true), ..Default::default() });
        assert!(store.feed_alert());
    }

    #[test]
    fn activity_feed_is_bounded_and_keeps_unknown_events() {
        let mut store = DeviceStateStore::new();
        store.apply_activity_event(event("Feed", "Low Feed Alert"));
        for i in 0..ACTIVITY_FEED_CAPACITY {
            store.apply_activity_event(event("Pump", if i % 2 == 0 { "Activated" } else { "Deactivated" }));
        }
        assert_eq!(store.activity().len(), ACTIVITY_FEED_CAPACITY);
        assert!(store.activity().iter().all(|e| e.title == "Pump"));
        assert!(store.activity().iter().all(|e| e.time.is_some()));
    }

    #[test]
    fn snapshot_decodes_with_missing_fields() {
        let snapshot: SystemStateSnapshot = serde_json::from_str(r#"{"fan": true, "light_on": false}"#).unwrap();
        assert_eq!(snapshot.fan, Some(true));
        assert_eq!(snapshot.pump, None);
        assert_eq!(snapshot.light_on, Some(false));
    }
}
