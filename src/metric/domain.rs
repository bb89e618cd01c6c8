//! Lecturas escalares de sensores y su historial acotado.
//!
//! `MetricStore` guarda la última lectura completa recibida por el polling y
//! una ventana deslizante (FIFO) con la temperatura reciente para graficar tendencias.


use std::collections::VecDeque;
use chrono::{Local, NaiveTime};
use serde::Deserialize;
use crate::config::metrics::{HISTORY_CAPACITY, HISTORY_TIME_FORMAT};


/// Snapshot escalar de todos los sensores.
///
/// Los nombres de campo coinciden con el JSON de `/api/sensor-data`.
#[derive(Default, Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// %
    pub tank_level: f64,
    /// kg
    pub feed: f64,
    /// lux
    pub light: f64,
}


/// Punto de la serie de temperatura (`HH:MM`).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub time: String,
    pub temp: f64,
}


#[derive(Debug, Clone)]
pub struct MetricStore {
    current: Option<Reading>,
    history: VecDeque<HistoryPoint>,
}


impl MetricStore {

    pub fn new() -> Self {
        Self {
            current: None,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Reemplaza la lectura actual y agrega un punto al historial con la hora local.
    ///
    /// No valida la lectura: valores `NaN` se almacenan tal cual.
    pub fn update(&mut self, reading: Reading) {
        self.update_at(reading, Local::now().time());
    }

    /// Igual que [`update`](Self::update) pero con una hora explícita.
    pub fn update_at(&mut self, reading: Reading, time: NaiveTime) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(HistoryPoint {
            time: time.format(HISTORY_TIME_FORMAT).to_string(),
            temp: reading.temperature,
        });
        self.current = Some(reading);
    }

    /// Última lectura recibida, `None` antes del primer poll exitoso.
    pub fn current(&self) -> Option<Reading> {
        self.current
    }

    /// Historial en orden cronológico (más antiguo primero).
    pub fn history(&self) -> &VecDeque<HistoryPoint> {
        &self.history
    }
}


impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}
