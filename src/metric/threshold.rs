//! Evaluación de umbrales de alerta por métrica.
//!
//! Función pura sobre una tabla estática. No hay histéresis ni memoria del
//! estado de alerta anterior: cada lectura se evalúa desde cero.


use super::domain::Reading;


/// Las cinco métricas escalares del tablero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Humidity,
    TankLevel,
    Feed,
    Light,
}


impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::TankLevel,
        Metric::Feed,
        Metric::Light,
    ];

    /// Nombre usado en el JSON del backend.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::TankLevel => "tankLevel",
            Metric::Feed => "feed",
            Metric::Light => "light",
        }
    }

    pub fn from_name(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn value_in(&self, reading: &Reading) -> f64 {
        match self {
            Metric::Temperature => reading.temperature,
            Metric::Humidity => reading.humidity,
            Metric::TankLevel => reading.tank_level,
            Metric::Feed => reading.feed,
            Metric::Light => reading.light,
        }
    }
}


/// Rango seguro de una métrica. Un límite ausente no se verifica.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
}


impl ThresholdRule {
    pub fn violated_by(&self, value: f64) -> bool {
        self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max)
    }
}


pub fn rule_for(metric: Metric) -> ThresholdRule {
    match metric {
        Metric::Temperature => ThresholdRule { min: Some(18.0), max: Some(30.0) },
        Metric::Humidity => ThresholdRule { min: Some(40.0), max: Some(70.0) },
        Metric::TankLevel => ThresholdRule { min: Some(30.0), max: None },
        Metric::Feed => ThresholdRule { min: Some(30.0), max: None },
        Metric::Light => ThresholdRule { min: Some(300.0), max: None },
    }
}


/// `true` si el valor está fuera del rango configurado para la métrica.
///
/// Los límites son estrictos: un valor igual a `min` o `max` no es alerta.
/// Nombres desconocidos devuelven `false`.
pub fn is_alert(metric_name: &str, value: f64) -> bool {
    Metric::from_name(metric_name)
        .map(|metric| rule_for(metric).violated_by(value))
        .unwrap_or(false)
}
