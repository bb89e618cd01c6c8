//! Modelo de presentación del tablero.


use crate::device::domain::{ActivityEvent, DeviceState};
use crate::metric::domain::HistoryPoint;
use crate::metric::threshold::Metric;


/// Tarjeta de una métrica escalar.
#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub metric: Metric,
    pub label: &'static str,
    pub unit: &'static str,
    /// `None` antes del primer poll exitoso.
    pub value: Option<f64>,
    pub alert: bool,
}


#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub cards: Vec<StatCard>,
    pub temperature_series: Vec<HistoryPoint>,
    pub alerts: Vec<Metric>,
    pub devices: DeviceState,
    pub feed_alert: bool,
    pub activity: Vec<ActivityEvent>,
}


impl DashboardView {
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty() || self.feed_alert
    }

    pub fn card(&self, metric: Metric) -> Option<&StatCard> {
        self.cards.iter().find(|card| card.metric == metric)
    }
}


pub fn label(metric: Metric) -> &'static str {
    match metric {
        Metric::Temperature => "Temperatura",
        Metric::Humidity => "Humedad",
        Metric::TankLevel => "Nivel del tanque",
        Metric::Feed => "Alimento",
        Metric::Light => "Luz",
    }
}


pub fn unit(metric: Metric) -> &'static str {
    match metric {
        Metric::Temperature => "°C",
        Metric::Humidity | Metric::TankLevel => "%",
        Metric::Feed => "kg",
        Metric::Light => "lux",
    }
}
