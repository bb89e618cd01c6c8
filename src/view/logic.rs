//! Composición del modelo de vista y tick de render.
//!
//! La vista se deriva desde cero en cada render a partir de un `DashboardSnapshot`;
//! las alertas se reevalúan siempre (sin memoria de alertas anteriores).


use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, instrument, warn};
use crate::config::render::TICK;
use crate::metric::threshold::{is_alert, Metric};
use crate::state::domain::{DashboardSnapshot, FarmState};
use super::domain::{label, unit, DashboardView, StatCard};


pub fn compose(snapshot: &DashboardSnapshot) -> DashboardView {
    let cards: Vec<StatCard> = Metric::ALL
        .into_iter()
        .map(|metric| {
            let value = snapshot.reading.as_ref().map(|r| metric.value_in(r));
            StatCard {
                metric,
                label: label(metric),
                unit: unit(metric),
                value,
                alert: value.is_some_and(|v| is_alert(metric.name(), v)),
            }
        })
        .collect();

    let alerts = cards
        .iter()
        .filter(|card| card.alert)
        .map(|card| card.metric)
        .collect();

    DashboardView {
        cards,
        temperature_series: snapshot.history.clone(),
        alerts,
        devices: snapshot.devices,
        feed_alert: snapshot.feed_alert,
        activity: snapshot.activity.clone(),
    }
}


/// Tick de render: compone la vista y la publica a los lectores.
///
/// Termina cuando `shutdown` cambia o se cierra.
#[instrument(name = "render_task", skip_all)]
pub async fn render_task(state: FarmState,
                         view_tx: watch::Sender<DashboardView>,
                         mut shutdown: watch::Receiver<bool>) {

    info!("Info: render task creada");
    let mut ticker = interval(TICK);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let view = compose(&state.snapshot());
                if view.has_alerts() {
                    warn!("Warning: métricas fuera de rango {:?} (alimento bajo: {})", view.alerts, view.feed_alert);
                }
                debug!("Debug: render temperatura {:?} dispositivos {:?}",
                       view.card(Metric::Temperature).and_then(|c| c.value), view.devices);
                view_tx.send_replace(view);
            }
            _ = shutdown.changed() => {
                break;
            }
        }
    }

    info!("Info: render task finalizada");
}


pub fn start_render(state: FarmState,
                    view_tx: watch::Sender<DashboardView>,
                    shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {

    tokio::spawn(async move {
        render_task(state, view_tx, shutdown).await;
    })
}
