//! Lógica del polling de sensores.
//!
//! Este módulo implementa un **Polling de disparar y olvidar**: cada tick del
//! temporizador lanza una petición independiente contra `/api/sensor-data`.
//!
//! # Política de fallos
//! Un poll fallido solo deja un `warn!` en el log; el siguiente tick se ejecuta
//! igual. No hay backoff exponencial ni tope de fallos.


use std::future::Future;
use std::sync::{Arc, Mutex};
use reqwest::Client;
use tokio::time::{interval, Duration};
use tracing::{debug, info, instrument, warn};
use crate::config::polling::{INTERVAL, REQUEST_TIMEOUT, SENSOR_PATH};
use crate::context::domain::AppContext;
use crate::metric::domain::Reading;
use crate::state::domain::lock;
use crate::system::domain::FarmError;
use super::domain::PollLoop;


/// Consulta la lectura actual de sensores.
///
/// # Errores
/// * `FarmError::Http`: error de red o timeout.
/// * `FarmError::Status`: el servidor respondió con un código no exitoso.
/// * `FarmError::Decode`: el cuerpo no es un `Reading` válido.
pub async fn fetch_reading(client: &Client, url: &str) -> Result<Reading, FarmError> {
    let response = client
        .get(url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FarmError::Status(status.as_u16()));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}


/// Ejecuta el temporizador del polling.
///
/// La petición de cada tick se crea aquí, en orden de tick, y se resuelve en su
/// propia tarea para no bloquear los ticks siguientes.
#[instrument(name = "run_poll_task", skip_all)]
pub async fn run_poll<F, Fut, R>(period: Duration,
                                 fetch: F,
                                 on_result: Arc<R>,
                                 alive: Arc<Mutex<bool>>)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Reading, FarmError>> + Send + 'static,
    R: Fn(Reading) + Send + Sync + 'static,
{
    info!("Info: polling task creada");

    let mut ticker = interval(period);

    loop {
        ticker.tick().await;

        if !*lock(&alive) {
            break;
        }

        debug!("Debug: tick de polling");
        let request = fetch();
        let on_result = on_result.clone();
        let alive = alive.clone();

        tokio::spawn(async move {
            let result = request.await;
            apply_poll_result(result, &alive, on_result.as_ref());
        });
    }

    info!("Info: polling task finalizada");
}


fn apply_poll_result<R>(result: Result<Reading, FarmError>,
                        alive: &Mutex<bool>,
                        on_result: &R)
where
    R: Fn(Reading),
{
    match result {
        Ok(reading) => {
            let guard = lock(alive);
            if *guard {
                on_result(reading);
            } else {
                debug!("Debug: lectura descartada, polling detenido");
            }
        }
        Err(e) => warn!("Warning: poll de sensores fallido, se reintenta en el próximo tick. {e}"),
    }
}


/// Inicia el polling de sensores conectado a `FarmState`.
pub fn start_poll(app_context: &AppContext) -> PollLoop {

    let client = app_context.http.clone();
    let url = app_context.system.endpoint(SENSOR_PATH);
    let state = app_context.state.clone();

    info!("Info: iniciando tarea de polling contra {url}");

    PollLoop::start(
        INTERVAL,
        move || {
            let client = client.clone();
            let url = url.clone();
            async move { fetch_reading(&client, &url).await }
        },
        move |reading| state.apply_reading(reading),
    )
}
