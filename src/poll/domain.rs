//! Handle del bucle de polling de sensores.


use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::info;
use crate::metric::domain::Reading;
use crate::state::domain::lock;
use crate::system::domain::FarmError;
use super::logic::run_poll;


/// Tarea periódica y cancelable que consulta el endpoint de sensores.
///
/// Cada tick lanza una petición independiente; si una petición no resolvió
/// antes del siguiente tick ambas continúan y cada una aplica su resultado al
/// resolver (gana la última en resolver, no la última enviada).
///
/// Después de `stop()` ningún resultado tardío llega a `on_result`: el callback
/// se ejecuta con el flag de vida tomado y `stop()` lo limpia bajo el mismo lock.
pub struct PollLoop {
    alive: Arc<Mutex<bool>>,
    ticker: Option<JoinHandle<()>>,
}


impl PollLoop {

    /// Inicia el bucle. El primer tick es inmediato.
    pub fn start<F, Fut, R>(interval: Duration, fetch: F, on_result: R) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Reading, FarmError>> + Send + 'static,
        R: Fn(Reading) + Send + Sync + 'static,
    {
        let alive = Arc::new(Mutex::new(true));
        let ticker = tokio::spawn(run_poll(interval, fetch, Arc::new(on_result), alive.clone()));
        Self {
            alive,
            ticker: Some(ticker),
        }
    }

    /// Cancela el temporizador y descarta cualquier petición en vuelo. Idempotente.
    pub fn stop(&mut self) {
        *lock(&self.alive) = false;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            info!("Info: polling detenido");
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        *lock(&self.alive)
    }
}


impl Drop for PollLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
