//! Dominio del canal push (eventos de dispositivos).
//!
//! El backend publica mensajes con nombre sobre WebSocket, uno por frame de texto:
//!
//! ```json
//! {"event": "activity_event", "data": {"title": "Fan", "detail": "Activated"}}
//! {"event": "system_state", "data": {"fan": true, "light_on": false}}
//! ```


use std::sync::{Arc, Mutex};
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use crate::device::domain::{ActivityEvent, SystemStateSnapshot};
use crate::state::domain::lock;


/// Mensajes con nombre que entrega el canal push.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    ActivityEvent(ActivityEvent),
    SystemState(SystemStateSnapshot),
}


/// Decodifica un frame de texto.
///
/// Eventos desconocidos o JSON inválido se ignoran (compatibilidad hacia adelante).
pub fn decode_frame(text: &str) -> Option<PushMessage> {
    match serde_json::from_str::<PushMessage>(text) {
        Ok(msg) => Some(msg),
        Err(e) => {
            debug!("Debug: frame push ignorado ({e}): {text}");
            None
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Connected,
    Disconnected,
}


/// Handle de una suscripción push activa.
pub struct EventChannelHandle {
    pub(super) alive: Arc<Mutex<bool>>,
    pub(super) status: Arc<watch::Sender<ChannelStatus>>,
    pub(super) task: Option<JoinHandle<()>>,
}


impl EventChannelHandle {

    /// Cierra la suscripción.
    ///
    /// Puede llamarse varias veces y desde cualquier estado (conectando, conectado,
    /// ya desconectado). Al retornar, ningún mensaje posterior modifica el estado.
    pub fn disconnect(&mut self) {
        *lock(&self.alive) = false;
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Info: canal push desconectado");
        }
        self.status.send_replace(ChannelStatus::Disconnected);
    }

    pub fn status(&self) -> ChannelStatus {
        *self.status.borrow()
    }

    /// `true` cuando la tarea de conexión terminó (desconexión o reintentos agotados).
    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }
}


impl Drop for EventChannelHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}
