//! Cliente del canal push.
//!
//! Máquina de estados `Init -> Work -> Error -> Init` sobre WebSocket. Los frames se
//! aplican de a uno y en orden de llegada sobre `FarmState`, sin reordenar ni agrupar.
//!
//! # Reconexión
//! Reintento acotado con backoff exponencial (`config::push`). Tras
//! `MAX_RECONNECT_ATTEMPTS` fallos consecutivos la tarea termina y el estado de los
//! dispositivos simplemente deja de actualizarse.


use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tokio_stream::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, instrument, warn};
use crate::config::push::{INITIAL_BACKOFF, MAX_BACKOFF, MAX_RECONNECT_ATTEMPTS};
use crate::state::domain::{lock, FarmState};
use crate::system::domain::FarmError;
use super::domain::{decode_frame, ChannelStatus, EventChannelHandle, PushMessage};


type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;


#[derive(Debug, Clone, Copy, PartialEq)]
enum StateClient {
    Init,
    Work,
    Error,
}


/// Aplica un mensaje push si la suscripción sigue viva.
pub fn apply_push(state: &FarmState, alive: &Mutex<bool>, msg: PushMessage) {
    let guard = lock(alive);
    if !*guard {
        debug!("Debug: mensaje push descartado, canal desconectado");
        return;
    }
    match msg {
        PushMessage::ActivityEvent(event) => {
            debug!("Debug: activity_event {} / {}", event.title, event.detail);
            state.apply_activity_event(event);
        }
        PushMessage::SystemState(snapshot) => {
            debug!("Debug: system_state {:?}", snapshot);
            state.apply_system_state(snapshot);
        }
    }
}


/// Demora antes del reintento número `attempt` (1, 2, 3...).
pub fn backoff(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    INITIAL_BACKOFF.saturating_mul(factor).min(MAX_BACKOFF)
}


/// Publica el estado del canal solo si la suscripción sigue viva.
///
/// Se publica con el flag tomado: `disconnect()` lo limpia bajo el mismo lock y
/// recién después publica `Disconnected`, que queda como último valor.
fn publish_status(alive: &Mutex<bool>, status: &watch::Sender<ChannelStatus>, next: ChannelStatus) {
    let guard = lock(alive);
    if *guard {
        status.send_replace(next);
    }
}


async fn open_session(url: &str) -> Result<WsStream, FarmError> {
    let (stream, _response) = connect_async(url).await?;
    Ok(stream)
}


#[instrument(name = "push_task", skip(state, alive, status))]
pub async fn push_task(url: String,
                       state: FarmState,
                       alive: Arc<Mutex<bool>>,
                       status: Arc<watch::Sender<ChannelStatus>>) {

    let mut client_state = StateClient::Init;
    let mut session: Option<WsStream> = None;
    let mut failures: u32 = 0;

    loop {
        match client_state {
            StateClient::Init => {
                publish_status(&alive, &status, ChannelStatus::Connecting);
                match open_session(&url).await {
                    Ok(stream) => {
                        info!("Info: canal push conectado");
                        session = Some(stream);
                        failures = 0;
                        publish_status(&alive, &status, ChannelStatus::Connected);
                        client_state = StateClient::Work;
                    }
                    Err(e) => {
                        error!("Error: no se pudo conectar el canal push: {e}");
                        client_state = StateClient::Error;
                    }
                }
            }

            StateClient::Work => {
                if let Some(stream) = session.as_mut() {
                    match stream.next().await {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(msg) = decode_frame(&text) {
                                apply_push(&state, &alive, msg);
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!("Info: el servidor cerró el canal push {:?}", frame);
                            client_state = StateClient::Error;
                        }
                        Some(Ok(_)) => {
                            // Ping/Pong los responde tungstenite; binarios no se usan.
                        }
                        Some(Err(e)) => {
                            error!("Error: canal push {e}");
                            client_state = StateClient::Error;
                        }
                        None => {
                            warn!("Warning: canal push cerrado por el servidor");
                            client_state = StateClient::Error;
                        }
                    }
                } else {
                    warn!("Warning: estado Work sin stream válido, reiniciando...");
                    client_state = StateClient::Init;
                }
            }

            StateClient::Error => {
                session = None;
                publish_status(&alive, &status, ChannelStatus::Disconnected);

                failures += 1;
                if failures >= MAX_RECONNECT_ATTEMPTS {
                    warn!("Warning: canal push abandonado tras {failures} fallos consecutivos");
                    return;
                }

                let delay = backoff(failures);
                info!("Info: reintentando canal push en {:?}", delay);
                sleep(delay).await;
                client_state = StateClient::Init;
            }
        }
    }
}


/// Establece la suscripción push y devuelve su handle.
pub fn connect(url: &str, state: FarmState) -> EventChannelHandle {

    info!("Info: iniciando canal push contra {url}");

    let alive = Arc::new(Mutex::new(true));
    let (status, _) = watch::channel(ChannelStatus::Connecting);
    let status = Arc::new(status);

    let task = tokio::spawn(push_task(
        url.to_string(),
        state,
        alive.clone(),
        status.clone(),
    ));

    EventChannelHandle {
        alive,
        status,
        task: Some(task),
    }
}
