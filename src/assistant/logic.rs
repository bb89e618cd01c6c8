//! Backends del asistente y panel de chat.
//!
//! Dos backends intercambiables, elegidos por `AssistantMode` al construir:
//! * `Live`: `POST /api/assistant` contra el backend de la granja.
//! * `Mock`: generador local que responde con el estado actual del tablero.
//!
//! Un fallo de consulta se muestra en el chat como mensaje sustituto con el texto
//! del error y no afecta a las consultas siguientes.


use chrono::Utc;
use reqwest::Client;
use tracing::{info, warn};
use crate::config::assistant::{PATH, RECENT_ACTIVITY, REQUEST_TIMEOUT};
use crate::context::domain::AppContext;
use crate::metric::threshold::{is_alert, Metric};
use crate::state::domain::{DashboardSnapshot, FarmState};
use crate::system::domain::{AssistantMode, FarmError};
use crate::view::domain::{label, unit};
use super::domain::{AssistantErrorBody, AssistantRequest, AssistantResponse, ChatMessage, ChatRole};


#[derive(Debug, Clone)]
pub struct LiveAssistant {
    client: Client,
    url: String,
}


impl LiveAssistant {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    /// # Errores
    /// * `FarmError::Assistant`: el backend respondió con `{"error": ...}`.
    /// * `FarmError::Status`: respuesta no exitosa sin cuerpo de error.
    /// * `FarmError::Http` / `FarmError::Decode`: red o JSON inválido.
    pub async fn ask(&self, question: &str) -> Result<AssistantResponse, FarmError> {
        let request = AssistantRequest {
            question: question.to_string(),
        };

        let response = self.client
            .post(&self.url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return match serde_json::from_slice::<AssistantErrorBody>(&body) {
                Ok(err) => Err(FarmError::Assistant(err.error)),
                Err(_) => Err(FarmError::Status(status.as_u16())),
            };
        }

        Ok(serde_json::from_slice(&body)?)
    }
}


/// Generador local de respuestas sintéticas.
///
/// Instancia propia del llamador: responde con el snapshot del `FarmState` que recibe.
#[derive(Debug, Clone)]
pub struct MockAssistant {
    state: FarmState,
}


impl MockAssistant {
    pub fn new(state: FarmState) -> Self {
        Self { state }
    }

    pub fn ask(&self, question: &str) -> AssistantResponse {
        AssistantResponse {
            answer: synthesize_answer(question, &self.state.snapshot()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}


fn describe(metric: Metric, value: f64) -> String {
    let status = if is_alert(metric.name(), value) { "fuera de rango" } else { "normal" };
    format!("{}: {:.1} {} ({})", label(metric), value, unit(metric), status)
}


fn topic_of(question: &str) -> Option<Metric> {
    let q = question.to_lowercase();
    let topics: [(Metric, &[&str]); 5] = [
        (Metric::Temperature, &["temp", "calor", "frío", "fan", "ventil"]),
        (Metric::Humidity, &["humed", "humid"]),
        (Metric::TankLevel, &["agua", "tanque", "tank", "water", "bomba", "pump"]),
        (Metric::Feed, &["aliment", "comida", "feed"]),
        (Metric::Light, &["luz", "light", "lux", "ilumin"]),
    ];
    topics
        .iter()
        .find(|(_, keys)| keys.iter().any(|k| q.contains(k)))
        .map(|(metric, _)| *metric)
}


/// Arma la respuesta con las lecturas actuales, alertas y actividad reciente.
pub fn synthesize_answer(question: &str, snapshot: &DashboardSnapshot) -> String {
    let Some(reading) = snapshot.reading else {
        return "Todavía no hay lecturas de sensores. Esperá al próximo ciclo de actualización.".to_string();
    };

    let mut lines = Vec::new();

    match topic_of(question) {
        Some(metric) => lines.push(describe(metric, metric.value_in(&reading))),
        None => {
            lines.push("Resumen actual de la granja:".to_string());
            for metric in Metric::ALL {
                lines.push(format!("- {}", describe(metric, metric.value_in(&reading))));
            }
        }
    }

    let alerts: Vec<&str> = Metric::ALL
        .into_iter()
        .filter(|m| is_alert(m.name(), m.value_in(&reading)))
        .map(label)
        .collect();
    if alerts.is_empty() && !snapshot.feed_alert {
        lines.push("No hay alertas activas.".to_string());
    } else {
        let mut text = format!("Alertas activas: {}", alerts.join(", "));
        if snapshot.feed_alert {
            if !alerts.is_empty() {
                text.push_str(", ");
            }
            text.push_str("alimento bajo");
        }
        lines.push(text);
    }

    let devices = snapshot.devices;
    lines.push(format!(
        "Dispositivos: ventilador {}, bomba {}, luz {}.",
        on_off(devices.fan),
        on_off(devices.pump),
        on_off(devices.light)
    ));

    let recent: Vec<String> = snapshot.activity
        .iter()
        .rev()
        .take(RECENT_ACTIVITY)
        .map(|ev| format!("{} {}", ev.title, ev.detail))
        .collect();
    if !recent.is_empty() {
        lines.push(format!("Actividad reciente: {}.", recent.join("; ")));
    }

    lines.join("\n")
}


fn on_off(on: bool) -> &'static str {
    if on { "encendido" } else { "apagado" }
}


#[derive(Debug, Clone)]
pub enum AssistantBackend {
    Live(LiveAssistant),
    Mock(MockAssistant),
}


impl AssistantBackend {

    pub fn from_context(app_context: &AppContext) -> Self {
        match app_context.system.assistant_mode {
            AssistantMode::Live => AssistantBackend::Live(LiveAssistant::new(
                app_context.http.clone(),
                app_context.system.endpoint(PATH),
            )),
            AssistantMode::Mock => AssistantBackend::Mock(MockAssistant::new(app_context.state.clone())),
        }
    }

    pub async fn ask(&self, question: &str) -> Result<AssistantResponse, FarmError> {
        match self {
            AssistantBackend::Live(live) => live.ask(question).await,
            AssistantBackend::Mock(mock) => Ok(mock.ask(question)),
        }
    }
}


/// Conversación del panel de chat.
#[derive(Debug, Clone)]
pub struct ChatPanel {
    backend: AssistantBackend,
    messages: Vec<ChatMessage>,
}


impl ChatPanel {
    pub fn new(backend: AssistantBackend) -> Self {
        Self {
            backend,
            messages: Vec::new(),
        }
    }

    /// Envía una pregunta y registra la respuesta (o el error) en la conversación.
    ///
    /// Preguntas vacías se ignoran y devuelven `None`.
    pub async fn submit(&mut self, question: &str) -> Option<&ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::now(ChatRole::User, question));

        let reply = match self.backend.ask(question).await {
            Ok(response) => {
                info!("Info: respuesta del asistente recibida");
                ChatMessage {
                    role: ChatRole::Assistant,
                    text: response.answer,
                    timestamp: response.timestamp,
                }
            }
            Err(e) => {
                warn!("Warning: consulta al asistente fallida: {e}");
                ChatMessage::now(ChatRole::Error, format!("Error: {e}"))
            }
        };

        self.messages.push(reply);
        self.messages.last()
    }

    #[cfg(test)]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::domain::{ActivityEvent, SystemStateSnapshot};
    use crate::metric::domain::Reading;
    use crate::system::domain::System;
    use crate::test_support::serve_once;

    fn farm_with_reading() -> FarmState {
        let state = FarmState::new();
        state.apply_reading(Reading {
            temperature: 31.2,
            humidity: 60.0,
            tank_level: 25.0,
            feed: 65.0,
            light: 400.0,
        });
        state
    }

    #[test]
    fn mock_answer_without_readings() {
        let answer = synthesize_answer("¿cómo está todo?", &DashboardSnapshot::default());
        assert!(answer.contains("Todavía no hay lecturas"));
    }

    #[test]
    fn mock_answer_focuses_on_the_asked_metric() {
        let state = farm_with_reading();
        let answer = MockAssistant::new(state).ask("What is the water tank level?").answer;
        assert!(answer.starts_with("Nivel del tanque: 25.0 % (fuera de rango)"));
        assert!(!answer.contains("Humedad"));
        assert!(answer.contains("Alertas activas: Temperatura, Nivel del tanque"));
    }

    #[test]
    fn mock_summary_includes_devices_feed_alert_and_activity() {
        let state = farm_with_reading();
        state.apply_system_state(SystemStateSnapshot { fan: Some(true), feed_alert: Some(true), ..Default::default() });
        state.apply_activity_event(ActivityEvent {
            title: "Fan".to_string(),
            detail: "Activated".to_string(),
            ..Default::default()
        });

        let answer = synthesize_answer("resumen", &state.snapshot());
        assert!(answer.starts_with("Resumen actual de la granja:"));
        assert!(answer.contains("- Luz: 400.0 lux (normal)"));
        assert!(answer.contains("alimento bajo"));
        assert!(answer.contains("ventilador encendido, bomba apagado, luz apagado"));
        assert!(answer.contains("Actividad reciente: Fan Activated."));
    }

    #[tokio::test]
    async fn backend_is_selected_from_configuration() {
        let mock = AppContext::new(System::from_lookup(|_| None).unwrap()).unwrap();
        assert!(matches!(AssistantBackend::from_context(&mock), AssistantBackend::Mock(_)));

        let live = AppContext::new(
            System::from_lookup(|key| (key == "ASSISTANT_MODE").then(|| "live".to_string())).unwrap(),
        )
        .unwrap();
        match AssistantBackend::from_context(&live) {
            AssistantBackend::Live(assistant) => assert_eq!(assistant.url, "http://127.0.0.1:5000/api/assistant"),
            other => panic!("backend inesperado: {other:?}"),
        }
    }

    #[tokio::test]
    async fn live_assistant_posts_the_question() {
        let (base, server) = serve_once(200, r#"{"answer":"Todo en orden","timestamp":"2025-01-01T10:00:00"}"#).await;
        let live = LiveAssistant::new(Client::new(), format!("{base}{PATH}"));

        let response = live.ask("¿Hace calor?").await.unwrap();
        assert_eq!(response.answer, "Todo en orden");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/assistant "));
        assert!(request.contains(r#"{"question":"¿Hace calor?"}"#));
    }

    #[tokio::test]
    async fn failed_query_becomes_an_error_message_and_next_query_works() {
        let (base, _server) = serve_once(500, r#"{"error":"Failed to generate response"}"#).await;
        let mut panel = ChatPanel::new(AssistantBackend::Live(LiveAssistant::new(Client::new(), format!("{base}{PATH}"))));

        let reply = panel.submit("¿Cómo están las gallinas?").await.cloned().unwrap();
        assert_eq!(reply.role, ChatRole::Error);
        assert_eq!(reply.text, "Error: Failed to generate response");

        let (base, _server) = serve_once(200, r#"{"answer":"Bien","timestamp":"2025-01-01T10:00:00"}"#).await;
        panel.backend = AssistantBackend::Live(LiveAssistant::new(Client::new(), format!("{base}{PATH}")));
        let reply = panel.submit("¿Y ahora?").await.cloned().unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.text, "Bien");

        let roles: Vec<ChatRole> = panel.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Error, ChatRole::User, ChatRole::Assistant]);
    }

    #[tokio::test]
    async fn status_without_error_body_is_reported() {
        let (base, _server) = serve_once(503, "unavailable").await;
        let live = LiveAssistant::new(Client::new(), format!("{base}{PATH}"));
        assert!(matches!(live.ask("hola").await, Err(FarmError::Status(503))));
    }

    #[tokio::test]
    async fn blank_questions_are_ignored() {
        let mut panel = ChatPanel::new(AssistantBackend::Mock(MockAssistant::new(FarmState::new())));
        assert!(panel.submit("   ").await.is_none());
        assert!(panel.messages().is_empty());

        let reply = panel.submit("temperatura?").await.cloned().unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(panel.messages().len(), 2);
    }
}
