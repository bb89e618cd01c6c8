//! Modelos del panel de chat del asistente.


use chrono::Utc;
use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssistantRequest {
    pub question: String,
}


#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssistantResponse {
    pub answer: String,
    pub timestamp: String,
}


/// Cuerpo de error que devuelve `/api/assistant` (`400`/`500`).
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantErrorBody {
    pub error: String,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    /// Mensaje sustituto cuando la consulta falla.
    Error,
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: String,
}


impl ChatMessage {
    pub fn now(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
