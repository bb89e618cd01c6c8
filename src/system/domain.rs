//! Módulo de configuración central y gestión del entorno de ejecución.
//!
//! Este módulo actúa como la fuente única de verdad para la configuración del cliente.
//! Se encarga de leer las variables de entorno, establecer valores por defecto seguros
//! y proveer las estructuras necesarias para iniciar los subsistemas (Polling, Push, Asistente).
//!
//! # Funcionalidades Principales
//! * **Carga de Configuración:** Lee de `.env` en desarrollo y variables de sistema en producción.
//! * **Observabilidad:** Configura `tracing_subscriber` para logs estructurados o legibles.
//! * **Errores:** Define la taxonomía de errores operativos (`FarmError`).
//!


use std::env;
use std::fmt;
use std::str::FromStr;
use reqwest::Url;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};


/// Backend que responde las preguntas del panel de chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantMode {
    /// Llamada de red al endpoint `/api/assistant` del backend.
    Live,
    /// Generador local de respuestas sintéticas.
    Mock,
}


impl FromStr for AssistantMode {
    type Err = FarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(AssistantMode::Live),
            "mock" => Ok(AssistantMode::Mock),
            other => Err(FarmError::Config(format!("ASSISTANT_MODE inválido: {other}"))),
        }
    }
}


impl fmt::Display for AssistantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantMode::Live => write!(f, "live"),
            AssistantMode::Mock => write!(f, "mock"),
        }
    }
}


/// Representa la configuración global del cliente y el estado del entorno.
///
/// Solo `api_url` y `assistant_mode` son parámetros de negocio ajustables;
/// `environment` y `rust_log` controlan únicamente la observabilidad.
#[derive(Debug, Clone)]
pub struct System {
    /// URL base del backend de la granja (sensores, push y asistente).
    /// Por defecto: `http://127.0.0.1:5000`.
    pub api_url: Url,

    /// Backend del asistente.
    /// Por defecto: `mock`.
    pub assistant_mode: AssistantMode,

    /// Entorno de ejecución actual (`development`, `staging`, `production`).
    /// Afecta el formato de logs y la carga de archivos `.env`.
    pub environment: String,

    /// Nivel de detalle de los logs (ej. `info`, `debug`, `warn`).
    /// Se autoconfigura según el `environment` si no se especifica.
    pub rust_log: String,
}


impl System {

    /// Carga la configuración desde las variables de entorno.
    ///
    /// # Comportamiento
    /// * Si `ENVIRONMENT` es "development", intenta cargar un archivo `.env`.
    /// * Establece valores por defecto para variables opcionales.
    ///
    /// # Errores
    /// * `FarmError::Config` si `FARM_API_URL` no es una URL http(s) válida.
    /// * `FarmError::Config` si `ASSISTANT_MODE` no es `live` ni `mock`.
    pub fn new() -> Result<Self, FarmError> {

        info!("Info: creando objeto system");

        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".into());

        if environment == "development" {
            dotenv::dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FarmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .unwrap_or_else(|| "development".into());

        let raw_url = lookup("FARM_API_URL")
            .unwrap_or_else(|| "http://127.0.0.1:5000".to_string());

        let api_url = Url::parse(raw_url.trim_end_matches('/'))
            .map_err(|e| FarmError::Config(format!("FARM_API_URL inválida ({raw_url}): {e}")))?;

        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(FarmError::Config(format!("FARM_API_URL debe ser http o https: {raw_url}")));
        }

        let assistant_mode = lookup("ASSISTANT_MODE")
            .unwrap_or_else(|| "mock".to_string())
            .parse::<AssistantMode>()?;

        let rust_log = lookup("RUST_LOG")
            .unwrap_or_else(|| {
                match environment.as_str() {
                    "development" => "debug".to_string(),
                    "staging" => "info".to_string(),
                    _ => "warn".to_string(),
                }
            });

        Ok(System {
            api_url,
            assistant_mode,
            environment,
            rust_log,
        })
    }

    /// Construye la URL de un endpoint HTTP del backend.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.as_str().trim_end_matches('/'), path)
    }

    /// URL del canal push (WebSocket) derivada de la URL base.
    pub fn push_url(&self) -> String {
        let mut url = self.api_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http y ws son esquemas especiales, el cambio siempre es aceptado.
        let _ = url.set_scheme(scheme);
        format!("{}/ws", url.as_str().trim_end_matches('/'))
    }
}


/// Categorización de errores operativos del cliente.
#[derive(Debug, Error)]
pub enum FarmError {
    #[error("configuración inválida: {0}")]
    Config(String),

    #[error("error HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("respuesta no exitosa del servidor: {0}")]
    Status(u16),

    #[error("mensaje mal formado: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("error WebSocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("{0}")]
    Assistant(String),
}


/// Inicializa el sistema de trazabilidad y logs (Tracing).
///
/// Configura el formato de salida basándose en el entorno:
/// * **Production**: Salida JSON (para logs estructurados en la nube).
/// * **Development/Otros**: Salida "Pretty" (colores y formato legible).
pub fn init_tracing(system: &System) {

    let filter = EnvFilter::try_new(&system.rust_log)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_fmt().with_env_filter(filter).with_target(false);

    if system.environment == "production" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn system_from(pairs: &[(&str, &str)]) -> Result<System, FarmError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        System::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let system = system_from(&[]).unwrap();
        assert_eq!(system.api_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(system.assistant_mode, AssistantMode::Mock);
        assert_eq!(system.environment, "development");
        assert_eq!(system.rust_log, "debug");
    }

    #[test]
    fn log_level_follows_environment() {
        let staging = system_from(&[("ENVIRONMENT", "staging")]).unwrap();
        assert_eq!(staging.rust_log, "info");

        let production = system_from(&[("ENVIRONMENT", "production")]).unwrap();
        assert_eq!(production.rust_log, "warn");

        let explicit = system_from(&[("ENVIRONMENT", "production"), ("RUST_LOG", "trace")]).unwrap();
        assert_eq!(explicit.rust_log, "trace");
    }

    #[test]
    fn assistant_mode_is_case_insensitive() {
        let system = system_from(&[("ASSISTANT_MODE", "LIVE")]).unwrap();
        assert_eq!(system.assistant_mode, AssistantMode::Live);
    }

    #[test]
    fn invalid_settings_are_config_errors() {
        assert!(matches!(
            system_from(&[("ASSISTANT_MODE", "gemini")]),
            Err(FarmError::Config(_))
        ));
        assert!(matches!(
            system_from(&[("FARM_API_URL", "not a url")]),
            Err(FarmError::Config(_))
        ));
        assert!(matches!(
            system_from(&[("FARM_API_URL", "ftp://farm.local")]),
            Err(FarmError::Config(_))
        ));
    }

    #[test]
    fn endpoints_are_built_from_the_base_url() {
        let system = system_from(&[("FARM_API_URL", "http://farm.local:5000/")]).unwrap();
        assert_eq!(system.endpoint("/api/sensor-data"), "http://farm.local:5000/api/sensor-data");
        assert_eq!(system.push_url(), "ws://farm.local:5000/ws");

        let secure = system_from(&[("FARM_API_URL", "https://farm.example.com")]).unwrap();
        assert_eq!(secure.push_url(), "wss://farm.example.com/ws");
    }
}
