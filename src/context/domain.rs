//! Definición del Contexto de Aplicación (Shared State).
//!
//! El `AppContext` actúa como un contenedor de "Inyección de Dependencias" manual,
//! agrupando los recursos que deben ser accesibles por múltiples tareas concurrentes
//! (Configuración, cliente HTTP, stores del tablero).


use std::sync::Arc;
use reqwest::Client;
use crate::state::domain::FarmState;
use crate::system::domain::{FarmError, System};


#[derive(Clone, Debug)]
pub struct AppContext {
    pub system: Arc<System>,
    pub state: FarmState,
    pub http: Client,
}


impl AppContext {
    pub fn new(system: System) -> Result<Self, FarmError> {
        let http = Client::builder()
            .gzip(true)
            .build()?;
        Ok(Self {
            system: Arc::new(system),
            state: FarmState::new(),
            http,
        })
    }
}
