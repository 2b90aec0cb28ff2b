// src/api/state.rs
use crate::client::HttpNeuronClient;
use crate::config::AppConfig;
use crate::controller::SandboxController;
use std::sync::Arc;

/// The controller as wired into the server.
pub type Sandbox = SandboxController<HttpNeuronClient>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sandbox: Arc<Sandbox>,
}

impl AppState {
    pub fn new(config: AppConfig, sandbox: Sandbox) -> Self {
        Self {
            config: Arc::new(config),
            sandbox: Arc::new(sandbox),
        }
    }
}
