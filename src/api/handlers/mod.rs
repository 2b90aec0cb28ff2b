// src/api/handlers/mod.rs
mod assets;
mod health;
mod run;
mod session;
pub mod ws;

use actix_web::HttpResponse;
use crate::errors::SandboxError;

pub use assets::static_file_handler;
pub use health::health_check;
pub use run::run_neuron;
pub use session::{get_session, update_session};
pub use ws::ws_handler;

fn error_response(e: &SandboxError) -> HttpResponse {
    log::error!("Request failed: {}", e);
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": e.to_string()
    }))
}
