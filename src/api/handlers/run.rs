// src/api/handlers/run.rs
use actix_web::{web, HttpResponse, Result};
use serde_json::json;
use crate::api::AppState;
use crate::controller::{FormUpdate, RunOutcome};

/// POST /api/v1/run - Run the current neuron once
///
/// Fields in the body are bound only if the run is accepted.
pub async fn run_neuron(
    state: web::Data<AppState>,
    req: Option<web::Json<FormUpdate>>,
) -> Result<HttpResponse> {
    let update = req.map(|r| r.into_inner()).unwrap_or_default();
    let sandbox = state.sandbox.clone();

    // Detached so the run still settles if the caller disconnects mid-flight.
    let handle = actix_web::rt::spawn(async move { sandbox.run_with(&update).await });

    match handle.await {
        Ok(RunOutcome::Settled(view)) => Ok(HttpResponse::Ok().json(view)),
        Ok(RunOutcome::AlreadyRunning(view)) => Ok(HttpResponse::Conflict().json(view)),
        Err(e) => {
            log::error!("Run task failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Run task failed"
            })))
        }
    }
}
