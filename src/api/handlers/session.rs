// src/api/handlers/session.rs
use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use crate::api::AppState;
use crate::controller::FormUpdate;
use super::error_response;

#[derive(Deserialize)]
pub struct SessionQuery {
    pub neuron: Option<String>,
}

/// GET /api/v1/session - Page load; `?neuron=` overrides the stored path
pub async fn get_session(
    state: web::Data<AppState>,
    query: web::Query<SessionQuery>,
) -> Result<HttpResponse> {
    match state.sandbox.load_session(query.neuron.as_deref()).await {
        Ok(view) => Ok(HttpResponse::Ok().json(view)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// PUT /api/v1/session - Bind form field changes; absent fields are left alone
pub async fn update_session(
    state: web::Data<AppState>,
    req: web::Json<FormUpdate>,
) -> Result<HttpResponse> {
    match state.sandbox.update(&req).await {
        Ok(view) => Ok(HttpResponse::Ok().json(view)),
        Err(e) => Ok(error_response(&e)),
    }
}
