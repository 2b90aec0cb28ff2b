// src/api/routes.rs
use actix_web::web;
use super::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health_check))
            .service(
                web::resource("/session")
                    .route(web::get().to(handlers::get_session))
                    .route(web::put().to(handlers::update_session))
            )
            .route("/run", web::post().to(handlers::run_neuron))
            .route("/ws", web::get().to(handlers::ws_handler))
    );
}
