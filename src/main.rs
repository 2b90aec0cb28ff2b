use actix_web::{web, App, HttpServer, middleware};
use actix_cors::Cors;
use neuron_sandbox::api::{configure_routes, handlers::static_file_handler, AppState};
use neuron_sandbox::banner;
use neuron_sandbox::client::HttpNeuronClient;
use neuron_sandbox::config::AppConfig;
use neuron_sandbox::controller::SandboxController;
use neuron_sandbox::store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    banner::print_banner();

    if let Err(e) = dotenvy::dotenv() {
        eprintln!("ℹ️  No .env file loaded: {}", e);
    }

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = AppConfig::from_env().map_err(to_io)?;
    let public_url = app_config.public_url().map_err(to_io)?;

    let store = store::open(&app_config.storage).await.map_err(to_io)?;
    let client = HttpNeuronClient::from_config(app_config.neuron.clone()).map_err(to_io)?;
    let sandbox = SandboxController::new(store, client, public_url.clone());
    sandbox.load_session(None).await.map_err(to_io)?;

    log::info!("🔗 Execution host: {}", app_config.neuron.api_base);
    log::info!("🚀 Sandbox available at {}", public_url);

    let bind = (app_config.host.clone(), app_config.port);
    let state = AppState::new(app_config, sandbox);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
            .route("/{_:.*}", web::get().to(static_file_handler))
    })
    .bind(bind)?
    .run()
    .await
}

fn to_io(e: neuron_sandbox::errors::SandboxError) -> std::io::Error {
    log::error!("Startup failed: {}", e);
    std::io::Error::other(e.to_string())
}
