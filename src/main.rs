use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use roomchat_server::{configure_routes, AppError, AppState, Settings};
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn cors_for(config: &Settings) -> Cors {
    if !config.cors.enabled {
        return Cors::default();
    }

    let cors = if config.cors.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        Cors::default()
            .allowed_origin(&format!("http://localhost:{}", config.server.port))
            .allowed_origin(&format!("http://127.0.0.1:{}", config.server.port))
            .allowed_methods(vec!["GET"])
    };

    cors.max_age(config.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> roomchat_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new()?;
    info!("Configuration loaded ({} environment)", config.environment);

    let state = web::Data::new(AppState::new(config.clone())?);
    let workers = config.server.workers as usize;

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Server is on port {}", config.server.port);
    info!(
        "Chat relay ready at ws://{}:{}/ws",
        config.server.host, config.server.port
    );

    let app_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors_for(&app_config))
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
