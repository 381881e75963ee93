use std::{net::SocketAddr, str::FromStr, error::Error};

use axum::http::{HeaderValue, Method, header};
use dotenvy::dotenv;
use log::info;
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::{TraceLayer, self}};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use notekeeper::{
    app::{build_router, AppServices},
    settings::ServerSettings,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    // Setup tracing_subscriber
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = ServerSettings::from_env()?;

    // Setup state
    let options = SqliteConnectOptions::from_str(&settings.database_url)?.create_if_missing(true);
    let db = SqlitePool::connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let services = AppServices::new(db, settings.tokens.clone());

    let cors = CorsLayer::new()
        .allow_origin(settings.cors_origin.parse::<HeaderValue>()?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = build_router(&services)
        // Static files
        .fallback_service(ServeDir::new("public"))
        // Logging
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO))
        )
        // CORS
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    info!("Listening on {addr}");

    axum::Server::bind(&addr)
        .serve(app.into_make_service()).await?;

    Ok(())
}
