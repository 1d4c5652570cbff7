use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atrium::application::config::CONFIG;
use atrium::application::database;
use atrium::application::state::AppState;
use atrium::endpoints::create_router;
use atrium::services::bootstrap;

fn cors_layer() -> CorsLayer {
    let origins = &CONFIG.server.allowed_origins;
    let origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()))
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&CONFIG.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = %CONFIG.version, "starting atrium");

    let db = database::connect().await?;
    bootstrap::run(&db).await?;

    let state = AppState::new(db);
    let app = create_router(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
