use atrium_crm_api::database::DatabaseManager;
use atrium_crm_api::state::AppState;
use atrium_crm_api::{app, config};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Atrium CRM API in {:?} mode", config.environment);

    let pool = match DatabaseManager::connect().await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("database connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let app = app(AppState::new(pool));

    // Allow tests or deployments to override port via env
    let port = std::env::var("ATRIUM_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.api.port);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
