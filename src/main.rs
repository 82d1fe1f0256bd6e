use std::env;

use anyhow::Result;
use comisiones::http;
use comisiones::mapping::MappingStore;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    info!("Starting commissions service");

    let store = MappingStore::from_env();
    info!(mapping_file = %store.path().display(), "mapping store ready");

    let routes = http::routes(store);

    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .unwrap_or(8000);

    info!("Server starting on port {}", port);
    info!("Health check: http://localhost:{}/api/health", port);

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;

    Ok(())
}
