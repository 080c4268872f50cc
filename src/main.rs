use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tocal::api::router;
use tocal::calendar::LoggingCalendarSink;
use tocal::config::AppConfig;
use tocal::recognition::{OllamaHttpClient, RecognitionClient};
use tocal::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tocal=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let recognizer: Arc<dyn RecognitionClient> =
        Arc::new(OllamaHttpClient::new(config.ollama.clone())?);
    match recognizer.check_ready().await {
        Ok(()) => info!("recognition backend ready at {}", config.ollama.base_url),
        Err(e) => warn!("recognition backend not ready, processing stays blocked: {}", e),
    }

    let state = AppState::new(recognizer, Arc::new(LoggingCalendarSink), config.parser);

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
