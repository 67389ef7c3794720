use dotenvy::dotenv;
use gateway_bot::communication::telegram::TelegramService;
use gateway_bot::configuration::{Config, Context};
use gateway_bot::core::{HttpService, ServiceManager};
use gateway_bot::AppError;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    let config =
        Config::new("config.json").map_err(|e| AppError::ConfigError(e.to_string()))?;

    let log_level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(log_level.to_string()))
        .init();
    tracing::info!("Starting Gateway Bot");

    let context = Context::new(config)
        .await
        .map_err(|e| AppError::ConfigError(e.to_string()))?;
    let shutdown_context = context.clone();

    let mut service_manager = ServiceManager::new(context);
    service_manager.spawn::<HttpService>();
    service_manager.spawn::<TelegramService>();

    let result = tokio::select! {
        result = service_manager.wait() => result.map_err(|_| AppError::ServiceError),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    };

    shutdown_context.shutdown().await;
    result
}
