use anyhow::Result;
use dossier_courier::{PipelineConfig, services::pipeline};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- .env first, real environment wins ---
    dotenvy::dotenv().ok();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = PipelineConfig::from_env_and_args()?;
    tracing::info!("Starting upload with config: {:?}", cfg);

    match pipeline::run(&cfg).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => {
            if let Some(api) = err.api_error() {
                for cause in api.causes() {
                    tracing::error!("API cause: {}", cause.message);
                }
            }
            Err(err.into())
        }
    }
}
