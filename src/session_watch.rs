use color_eyre::eyre::Result;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use tutorbook_client::config::ClientConfig;
use tutorbook_db::create_pool;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    let config = ClientConfig::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting TutorBook session watcher");

    let db_pool = create_pool(&config.database_url).await?;

    if let Err(e) = tutorbook_client::watch_sessions(config, db_pool).await {
        error!("Session watcher stopped: {}", e);
        return Err(e);
    }

    info!("Session watcher shut down");
    Ok(())
}
