use chrono::Utc;
use dotenvy::dotenv;
use gym_buddy::{
    app::App,
    bot,
    config::{database, gym},
    core::persistence::SnapshotGateway,
    errors::{Error, Result},
};
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Gym settings and the starting plan catalog
    let config = gym::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let catalog = config.catalog()?;
    info!(
        "Configured {} with {} catalog plans",
        config.gym.gym_name,
        catalog.len()
    );

    // 4. Local storage
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect(|_| info!("Database connected"))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Restore state and start the snapshot writer
    let app = Arc::new(
        App::init(SnapshotGateway::new(db), config.gym, catalog, Utc::now())
            .await
            .inspect_err(|e| error!("Failed to start: {}", e))?,
    );

    // 6. Run the bot until it stops or Ctrl-C
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;
    let guild_id = env::var("GUILD_ID").ok().and_then(|id| id.parse::<u64>().ok());

    let outcome = tokio::select! {
        result = bot::run_bot(&token, Arc::clone(&app), guild_id) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    // 7. Flush pending writes before exiting
    let saves = app.shutdown().await;
    info!(saves, "Snapshot writer flushed");

    outcome
}
