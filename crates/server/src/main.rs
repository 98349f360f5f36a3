use sea_orm::Database;
use session_gate::api::start_webserver;
use session_gate::config::load_config_or_panic;
use session_gate::AppResources;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "session_gate=info,hyper=warn,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");
    initialize_tracing();

    // Environment overrides (including JWT__SECRET) may come from a .env
    // file in development.
    dotenvy::dotenv().ok();

    let config = Arc::new(load_config_or_panic());

    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );

    let resources = AppResources::new(db, config);
    start_webserver(resources).await?;
    Ok(())
}
