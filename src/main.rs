mod app;
mod auth;
mod config;
mod error;
mod state;
mod users;

use crate::config::{AppConfig, LogConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing(&LogConfig::from_env());

    let config = AppConfig::from_env()?;
    let (host, port) = (config.host.clone(), config.port);

    let state = AppState::init(config).await?;
    app::serve(app::build_app(state), &host, port).await
}
