//! # Chat Backend
//!
//! Thin entry point that delegates to lib-web for server setup.
//!
//! Configuration comes from the environment (a `.env` file is loaded first when present).
//! See [`lib_core::Config::from_env`] for the variables read.

use lib_core::Config;
use lib_web::{init_tracing, start_server};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    let config = Config::from_env()?;
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    start_server(config).await
}
