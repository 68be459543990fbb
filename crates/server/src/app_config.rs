//! Configuration loading for the binary.

use anyhow::Context;

/// Load configuration from `.env` and environment variables.
pub fn load_config() -> anyhow::Result<roster_core::Config> {
    roster_core::config::load_dotenv();
    roster_core::Config::from_env().context("invalid configuration")
}
