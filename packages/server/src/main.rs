#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone dashboard server binary.
//!
//! Reads configuration from the embedded defaults, `CLIMATE_NEED_CONFIG`,
//! and the environment, then serves the dashboard.

use climate_need_config::NeedConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = NeedConfig::load(None).map_err(std::io::Error::other)?;
    climate_need_server::run_server(config).await
}
