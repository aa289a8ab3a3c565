use anyhow::Context;
use creg_kernel::prelude::*;
use creg_logger::Logger;
use creg_server::{Server, provision_dirs};

/// Log file prefix inside `LOGS_DIR`.
const LOG_NAME: &str = "app";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = RegistryConfig::loader()
        .env(Env::from_process())
        .load()
        .context("Critical: Configuration is invalid")?;

    let settings = registry.settings();
    provision_dirs(settings)?;

    let _log = Logger::builder()
        .name(LOG_NAME)
        .log_level(settings.log_level)
        .path(&settings.logs_dir)
        .init()?;

    Server::builder().registry(RegistryHandle::new(registry)).build()?.run().await
}
