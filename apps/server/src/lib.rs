//! # Certificate Registry Server
//!
//! Serves the registry API on top of `Axum`. The validated [`RegistryConfig`] is shared
//! through a [`RegistryHandle`]; `SIGHUP` rebuilds it from a fresh environment snapshot and
//! swaps it in only when the new configuration is valid.
//!
//! ## Example
//! ```no_run
//! use creg_kernel::prelude::*;
//! use creg_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = RegistryConfig::loader().load()?;
//!     Server::builder().registry(RegistryHandle::new(registry)).build()?.run().await
//! }
//! ```

mod router;

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use creg_certs::CertbotOperations;
use creg_domain::settings::Settings;
use creg_kernel::prelude::*;
use creg_kernel::server::ApiState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Creates `LOGS_DIR`, `CERTS_DIR` and the parent directories of `CONF_FILE` and
/// `CERTBOT_LOCK_FILE`.
pub fn provision_dirs(settings: &Settings) -> Result<()> {
    let dirs = [&settings.logs_dir, &settings.certs_dir];
    let parents = [&settings.conf_file, &settings.certbot_lock_file].map(|file| file.parent());

    for dir in dirs.into_iter().map(|d| d.as_path()).chain(parents.into_iter().flatten()) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Routes, state and docs, ready to serve.
pub fn app(state: ApiState) -> Router {
    router::init(state)
}

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Default)]
pub struct ServerBuilder {
    registry: Option<RegistryHandle>,
    operations: Option<Arc<dyn CertificateOperations>>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("registry", &self.registry)
            .field("operations", &self.operations.is_some())
            .finish()
    }
}

impl ServerBuilder {
    pub fn registry(mut self, registry: RegistryHandle) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces the certbot-backed collaborator.
    pub fn operations(mut self, operations: Arc<dyn CertificateOperations>) -> Self {
        self.operations = Some(operations);
        self
    }

    /// # Errors
    /// Fails when no registry was provided.
    pub fn build(self) -> Result<Server> {
        let registry = self.registry.context("Registry configuration not provided")?;
        let operations = self
            .operations
            .unwrap_or_else(|| Arc::new(CertbotOperations::new()));

        let current = registry.current();
        let address = current.settings().bind;
        info!(
            address = %address,
            certificates = current.certificates().len(),
            tokens = current.tokens().len(),
            "Initializing server"
        );

        let state = ApiState::builder()
            .registry(registry)
            .operations(operations)
            .build()
            .context("Failed to finalize API state")?;
        Ok(Server { state, address })
    }
}

#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
    address: SocketAddr,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Serves until SIGINT or SIGTERM, then drains connections.
    ///
    /// # Errors
    /// Fails when the address cannot be bound or a signal handler cannot be installed.
    pub async fn run(self) -> Result<()> {
        let address = self.address;
        spawn_reload_listener(self.state.registry.clone(), address)?;

        let app = router::init(self.state);

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        info!("Starting HTTP server on http://{address}");
        axum_server::bind(address)
            .handle(handle)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .context("HTTP server failed")?;

        info!("Server shutdown complete");
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

#[cfg(unix)]
fn spawn_reload_listener(registry: RegistryHandle, bound: SocketAddr) -> Result<()> {
    let mut hangup = signal::unix::signal(signal::unix::SignalKind::hangup())
        .context("Failed to install SIGHUP handler")?;

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("SIGHUP received, reloading configuration");
            let reloaded = registry.reload(|| RegistryConfig::loader().env(Env::from_process()).load());
            if let Ok(config) = reloaded
                && config.settings().bind != bound
            {
                warn!(bound = %bound, configured = %config.settings().bind, "Bind address changed, restart to apply");
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn spawn_reload_listener(_registry: RegistryHandle, _bound: SocketAddr) -> Result<()> {
    Ok(())
}

async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }
    Ok(())
}
