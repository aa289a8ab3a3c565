use super::RegistryConfig;
use crate::config::ConfigError;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// Shared, swappable reference to the active [`RegistryConfig`].
///
/// Readers take a full snapshot with [`current`](Self::current) and keep it for the whole
/// request, so a concurrent reload is observed either entirely or not at all.
#[derive(Clone)]
pub struct RegistryHandle {
    active: Arc<ArcSwap<RegistryConfig>>,
}

impl RegistryHandle {
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self { active: Arc::new(ArcSwap::from_pointee(config)) }
    }

    #[must_use]
    pub fn current(&self) -> Arc<RegistryConfig> {
        self.active.load_full()
    }

    /// Builds a replacement with `load` and swaps it in.
    ///
    /// On failure the active configuration stays in force and the error is logged and returned.
    pub fn reload<F>(&self, load: F) -> Result<Arc<RegistryConfig>, ConfigError>
    where
        F: FnOnce() -> Result<RegistryConfig, ConfigError>,
    {
        match load() {
            Ok(config) => {
                let config = Arc::new(config);
                self.active.store(Arc::clone(&config));
                info!(
                    certificates = config.certificates().len(),
                    tokens = config.tokens().len(),
                    "Configuration reloaded"
                );
                Ok(config)
            }
            Err(e) => {
                error!(error = %e, "Configuration reload failed, keeping the active configuration");
                Err(e)
            }
        }
    }
}

impl fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = self.active.load();
        f.debug_struct("RegistryHandle")
            .field("certificates", &current.certificates().len())
            .field("tokens", &current.tokens().len())
            .finish()
    }
}
