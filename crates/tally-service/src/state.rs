//! Application state.

use std::sync::Arc;

use tally_core::Tenant;
use tally_ledger::{Hooks, Ledger, TextRenderer};
use tally_store::Store;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger engine.
    pub ledger: Arc<Ledger>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create the application state over a store, assembling a ledger with
    /// no hooks and no log formatters.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let tenant = Tenant {
            site_id: config.tenant_site_id,
            network_id: config.tenant_network_id,
        };
        let ledger = Arc::new(Ledger::new(
            store,
            tenant,
            Hooks::default(),
            TextRenderer::new(),
        ));
        Self::with_ledger(ledger, config)
    }

    /// Create the application state around an already-assembled ledger, for
    /// deployments that register hooks or formatters at startup.
    #[must_use]
    pub fn with_ledger(ledger: Arc<Ledger>, config: ServiceConfig) -> Self {
        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not set - authentication is disabled");
        }

        Self { ledger, config }
    }
}
