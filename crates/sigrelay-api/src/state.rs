//! Shared handler state.

use std::sync::Arc;

use sigrelay_signal::SignalValidator;
use sigrelay_store::DynRecordStore;

use crate::config::ApiConfig;

/// State cloned into every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) store: DynRecordStore,
    pub(crate) validator: Arc<SignalValidator>,
    pub(crate) config: Arc<ApiConfig>,
    /// Port actually bound, once known.
    pub(crate) port: Option<u16>,
}

impl AppState {
    pub fn new(store: DynRecordStore, config: ApiConfig) -> Self {
        Self {
            validator: Arc::new(SignalValidator::new(store.clone())),
            store,
            config: Arc::new(config),
            port: None,
        }
    }

    /// Record the bound port for the healthcheck.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}
