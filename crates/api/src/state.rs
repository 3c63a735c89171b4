use std::sync::Arc;

use pagecraft_db::{PageStore, VersionStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Page documents.
    pub pages: Arc<dyn PageStore>,
    /// Append-only version log.
    pub versions: Arc<dyn VersionStore>,
    /// Server configuration (JWT settings are read by the auth extractors).
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state where one store value backs both pages and versions.
    pub fn new<S>(store: S, config: ServerConfig) -> Self
    where
        S: PageStore + VersionStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            pages: store.clone(),
            versions: store,
            config: Arc::new(config),
        }
    }
}
