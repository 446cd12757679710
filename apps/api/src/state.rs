use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ModelInvoker;
use crate::storage::BackupStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Both external capabilities are optional: without a model credential the
/// analyze endpoint fails per-request with a configuration error, and without
/// a backup store uploads simply are not archived.
#[derive(Clone)]
pub struct AppState {
    pub invoker: Option<Arc<dyn ModelInvoker>>,
    pub backup: Option<Arc<BackupStore>>,
    pub config: Config,
}
