use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::TaskDispatcher;
use crate::ranking::scorer::MatchScorer;
use crate::store::ApplicationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ApplicationStore>,
    /// Pluggable match scorer. Default: TfidfScorer.
    pub scorer: Arc<dyn MatchScorer>,
    /// Runs ingestion work after uploads. Background or inline per DISPATCH_MODE.
    pub dispatcher: Arc<dyn TaskDispatcher>,
    pub config: Config,
}
