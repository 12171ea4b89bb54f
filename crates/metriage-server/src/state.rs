use crate::config::ServerConfig;
use metriage_engine::analyzer::AnalyzeOptions;
use std::sync::Arc;

/// Shared handler state. Rules are read from disk per request, so nothing
/// here is mutable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Options for one upload. The cluster name comes from the uploaded file name.
    pub fn analyze_options(&self) -> AnalyzeOptions {
        let mut opts = AnalyzeOptions::new(&self.config.rules_dir);
        opts.load_level_dir = self.config.load_level_dir();
        opts
    }
}
