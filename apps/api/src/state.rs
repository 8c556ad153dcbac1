use std::sync::Arc;

use crate::config::Config;
use crate::parser::ResumeParser;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup; read-only for the lifetime of the process.
    pub parser: Arc<ResumeParser>,
    pub config: Config,
}

impl AppState {
    pub fn new(parser: ResumeParser, config: Config) -> Self {
        Self {
            parser: Arc::new(parser),
            config,
        }
    }
}
