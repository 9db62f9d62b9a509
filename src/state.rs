//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::{config::Config, models::pagination::PageRequest, repository::Repository};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, config: Config) -> Self {
        Self {
            repo,
            config: Arc::new(config),
        }
    }

    /// Resolve raw `page`/`limit` query values against the configured maximum.
    pub fn page_request(&self, page: Option<i64>, limit: Option<i64>) -> PageRequest {
        PageRequest::new(page, limit, self.config.max_page_size)
    }
}
