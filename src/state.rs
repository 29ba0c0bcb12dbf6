use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::store::Store;
use crate::services::{AuthService, CustomerService};

/// Shared by every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store.as_ref(), &self.config.security)
    }

    pub fn customers(&self) -> CustomerService<'_> {
        CustomerService::new(self.store.as_ref(), &self.config.pagination)
    }
}
