use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::membership::MembershipGate;
use crate::storage::FileStorage;
use crate::store::DocumentStore;

/// Handles shared by every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn FileStorage>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, storage: Arc<dyn FileStorage>, config: AppConfig) -> Self {
        Self { store, storage, config: Arc::new(config) }
    }

    pub fn gate(&self) -> MembershipGate<'_> {
        MembershipGate::new(self.store.as_ref())
    }
}
