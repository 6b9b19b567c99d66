//! Shared application state

use std::sync::Arc;

use voting_cli::Synchronizer;

#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<Synchronizer>,
}

impl AppState {
    pub fn new(sync: Arc<Synchronizer>) -> Self {
        Self { sync }
    }
}
