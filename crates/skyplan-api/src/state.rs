use std::sync::Arc;

use skyplan_core::ports::DocumentStore;

use crate::services::MissionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub missions: Arc<MissionRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            missions: Arc::new(MissionRegistry::new(store)),
        }
    }
}
