use super::{ComponentState, SessionRuntime};
use crate::events::EventMetrics;
use crate::session::SessionSnapshot;
use std::collections::HashMap;
use tracing::debug;

impl SessionRuntime {
    /// Update component state
    pub async fn set_component_state(&self, component: &str, state: ComponentState) {
        let mut states = self.component_states.lock().await;
        states.insert(component.to_string(), state.clone());
        debug!("Component '{}' state changed to: {:?}", component, state);
    }

    /// Get component state
    pub async fn get_component_state(&self, component: &str) -> Option<ComponentState> {
        let states = self.component_states.lock().await;
        states.get(component).cloned()
    }

    /// Get all component states
    pub async fn get_all_component_states(&self) -> HashMap<String, ComponentState> {
        let states = self.component_states.lock().await;
        states.clone()
    }

    /// Session state as of the last processed input
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    pub fn metrics(&self) -> EventMetrics {
        self.metrics.lock().clone()
    }
}
