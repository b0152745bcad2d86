use crate::events::EventMetrics;
use crate::session::{SessionController, SessionMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// Session shutdown reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    UserRequest,
    InputExhausted,
}

/// Printed when a session ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub collected: usize,
    pub final_mode: SessionMode,
    pub events_published: u64,
    pub rejected_inputs: u64,
    pub reason: ShutdownReason,
}

impl SessionSummary {
    /// Summarize a finished session
    pub fn new(
        controller: &SessionController,
        started_at: DateTime<Utc>,
        metrics: &EventMetrics,
        reason: ShutdownReason,
    ) -> Self {
        Self {
            session_id: controller.session_id(),
            started_at,
            ended_at: Utc::now(),
            collected: controller.collection().completion_count(),
            final_mode: controller.mode(),
            events_published: metrics.total_events,
            rejected_inputs: metrics.errors,
            reason,
        }
    }
}
