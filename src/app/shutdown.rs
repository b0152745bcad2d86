use super::{ComponentState, SessionRuntime, SessionSummary, ShutdownReason};
use crate::error::{GiftError, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

impl SessionRuntime {
    /// Stop the session task and keyboard controls and summarize the session.
    ///
    /// Idempotent: later calls return the summary of the first.
    pub async fn shutdown(&mut self, reason: ShutdownReason) -> Result<SessionSummary> {
        if let Some(summary) = &self.summary {
            return Ok(summary.clone());
        }

        info!("Beginning graceful shutdown");

        if let Some(keyboard_handler) = self.keyboard_handler.take() {
            self.set_component_state("keyboard", ComponentState::Stopping)
                .await;
            match keyboard_handler.stop().await {
                Ok(()) => {
                    self.set_component_state("keyboard", ComponentState::Stopped)
                        .await
                }
                Err(e) => {
                    error!("Error stopping keyboard: {}", e);
                    self.set_component_state("keyboard", ComponentState::Failed)
                        .await;
                }
            }
        }

        // Cancel the session task
        self.cancellation_token.cancel();
        self.set_component_state("session", ComponentState::Stopping)
            .await;

        let (controller, reason) = match self.session_task.take() {
            Some(task) => match timeout(Duration::from_secs(5), task).await {
                Ok(Ok((controller, task_reason))) => {
                    // A task that ended on its own keeps its own reason
                    let reason = match reason {
                        ShutdownReason::UserRequest => task_reason,
                        other => other,
                    };
                    (controller, reason)
                }
                Ok(Err(e)) => {
                    self.set_component_state("session", ComponentState::Failed)
                        .await;
                    error!("Session task failed: {}", e);
                    return Err(GiftError::component(
                        "session".to_string(),
                        format!("task failed: {}", e),
                    ));
                }
                Err(_) => {
                    self.set_component_state("session", ComponentState::Failed)
                        .await;
                    error!("Session task stop timeout");
                    return Err(GiftError::system("Session task stop timeout"));
                }
            },
            None => match self.controller.take() {
                Some(controller) => (controller, reason),
                None => return Err(GiftError::system("Session controller missing")),
            },
        };
        self.set_component_state("session", ComponentState::Stopped)
            .await;

        let metrics = self.metrics.lock().clone();
        let summary = SessionSummary::new(&controller, self.started_at, &metrics, reason);
        *self.snapshot.write() = controller.snapshot();

        info!(
            "Session {} ended in mode {} with {}/6 letters ({:?})",
            summary.session_id, summary.final_mode, summary.collected, summary.reason
        );
        self.summary = Some(summary.clone());
        Ok(summary)
    }
}
