use super::{SessionRuntime, SessionSummary, ShutdownReason};
use crate::error::{GiftError, Result};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

impl SessionRuntime {
    /// Run until a signal arrives or the session task ends, then shut down
    pub async fn run(&mut self) -> Result<SessionSummary> {
        info!("gesturegift session is running");

        // Set up signal handling for graceful shutdown
        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| GiftError::system("Shutdown sender already taken"))?;

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| GiftError::system("Shutdown receiver already taken"))?;

        self.setup_signal_handlers(shutdown_sender).await;

        let finished = self.finished();
        let shutdown_reason = tokio::select! {
            reason = shutdown_receiver => reason.map_err(|_| {
                GiftError::system("Shutdown channel closed unexpectedly")
            })?,
            _ = finished.cancelled() => ShutdownReason::UserRequest,
        };

        info!("Shutdown initiated: {:?}", shutdown_reason);

        let summary = self.shutdown(shutdown_reason).await?;

        info!("gesturegift session shutdown complete");
        Ok(summary)
    }

    /// Set up signal handlers for graceful shutdown
    async fn setup_signal_handlers(&self, shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

        // Handle SIGTERM - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate())
                {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
                if let Some(()) = sigterm.recv().await {
                    info!("Received SIGTERM signal");
                    if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                        let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}
