use super::{ComponentState, SessionRuntime, ShutdownReason};
use crate::error::{GiftError, Result};
use crate::events::{EventBus, EventMetrics};
use crate::keyboard_input::KeyboardInputHandler;
use crate::session::{SessionController, SessionInput, SessionSnapshot};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

impl SessionRuntime {
    /// Start the session task and, when enabled, the keyboard controls
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting gesturegift session");

        let controller = self
            .controller
            .take()
            .ok_or_else(|| GiftError::system("Session already started"))?;
        let receiver = self
            .input_receiver
            .take()
            .ok_or_else(|| GiftError::system("Session input receiver already taken"))?;

        self.set_component_state("session", ComponentState::Starting)
            .await;

        let task = SessionTask {
            controller,
            receiver,
            event_bus: Arc::clone(&self.event_bus),
            snapshot: Arc::clone(&self.snapshot),
            metrics: Arc::clone(&self.metrics),
            cancellation_token: self.cancellation_token.clone(),
            finished: self.session_finished.clone(),
        };
        self.session_task = Some(tokio::spawn(task.run()));

        self.set_component_state("session", ComponentState::Running)
            .await;
        info!("Session task started");

        if self.keyboard_enabled {
            self.set_component_state("keyboard", ComponentState::Starting)
                .await;

            let handler = KeyboardInputHandler::new(self.handle()?);
            if let Err(e) = handler.start().await {
                error!("Failed to start keyboard controls: {}", e);
                self.set_component_state("keyboard", ComponentState::Failed)
                    .await;
                return Err(e);
            }
            self.keyboard_handler = Some(handler);

            self.set_component_state("keyboard", ComponentState::Running)
                .await;
            info!("Keyboard controls started");
        }

        Ok(())
    }
}

/// State moved into the spawned session task
struct SessionTask {
    controller: SessionController,
    receiver: mpsc::Receiver<SessionInput>,
    event_bus: Arc<EventBus>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
    metrics: Arc<Mutex<EventMetrics>>,
    cancellation_token: CancellationToken,
    finished: CancellationToken,
}

impl SessionTask {
    async fn run(mut self) -> (SessionController, ShutdownReason) {
        let reason = loop {
            let input = tokio::select! {
                _ = self.cancellation_token.cancelled() => None,
                input = self.receiver.recv() => Some(input),
            };

            match input {
                None => {
                    debug!("Session task cancelled");
                    break ShutdownReason::UserRequest;
                }
                Some(None) => {
                    info!("All session inputs consumed");
                    break ShutdownReason::InputExhausted;
                }
                Some(Some(SessionInput::Shutdown)) => {
                    info!("Shutdown requested by session input");
                    break ShutdownReason::UserRequest;
                }
                Some(Some(input)) => self.process(input).await,
            }
        };

        self.finished.cancel();
        (self.controller, reason)
    }

    async fn process(&mut self, input: SessionInput) {
        match self.controller.apply(input) {
            Ok(events) => {
                for event in events {
                    self.metrics.lock().record_event(&event);
                    if let Err(e) = self.event_bus.publish(event).await {
                        debug!("Event not delivered: {}", e);
                    }
                }
            }
            Err(e) => {
                // Rejected inputs never stop the session
                warn!("Rejected session input: {}", e);
                self.metrics.lock().record_error();
            }
        }

        *self.snapshot.write() = self.controller.snapshot();
    }
}
