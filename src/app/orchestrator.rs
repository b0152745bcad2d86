use super::handle::SessionHandle;
use super::types::{ComponentState, SessionSummary, ShutdownReason};
use crate::clock::Clock;
use crate::config::GiftConfig;
use crate::error::{GiftError, Result};
use crate::events::{EventBus, EventMetrics};
use crate::keyboard_input::KeyboardInputHandler;
use crate::session::{SessionController, SessionInput, SessionSnapshot};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs one session: owns the controller task, the event bus and the
/// optional keyboard controls
pub struct SessionRuntime {
    pub(super) config: GiftConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) started_at: DateTime<Utc>,

    // Session task
    pub(super) controller: Option<SessionController>,
    pub(super) input_sender: Option<mpsc::Sender<SessionInput>>,
    pub(super) input_receiver: Option<mpsc::Receiver<SessionInput>>,
    pub(super) session_task: Option<JoinHandle<(SessionController, ShutdownReason)>>,
    pub(super) snapshot: Arc<RwLock<SessionSnapshot>>,
    pub(super) metrics: Arc<parking_lot::Mutex<EventMetrics>>,

    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
    pub(super) session_finished: CancellationToken,
    pub(super) summary: Option<SessionSummary>,
}

impl SessionRuntime {
    /// Create a runtime for a fresh session
    pub fn new(config: GiftConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let controller = SessionController::new(&config, clock)?;
        Ok(Self::with_controller(config, controller))
    }

    /// Create a runtime around an existing controller
    pub fn with_controller(config: GiftConfig, controller: SessionController) -> Self {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let (input_sender, input_receiver) = mpsc::channel(config.system.input_queue_capacity);
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let snapshot = Arc::new(RwLock::new(controller.snapshot()));

        Self {
            config,
            event_bus,
            started_at: Utc::now(),
            controller: Some(controller),
            input_sender: Some(input_sender),
            input_receiver: Some(input_receiver),
            session_task: None,
            snapshot,
            metrics: Arc::new(parking_lot::Mutex::new(EventMetrics::default())),
            keyboard_handler: None,
            keyboard_enabled: false,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
            session_finished: CancellationToken::new(),
            summary: None,
        }
    }

    /// Enable or disable keyboard controls
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    /// New handle for sending inputs
    pub fn handle(&self) -> Result<SessionHandle> {
        let sender = self
            .input_sender
            .clone()
            .ok_or_else(|| GiftError::system("Session inputs already closed"))?;
        Ok(SessionHandle::new(sender, Arc::clone(&self.snapshot)))
    }

    /// Drop the runtime's own sender; the session ends once every handle is dropped
    pub fn close_inputs(&mut self) {
        self.input_sender = None;
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn config(&self) -> &GiftConfig {
        &self.config
    }

    /// Token cancelled once the session task has exited
    pub fn finished(&self) -> CancellationToken {
        self.session_finished.clone()
    }
}
