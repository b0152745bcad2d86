use crate::classifier::Letter;
use crate::collection::Artifact;
use crate::error::EventBusError;
use crate::hold::HoldTarget;
use crate::session::SessionMode;
use crate::surprise::SurpriseId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Events the session core emits for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A pose is being held; drives the progress ring around the camera preview
    HoldProgress { target: HoldTarget, progress: f32 },
    /// A hold in progress was dropped before confirming
    HoldCancelled { target: HoldTarget },
    /// A letter was held long enough: capture the frame and upload it
    GestureConfirmed { letter: Letter, artifact: Artifact },
    /// The OK gate or the finale thumbs-up was held long enough
    ControlConfirmed { target: HoldTarget },
    /// The session moved to another mode
    ModeChanged { from: SessionMode, to: SessionMode },
    /// Start a surprise and report back with its close
    SurpriseRequested { surprise: SurpriseId, letter: Letter },
    /// Show the textual card for a letter and report back with its close
    LetterCardRequested { letter: Letter },
    /// All six letters are collected
    SetComplete { artifacts: Vec<Artifact> },
    /// Finale thumbs-up confirmed: show the captured grid
    FinaleRevealed { artifacts: Vec<Artifact> },
    /// Hand-driven scene rotation target moved
    RotationChanged { target: f32 },
}

impl SessionEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::HoldProgress { target, progress } => {
                format!("Holding {} ({:.0}%)", target, progress * 100.0)
            }
            SessionEvent::HoldCancelled { target } => format!("Hold of {} cancelled", target),
            SessionEvent::GestureConfirmed { letter, artifact } => {
                format!("Collected '{}' (capture {})", letter, artifact.capture_id)
            }
            SessionEvent::ControlConfirmed { target } => format!("{} confirmed", target),
            SessionEvent::ModeChanged { from, to } => format!("Mode {:?} -> {:?}", from, to),
            SessionEvent::SurpriseRequested { surprise, letter } => {
                format!("Surprise {} requested for '{}'", surprise, letter)
            }
            SessionEvent::LetterCardRequested { letter } => {
                format!("Letter card requested for '{}'", letter)
            }
            SessionEvent::SetComplete { artifacts } => {
                format!("Set complete with {} captures", artifacts.len())
            }
            SessionEvent::FinaleRevealed { artifacts } => {
                format!("Finale revealed with {} captures", artifacts.len())
            }
            SessionEvent::RotationChanged { target } => {
                format!("Scene rotation target {:.3}", target)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::HoldProgress { .. } => "hold_progress",
            SessionEvent::HoldCancelled { .. } => "hold_cancelled",
            SessionEvent::GestureConfirmed { .. } => "gesture_confirmed",
            SessionEvent::ControlConfirmed { .. } => "control_confirmed",
            SessionEvent::ModeChanged { .. } => "mode_changed",
            SessionEvent::SurpriseRequested { .. } => "surprise_requested",
            SessionEvent::LetterCardRequested { .. } => "letter_card_requested",
            SessionEvent::SetComplete { .. } => "set_complete",
            SessionEvent::FinaleRevealed { .. } => "finale_revealed",
            SessionEvent::RotationChanged { .. } => "rotation_changed",
        }
    }

    /// Per-frame feedback that is too chatty for info-level logs
    pub fn is_per_frame(&self) -> bool {
        matches!(
            self,
            SessionEvent::HoldProgress { .. } | SessionEvent::RotationChanged { .. }
        )
    }
}

/// Event bus for fanning session events out to presentation subscribers
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: SessionEvent) -> Result<usize, EventBusError> {
        if self.debug_logging {
            debug!("Publishing event: {}", event.description());
        }

        match &event {
            SessionEvent::ModeChanged { from, to } => {
                info!("Session mode changed: {:?} -> {:?}", from, to);
            }
            SessionEvent::SetComplete { .. } | SessionEvent::FinaleRevealed { .. } => {
                info!("{}", event.description());
            }
            _ => {
                if self.debug_logging && !event.is_per_frame() {
                    debug!("Event: {}", event.description());
                }
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            debug_logging: self.debug_logging,
        }
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Drop per-frame feedback, keep everything else
    Milestones,
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &SessionEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Milestones => !event.is_per_frame(),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<SessionEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(
        receiver: broadcast::Receiver<SessionEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<SessionEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<SessionEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    return Ok(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

/// Event handler trait for presentation-side consumers of session events
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an incoming event
    async fn handle_event(&mut self, event: SessionEvent) -> Result<(), EventBusError>;

    /// Get the name of this handler for logging
    fn handler_name(&self) -> &str;

    /// Get the event filter for this handler
    fn event_filter(&self) -> EventFilter;
}

/// Feed events from `receiver` to `handler` until the bus closes or `cancel` fires
///
/// Subscribe before spawning the handler task so that nothing published in
/// between is lost.
pub async fn run_handler<H: EventHandler>(
    mut handler: H,
    receiver: broadcast::Receiver<SessionEvent>,
    cancel: CancellationToken,
) -> H {
    let mut receiver = EventReceiver::new(
        receiver,
        handler.event_filter(),
        handler.handler_name().to_string(),
    );

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = receiver.recv() => event,
        };
        match event {
            Ok(event) => {
                if let Err(e) = handler.handle_event(event).await {
                    warn!("Handler '{}' failed: {}", handler.handler_name(), e);
                }
            }
            Err(EventBusError::ChannelClosed) => break,
            Err(e) => warn!("Handler '{}' missed events: {}", handler.handler_name(), e),
        }
    }

    // Events published before cancellation are still delivered
    while let Ok(Some(event)) = receiver.try_recv() {
        if let Err(e) = handler.handle_event(event).await {
            warn!("Handler '{}' failed: {}", handler.handler_name(), e);
        }
    }

    debug!("Handler '{}' stopped", handler.handler_name());
    handler
}

/// Writes each event as one JSON object per line
pub struct JsonLinesHandler<W> {
    writer: W,
    filter: EventFilter,
    written: u64,
}

impl<W: Write + Send + Sync> JsonLinesHandler<W> {
    pub fn new(writer: W, filter: EventFilter) -> Self {
        Self {
            writer,
            filter,
            written: 0,
        }
    }

    /// Write one event directly, bypassing the bus
    pub fn write_event(&mut self, event: &SessionEvent) -> Result<(), EventBusError> {
        if !self.filter.matches(event) {
            return Ok(());
        }
        let line = serde_json::to_string(event).map_err(|e| EventBusError::PublishFailed {
            details: e.to_string(),
        })?;
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait::async_trait]
impl<W: Write + Send + Sync> EventHandler for JsonLinesHandler<W> {
    async fn handle_event(&mut self, event: SessionEvent) -> Result<(), EventBusError> {
        self.write_event(&event)
    }

    fn handler_name(&self) -> &str {
        "json_lines"
    }

    fn event_filter(&self) -> EventFilter {
        self.filter.clone()
    }
}

/// Published event counts for the session summary
#[derive(Debug, Default, Clone)]
pub struct EventMetrics {
    pub total_events: u64,
    pub events_by_type: HashMap<&'static str, u64>,
    pub errors: u64,
}

impl EventMetrics {
    /// Record an event
    pub fn record_event(&mut self, event: &SessionEvent) {
        self.total_events += 1;
        *self.events_by_type.entry(event.event_type()).or_insert(0) += 1;
    }

    /// Record an error
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn count(&self, event_type: &str) -> u64 {
        self.events_by_type.get(event_type).copied().unwrap_or(0)
    }
}
