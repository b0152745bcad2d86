pub mod app;
pub mod classifier;
pub mod clock;
pub mod collection;
pub mod config;
pub mod error;
pub mod events;
pub mod fixtures;
pub mod hold;
pub mod keyboard_input;
pub mod landmarks;
pub mod replay;
pub mod session;
pub mod surprise;

pub use app::{SessionHandle, SessionRuntime, SessionSummary, ShutdownReason};
pub use classifier::{classify, classify_with, Classification, Letter, Pose, Thresholds};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use collection::{Artifact, CollectionTracker};
pub use config::{FinaleVariant, GiftConfig};
pub use error::{EventBusError, GiftError, Result};
pub use events::{
    EventBus, EventFilter, EventHandler, EventMetrics, EventReceiver, JsonLinesHandler,
    SessionEvent,
};
pub use hold::{HoldStatus, HoldTarget, HoldTimer};
pub use landmarks::{Landmark, LandmarkFrame};
pub use replay::{ReplayRecord, Replayer};
pub use session::{
    Presentation, SessionController, SessionInput, SessionMode, SessionSnapshot, Trigger,
};
pub use surprise::{SurpriseDispatch, SurpriseId, SurpriseSequencer};
