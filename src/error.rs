use crate::classifier::Letter;
use crate::session::{SessionMode, Trigger};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("Letter '{0}' has already been collected")]
    AlreadyCollected(Letter),

    #[error("No transition from {from:?} on {trigger:?}")]
    InvalidTransition { from: SessionMode, trigger: Trigger },

    #[error("Unexpected close of {closed} while {active}")]
    UnexpectedClose { closed: String, active: String },

    #[error("Replay error at line {line}: {details}")]
    Replay { line: usize, details: String },

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl GiftError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn replay<S: Into<String>>(line: usize, details: S) -> Self {
        Self::Replay {
            line,
            details: details.into(),
        }
    }

    /// Invariant violations are programmer errors in the caller, not input problems
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            GiftError::AlreadyCollected(_)
                | GiftError::InvalidTransition { .. }
                | GiftError::UnexpectedClose { .. }
        )
    }
}

#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event bus channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, GiftError>;
