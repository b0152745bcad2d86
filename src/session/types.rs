use crate::classifier::Letter;
use crate::config::FinaleVariant;
use crate::error::{GiftError, Result};
use crate::landmarks::LandmarkFrame;
use crate::surprise::SurpriseId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Top-level phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Intro,
    Instructions,
    Collecting,
    SurpriseActive,
    FinaleReady,
    Finale,
}

/// Something that moves the session between modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OkConfirmed,
    LetterCollected,
    PresentationClosed { set_complete: bool },
    ThumbsUpConfirmed,
}

impl SessionMode {
    /// Mode reached from `self` on `trigger`.
    ///
    /// This is the whole transition table; any pair not listed is rejected.
    pub fn next(self, trigger: Trigger, finale: FinaleVariant) -> Result<SessionMode> {
        use SessionMode::*;

        let to = match (self, trigger) {
            (Intro, Trigger::OkConfirmed) => Instructions,
            (Instructions, Trigger::OkConfirmed) => Collecting,
            (Collecting, Trigger::LetterCollected) => SurpriseActive,
            (SurpriseActive, Trigger::PresentationClosed { set_complete: false }) => Collecting,
            (SurpriseActive, Trigger::PresentationClosed { set_complete: true }) => match finale {
                FinaleVariant::ThumbsUpGrid => FinaleReady,
                FinaleVariant::Immediate => Finale,
            },
            (FinaleReady, Trigger::ThumbsUpConfirmed) => Finale,
            (from, trigger) => return Err(GiftError::InvalidTransition { from, trigger }),
        };
        Ok(to)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionMode::Finale)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionMode::Intro => "intro",
            SessionMode::Instructions => "instructions",
            SessionMode::Collecting => "collecting",
            SessionMode::SurpriseActive => "surprise_active",
            SessionMode::FinaleReady => "finale_ready",
            SessionMode::Finale => "finale",
        };
        f.write_str(name)
    }
}

/// What the presentation layer is currently showing on the session's behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Presentation {
    Surprise { surprise: SurpriseId, letter: Letter },
    LetterCard { letter: Letter },
}

impl Presentation {
    pub fn letter(&self) -> Letter {
        match self {
            Presentation::Surprise { letter, .. } | Presentation::LetterCard { letter } => *letter,
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presentation::Surprise { surprise, letter } => {
                write!(f, "surprise {} for '{}'", surprise, letter)
            }
            Presentation::LetterCard { letter } => write!(f, "letter card for '{}'", letter),
        }
    }
}

/// Point-in-time view of a session for observers outside the session task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub mode: SessionMode,
    pub collected: Vec<Letter>,
    pub surprise_cursor: usize,
    pub paused: bool,
    pub presentation: Option<Presentation>,
    pub rotation_target: f32,
}

/// Inputs a session consumes, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Landmarks(LandmarkFrame),
    IntroTextComplete,
    SurpriseClosed(SurpriseId),
    LetterCardClosed(Letter),
    /// Close whatever is presented
    ClosePresentation,
    ModalOpen(bool),
    Shutdown,
}
