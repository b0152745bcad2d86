use crate::classifier::Letter;
use crate::error::{GiftError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Number of surprise slots, one per letter
pub const QUEUE_LENGTH: usize = 6;

/// Multimedia interludes the presentation layer knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurpriseId {
    PhotoSlideshow,
    VoiceClip,
    DialogueGame,
    ImageReveal,
    TypedLetter,
    FinalRedirect,
    /// Log-only slot; the letter card is shown instead
    Placeholder,
}

impl SurpriseId {
    pub const DEFAULT_QUEUE: [SurpriseId; QUEUE_LENGTH] = [
        SurpriseId::PhotoSlideshow,
        SurpriseId::VoiceClip,
        SurpriseId::DialogueGame,
        SurpriseId::ImageReveal,
        SurpriseId::TypedLetter,
        SurpriseId::FinalRedirect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SurpriseId::PhotoSlideshow => "photo_slideshow",
            SurpriseId::VoiceClip => "voice_clip",
            SurpriseId::DialogueGame => "dialogue_game",
            SurpriseId::ImageReveal => "image_reveal",
            SurpriseId::TypedLetter => "typed_letter",
            SurpriseId::FinalRedirect => "final_redirect",
            SurpriseId::Placeholder => "placeholder",
        }
    }

    /// Whether the presentation layer takes over input until it reports a close
    pub fn is_blocking(&self) -> bool {
        !matches!(self, SurpriseId::Placeholder)
    }
}

impl fmt::Display for SurpriseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the controller should present for a newly collected letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurpriseDispatch {
    /// Run this surprise; it replaces the letter card
    Blocking(SurpriseId),
    /// No surprise for this slot, show the letter card
    Fallback,
    /// Every slot has been used already
    Exhausted,
}

/// Walks the fixed surprise queue, one slot per newly collected letter
#[derive(Debug, Clone)]
pub struct SurpriseSequencer {
    queue: Vec<SurpriseId>,
    cursor: usize,
}

impl Default for SurpriseSequencer {
    fn default() -> Self {
        Self {
            queue: SurpriseId::DEFAULT_QUEUE.to_vec(),
            cursor: 0,
        }
    }
}

impl SurpriseSequencer {
    pub fn new(queue: Vec<SurpriseId>) -> Result<Self> {
        if queue.len() != QUEUE_LENGTH {
            return Err(GiftError::component(
                "surprise_sequencer".to_string(),
                format!(
                    "queue must hold {} surprises, got {}",
                    QUEUE_LENGTH,
                    queue.len()
                ),
            ));
        }
        Ok(Self { queue, cursor: 0 })
    }

    /// Advance for a letter that just went from uncollected to collected.
    ///
    /// The caller guarantees the transition; this never looks at the letter
    /// other than for logging.
    pub fn on_newly_collected(&mut self, letter: Letter) -> SurpriseDispatch {
        let Some(&surprise) = self.queue.get(self.cursor) else {
            warn!(
                "Surprise queue exhausted, ignoring collection of '{}'",
                letter
            );
            return SurpriseDispatch::Exhausted;
        };

        self.cursor += 1;
        debug!(
            "Surprise slot {}/{} for '{}': {}",
            self.cursor,
            self.queue.len(),
            letter,
            surprise
        );

        if surprise.is_blocking() {
            info!("Dispatching surprise {} for '{}'", surprise, letter);
            SurpriseDispatch::Blocking(surprise)
        } else {
            info!("Placeholder surprise for '{}', showing letter card", letter);
            SurpriseDispatch::Fallback
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    pub fn queue(&self) -> &[SurpriseId] {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_queue_order() {
        let mut sequencer = SurpriseSequencer::default();
        let dispatched: Vec<SurpriseDispatch> = Letter::SEQUENCE
            .iter()
            .map(|&letter| sequencer.on_newly_collected(letter))
            .collect();

        let expected: Vec<SurpriseDispatch> = SurpriseId::DEFAULT_QUEUE
            .iter()
            .map(|&id| SurpriseDispatch::Blocking(id))
            .collect();
        assert_eq!(dispatched, expected);
        assert!(sequencer.is_exhausted());
    }

    #[test]
    fn test_cursor_saturates() {
        let mut sequencer = SurpriseSequencer::default();
        for letter in Letter::SEQUENCE {
            sequencer.on_newly_collected(letter);
        }
        assert_eq!(sequencer.cursor(), QUEUE_LENGTH);
        assert_eq!(
            sequencer.on_newly_collected(Letter::U),
            SurpriseDispatch::Exhausted
        );
        assert_eq!(sequencer.cursor(), QUEUE_LENGTH);
    }

    #[test]
    fn test_placeholder_falls_back() {
        let mut queue = SurpriseId::DEFAULT_QUEUE.to_vec();
        queue[1] = SurpriseId::Placeholder;
        let mut sequencer = SurpriseSequencer::new(queue).unwrap();

        assert_eq!(
            sequencer.on_newly_collected(Letter::I),
            SurpriseDispatch::Blocking(SurpriseId::PhotoSlideshow)
        );
        assert_eq!(
            sequencer.on_newly_collected(Letter::L),
            SurpriseDispatch::Fallback
        );
        assert_eq!(sequencer.cursor(), 2);
    }

    #[test]
    fn test_slots_follow_collection_order_not_letter() {
        // A letter collected out of sequence still takes the next slot
        let mut sequencer = SurpriseSequencer::default();
        assert_eq!(
            sequencer.on_newly_collected(Letter::U),
            SurpriseDispatch::Blocking(SurpriseId::PhotoSlideshow)
        );
    }

    #[test]
    fn test_rejects_wrong_queue_length() {
        assert!(SurpriseSequencer::new(vec![SurpriseId::VoiceClip; 5]).is_err());
        assert!(SurpriseSequencer::new(vec![SurpriseId::VoiceClip; 7]).is_err());
    }

    #[test]
    fn test_surprise_id_serde_names() {
        let json = serde_json::to_string(&SurpriseId::DialogueGame).unwrap();
        assert_eq!(json, "\"dialogue_game\"");
        for id in SurpriseId::DEFAULT_QUEUE {
            assert_eq!(
                serde_json::to_string(&id).unwrap(),
                format!("\"{}\"", id.as_str())
            );
        }
    }
}
