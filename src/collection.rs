use crate::classifier::Letter;
use crate::error::{GiftError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Capture handle created when a letter is confirmed.
///
/// The core never touches pixels. The presentation layer grabs the camera
/// frame for `capture_id` and uploads it to `upload_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub capture_id: Uuid,
    pub letter: Letter,
    pub captured_at_ms: u64,
    pub upload_path: String,
}

impl Artifact {
    pub fn new(session_id: Uuid, letter: Letter, captured_at_ms: u64) -> Self {
        Self {
            capture_id: Uuid::new_v4(),
            letter,
            captured_at_ms,
            upload_path: Self::upload_path_for(session_id, letter),
        }
    }

    /// Storage location of a letter's capture within a session
    pub fn upload_path_for(session_id: Uuid, letter: Letter) -> String {
        format!("sessions/{}/{}.png", session_id, letter)
    }
}

/// Outcome of recording a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Letters collected after this one, including it
    pub completion_count: usize,
    /// True only for the collection that completed the set
    pub set_completed: bool,
}

/// Which letters have been collected and what was captured for each
#[derive(Debug, Clone, Default)]
pub struct CollectionTracker {
    slots: [Option<Artifact>; 6],
    complete_signalled: bool,
}

impl CollectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `letter` collected with its capture.
    ///
    /// Collecting a letter twice is a caller bug and is rejected without
    /// touching the stored artifact.
    pub fn record_collected(&mut self, letter: Letter, artifact: Artifact) -> Result<RecordOutcome> {
        let slot = &mut self.slots[letter.index()];
        if slot.is_some() {
            return Err(GiftError::AlreadyCollected(letter));
        }
        *slot = Some(artifact);

        let completion_count = self.completion_count();
        let set_completed = completion_count == Letter::SEQUENCE.len() && !self.complete_signalled;
        if set_completed {
            self.complete_signalled = true;
            info!("All {} letters collected", completion_count);
        } else {
            debug!(
                "Collected '{}' ({}/{})",
                letter,
                completion_count,
                Letter::SEQUENCE.len()
            );
        }

        Ok(RecordOutcome {
            completion_count,
            set_completed,
        })
    }

    pub fn is_collected(&self, letter: Letter) -> bool {
        self.slots[letter.index()].is_some()
    }

    pub fn completion_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.completion_count() == Letter::SEQUENCE.len()
    }

    pub fn artifact(&self, letter: Letter) -> Option<&Artifact> {
        self.slots[letter.index()].as_ref()
    }

    /// Collected artifacts in sequence order
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.slots.iter().flatten().cloned().collect()
    }

    pub fn collected_letters(&self) -> Vec<Letter> {
        Letter::SEQUENCE
            .iter()
            .copied()
            .filter(|&letter| self.is_collected(letter))
            .collect()
    }

    pub fn remaining_letters(&self) -> Vec<Letter> {
        Letter::SEQUENCE
            .iter()
            .copied()
            .filter(|&letter| !self.is_collected(letter))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(letter: Letter) -> Artifact {
        Artifact::new(Uuid::nil(), letter, 1000)
    }

    #[test]
    fn test_record_and_query() {
        let mut tracker = CollectionTracker::new();
        assert_eq!(tracker.completion_count(), 0);
        assert!(!tracker.is_collected(Letter::O));

        let outcome = tracker.record_collected(Letter::O, artifact(Letter::O)).unwrap();
        assert_eq!(outcome.completion_count, 1);
        assert!(!outcome.set_completed);
        assert!(tracker.is_collected(Letter::O));
        assert_eq!(tracker.artifact(Letter::O).unwrap().letter, Letter::O);
        assert_eq!(tracker.remaining_letters().len(), 5);
    }

    #[test]
    fn test_double_collection_rejected() {
        let mut tracker = CollectionTracker::new();
        let first = artifact(Letter::I);
        tracker.record_collected(Letter::I, first.clone()).unwrap();

        let err = tracker
            .record_collected(Letter::I, artifact(Letter::I))
            .unwrap_err();
        assert!(matches!(err, GiftError::AlreadyCollected(Letter::I)));
        assert_eq!(tracker.artifact(Letter::I), Some(&first));
        assert_eq!(tracker.completion_count(), 1);
    }

    #[test]
    fn test_complete_signalled_once() {
        let mut tracker = CollectionTracker::new();
        let mut completions = 0;
        // Out of sequence on purpose
        for letter in [Letter::U, Letter::E, Letter::V, Letter::O, Letter::L, Letter::I] {
            if tracker
                .record_collected(letter, artifact(letter))
                .unwrap()
                .set_completed
            {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(tracker.is_complete());

        assert!(tracker.record_collected(Letter::I, artifact(Letter::I)).is_err());
        assert_eq!(tracker.collected_letters(), Letter::SEQUENCE.to_vec());
    }

    #[test]
    fn test_artifacts_in_sequence_order() {
        let mut tracker = CollectionTracker::new();
        tracker.record_collected(Letter::V, artifact(Letter::V)).unwrap();
        tracker.record_collected(Letter::I, artifact(Letter::I)).unwrap();
        let letters: Vec<Letter> = tracker.artifacts().iter().map(|a| a.letter).collect();
        assert_eq!(letters, vec![Letter::I, Letter::V]);
    }

    #[test]
    fn test_upload_path() {
        let session = Uuid::nil();
        assert_eq!(
            Artifact::upload_path_for(session, Letter::E),
            "sessions/00000000-0000-0000-0000-000000000000/E.png"
        );
    }
}
