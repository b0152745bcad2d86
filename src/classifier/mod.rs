//! Hand pose classification from a 21-point landmark set.
//!
//! Everything here is a pure function of the input landmarks and the
//! thresholds. Incomplete input classifies as "no pose".

mod geometry;
mod pose;

#[cfg(test)]
mod tests;

pub use geometry::{is_curled, is_extended, Finger, FingerState, HandState};
pub use pose::{Letter, Pose};

use crate::config::GestureConfig;
use crate::landmarks::{self, Landmark};
use serde::{Deserialize, Serialize};

/// Fingertip distance below which thumb and index count as touching
pub const TOUCH_THRESHOLD: f32 = 0.08;
/// The thumb counts as curled while its tip spread stays below this multiple of its base spread
pub const THUMB_CURL_MULTIPLIER: f32 = 1.2;
/// How far above its MCP joint the thumb tip must be for a thumbs-up
pub const THUMBS_UP_OFFSET: f32 = 0.05;

/// Geometric thresholds used by the pose predicates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub touch_threshold: f32,
    pub thumb_curl_multiplier: f32,
    pub thumbs_up_offset: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            touch_threshold: TOUCH_THRESHOLD,
            thumb_curl_multiplier: THUMB_CURL_MULTIPLIER,
            thumbs_up_offset: THUMBS_UP_OFFSET,
        }
    }
}

impl From<&GestureConfig> for Thresholds {
    fn from(config: &GestureConfig) -> Self {
        Self {
            touch_threshold: config.touch_threshold,
            thumb_curl_multiplier: config.thumb_curl_multiplier,
            thumbs_up_offset: config.thumbs_up_offset,
        }
    }
}

/// Result of classifying one landmark set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    /// Finger states, `None` when the input could not be classified
    pub fingers: Option<HandState>,
    /// Letter matches indexed by [`Letter::index`]
    pub letters: [bool; 6],
    pub thumbs_up: bool,
}

impl Classification {
    /// Classification of absent or incomplete input
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.fingers.is_some()
    }

    pub fn matches(&self, pose: Pose) -> bool {
        match pose {
            Pose::Letter(letter) => self.letters[letter.index()],
            Pose::ThumbsUp => self.thumbs_up,
        }
    }

    pub fn matches_letter(&self, letter: Letter) -> bool {
        self.letters[letter.index()]
    }

    /// The "OK" control gesture uses the O predicate
    pub fn is_ok(&self) -> bool {
        self.matches_letter(Letter::O)
    }

    /// First matching letter in sequence order that `skip` does not exclude
    pub fn first_letter_where<F>(&self, mut skip: F) -> Option<Letter>
    where
        F: FnMut(Letter) -> bool,
    {
        Letter::SEQUENCE
            .iter()
            .copied()
            .find(|&letter| !skip(letter) && self.matches_letter(letter))
    }

    /// All matching poses, letters first in sequence order
    pub fn poses(&self) -> Vec<Pose> {
        let mut poses: Vec<Pose> = Letter::SEQUENCE
            .iter()
            .copied()
            .filter(|&letter| self.matches_letter(letter))
            .map(Pose::Letter)
            .collect();
        if self.thumbs_up {
            poses.push(Pose::ThumbsUp);
        }
        poses
    }
}

/// Classify a hand using the default thresholds
pub fn classify(landmarks: Option<&[Landmark]>) -> Classification {
    classify_with(landmarks, &Thresholds::default())
}

/// Classify a hand with explicit thresholds
pub fn classify_with(landmarks: Option<&[Landmark]>, thresholds: &Thresholds) -> Classification {
    let landmarks = match landmarks {
        Some(landmarks) if landmarks::is_complete(landmarks) => landmarks,
        _ => return Classification::none(),
    };

    let hand = HandState::from_landmarks(landmarks, thresholds);
    let mut letters = [false; 6];
    for letter in Letter::SEQUENCE {
        letters[letter.index()] = pose::matches_letter(letter, landmarks, &hand, thresholds);
    }

    Classification {
        fingers: Some(hand),
        letters,
        thumbs_up: pose::matches_thumbs_up(landmarks, thresholds),
    }
}

/// Single-pose check, convenient for gates that only care about one pose
pub fn check_pose(landmarks: Option<&[Landmark]>, pose: Pose, thresholds: &Thresholds) -> bool {
    classify_with(landmarks, thresholds).matches(pose)
}
