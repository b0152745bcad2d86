use crate::landmarks::{
    Landmark, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, THUMB_MCP, THUMB_TIP,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::geometry::HandState;
use super::Thresholds;

/// Target letters, in collection order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    I,
    L,
    O,
    V,
    E,
    U,
}

impl Letter {
    /// Collection order. Also the tie-break priority when one frame matches
    /// several uncollected letters.
    pub const SEQUENCE: [Letter; 6] = [
        Letter::I,
        Letter::L,
        Letter::O,
        Letter::V,
        Letter::E,
        Letter::U,
    ];

    /// Position in [`Letter::SEQUENCE`]
    pub fn index(&self) -> usize {
        match self {
            Letter::I => 0,
            Letter::L => 1,
            Letter::O => 2,
            Letter::V => 3,
            Letter::E => 4,
            Letter::U => 5,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Letter::I => 'I',
            Letter::L => 'L',
            Letter::O => 'O',
            Letter::V => 'V',
            Letter::E => 'E',
            Letter::U => 'U',
        }
    }

    /// How to form the letter with one hand
    pub fn hint(&self) -> &'static str {
        match self {
            Letter::I => "Point with your index finger",
            Letter::L => "Make an L shape (thumb + index)",
            Letter::O => "Make an O with thumb and index",
            Letter::V => "Peace sign (index + middle)",
            Letter::E => "Make a fist (hold tight)",
            Letter::U => "Rock sign (index + pinky)",
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(Letter::I),
            'L' => Some(Letter::L),
            'O' => Some(Letter::O),
            'V' => Some(Letter::V),
            'E' => Some(Letter::E),
            'U' => Some(Letter::U),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Letter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Letter::from_char(c).ok_or_else(|| format!("unknown letter: {}", s)),
            _ => Err(format!("expected a single letter, got: {}", s)),
        }
    }
}

/// Any pose the classifier can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pose {
    Letter(Letter),
    /// Thumb raised, index and middle folded. Only used to unlock the finale.
    ThumbsUp,
}

/// Letter predicates over finger states. `O` is decided by fingertip
/// distance instead and is handled in [`matches_letter`].
fn matches_finger_pattern(letter: Letter, hand: &HandState) -> bool {
    let (thumb, index, middle, ring, pinky) =
        (hand.thumb, hand.index, hand.middle, hand.ring, hand.pinky);

    match letter {
        Letter::I => {
            index.extended && middle.curled && ring.curled && pinky.curled && !thumb.extended
        }
        Letter::L => {
            thumb.extended && index.extended && middle.curled && ring.curled && pinky.curled
        }
        Letter::O => false,
        Letter::V => index.extended && middle.extended && ring.curled && pinky.curled,
        Letter::E => {
            index.curled && middle.curled && ring.curled && pinky.curled && !thumb.extended
        }
        Letter::U => index.extended && pinky.extended && middle.curled && ring.curled,
    }
}

pub(super) fn matches_letter(
    letter: Letter,
    landmarks: &[Landmark],
    hand: &HandState,
    thresholds: &Thresholds,
) -> bool {
    match letter {
        Letter::O => {
            landmarks[THUMB_TIP].distance(&landmarks[INDEX_TIP]) < thresholds.touch_threshold
        }
        other => matches_finger_pattern(other, hand),
    }
}

pub(super) fn matches_thumbs_up(landmarks: &[Landmark], thresholds: &Thresholds) -> bool {
    let thumb_up = landmarks[THUMB_TIP].y < landmarks[THUMB_MCP].y - thresholds.thumbs_up_offset;
    let index_folded = landmarks[INDEX_TIP].y > landmarks[INDEX_PIP].y;
    let middle_folded = landmarks[MIDDLE_TIP].y > landmarks[MIDDLE_PIP].y;
    thumb_up && index_folded && middle_folded
}
