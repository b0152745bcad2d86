use crate::landmarks::{
    Landmark, INDEX_MCP, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, PINKY_MCP,
    PINKY_PIP, PINKY_TIP, RING_MCP, RING_PIP, RING_TIP, THUMB_MCP, THUMB_TIP,
};
use serde::{Deserialize, Serialize};

use super::Thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// (tip, pip, mcp) landmark indices; the thumb has no PIP joint
    fn joints(&self) -> (usize, Option<usize>, usize) {
        match self {
            Finger::Thumb => (THUMB_TIP, None, THUMB_MCP),
            Finger::Index => (INDEX_TIP, Some(INDEX_PIP), INDEX_MCP),
            Finger::Middle => (MIDDLE_TIP, Some(MIDDLE_PIP), MIDDLE_MCP),
            Finger::Ring => (RING_TIP, Some(RING_PIP), RING_MCP),
            Finger::Pinky => (PINKY_TIP, Some(PINKY_PIP), PINKY_MCP),
        }
    }
}

/// Extended/curled flags for one finger.
///
/// The two flags are computed independently. For the thumb the bands
/// overlap, so both may be true for the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FingerState {
    pub extended: bool,
    pub curled: bool,
}

/// Finger states for a whole hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HandState {
    pub thumb: FingerState,
    pub index: FingerState,
    pub middle: FingerState,
    pub ring: FingerState,
    pub pinky: FingerState,
}

impl HandState {
    /// Derive finger states from a complete landmark set (caller checks length)
    pub fn from_landmarks(landmarks: &[Landmark], thresholds: &Thresholds) -> Self {
        let state = |finger| FingerState {
            extended: is_extended(landmarks, finger),
            curled: is_curled(landmarks, finger, thresholds),
        };

        Self {
            thumb: state(Finger::Thumb),
            index: state(Finger::Index),
            middle: state(Finger::Middle),
            ring: state(Finger::Ring),
            pinky: state(Finger::Pinky),
        }
    }

    pub fn finger(&self, finger: Finger) -> FingerState {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }
}

/// Horizontal spread of the thumb: (tip to index MCP, thumb MCP to index MCP)
fn thumb_spread(landmarks: &[Landmark]) -> (f32, f32) {
    let tip = landmarks[THUMB_TIP];
    let base = landmarks[THUMB_MCP];
    let palm = landmarks[INDEX_MCP];
    ((tip.x - palm.x).abs(), (base.x - palm.x).abs())
}

/// Smaller y is higher on screen, so an extended finger points up
pub fn is_extended(landmarks: &[Landmark], finger: Finger) -> bool {
    match finger.joints() {
        (_, None, _) => {
            let (tip_spread, base_spread) = thumb_spread(landmarks);
            tip_spread > base_spread
        }
        (tip, Some(pip), mcp) => {
            let tip = landmarks[tip];
            tip.y < landmarks[pip].y && tip.y < landmarks[mcp].y
        }
    }
}

pub fn is_curled(landmarks: &[Landmark], finger: Finger, thresholds: &Thresholds) -> bool {
    match finger.joints() {
        (_, None, _) => {
            let (tip_spread, base_spread) = thumb_spread(landmarks);
            tip_spread < base_spread * thresholds.thumb_curl_multiplier
        }
        (tip, Some(pip), _) => landmarks[tip].y > landmarks[pip].y,
    }
}
