use serde::{Deserialize, Serialize};

/// Number of landmarks in a tracked hand skeleton
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// One tracked point on the hand skeleton.
///
/// `x` and `y` are normalized image coordinates in `[0, 1]` with `y` growing
/// downwards, `z` is relative depth and defaults to zero when the tracker
/// does not report it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Landmark on the image plane with zero depth
    pub fn flat(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance over (x, y, z)
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Hand observations for a single camera frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Timestamp of the observation in clock milliseconds
    #[serde(default)]
    pub timestamp_ms: u64,
    /// Detected hands, each an ordered landmark set; empty when no hand is visible
    #[serde(default)]
    pub hands: Vec<Vec<Landmark>>,
}

impl LandmarkFrame {
    /// Frame carrying a single detected hand
    pub fn with_hand(timestamp_ms: u64, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms,
            hands: vec![landmarks],
        }
    }

    /// Frame in which the tracker found no hand
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            hands: Vec::new(),
        }
    }

    /// The hand used for gameplay (the tracker runs with one hand)
    pub fn primary_hand(&self) -> Option<&[Landmark]> {
        self.hands.first().map(|hand| hand.as_slice())
    }

    pub fn has_hand(&self) -> bool {
        !self.hands.is_empty()
    }
}

/// Check that a landmark set is complete enough to classify
pub fn is_complete(landmarks: &[Landmark]) -> bool {
    landmarks.len() >= LANDMARK_COUNT
}
