//! Synthetic hand landmark sets for canonical poses.
//!
//! Used by the test suites and by the scripted `demo` session. Each preset
//! matches exactly one pose under the default thresholds, except
//! [`tie_break_hand`] which deliberately matches two.

use crate::classifier::{Finger, Letter, Pose};
use crate::landmarks::{
    Landmark, INDEX_MCP, INDEX_TIP, LANDMARK_COUNT, MIDDLE_MCP, PINKY_MCP, RING_MCP, THUMB_CMC,
    THUMB_IP, THUMB_MCP, THUMB_TIP, WRIST,
};

/// Where the thumb tip sits relative to the palm
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThumbPosition {
    /// Folded across the palm below the fingers
    Tucked,
    /// Spread sideways away from the palm
    Out,
    /// Raised above its base joint and spread sideways
    Up,
    /// Tip pressed against the index fingertip
    TouchingIndex,
}

/// Builder for a right hand facing the camera
#[derive(Debug, Clone)]
pub struct HandBuilder {
    thumb: ThumbPosition,
    extended: [bool; 4],
    index_hooked: bool,
    offset: (f32, f32),
}

impl Default for HandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HandBuilder {
    /// Closed fist with the thumb tucked
    pub fn new() -> Self {
        Self {
            thumb: ThumbPosition::Tucked,
            extended: [false; 4],
            index_hooked: false,
            offset: (0.0, 0.0),
        }
    }

    pub fn thumb(mut self, thumb: ThumbPosition) -> Self {
        self.thumb = thumb;
        self
    }

    /// Extend a finger upwards (the thumb is positioned with [`HandBuilder::thumb`])
    pub fn extend(mut self, finger: Finger) -> Self {
        if let Some(slot) = Self::slot(finger) {
            self.extended[slot] = true;
        }
        self
    }

    /// Bend the index finger into a hook so its tip curls down towards the thumb
    pub fn hook_index(mut self) -> Self {
        self.index_hooked = true;
        self
    }

    /// Shift the whole hand in image space
    pub fn shifted(mut self, dx: f32, dy: f32) -> Self {
        self.offset = (dx, dy);
        self
    }

    fn slot(finger: Finger) -> Option<usize> {
        match finger {
            Finger::Thumb => None,
            Finger::Index => Some(0),
            Finger::Middle => Some(1),
            Finger::Ring => Some(2),
            Finger::Pinky => Some(3),
        }
    }

    pub fn build(&self) -> Vec<Landmark> {
        let mut points = vec![Landmark::default(); LANDMARK_COUNT];
        points[WRIST] = Landmark::flat(0.50, 0.90);

        // (mcp index, x, mcp y)
        let fingers = [
            (INDEX_MCP, 0.45, 0.65),
            (MIDDLE_MCP, 0.50, 0.63),
            (RING_MCP, 0.55, 0.65),
            (PINKY_MCP, 0.60, 0.68),
        ];

        for (slot, &(mcp, x, y)) in fingers.iter().enumerate() {
            let (pip, dip, tip) = if self.extended[slot] {
                (y - 0.08, y - 0.14, y - 0.20)
            } else {
                (y - 0.05, y - 0.02, y + 0.02)
            };
            points[mcp] = Landmark::flat(x, y);
            points[mcp + 1] = Landmark::flat(x, pip);
            points[mcp + 2] = Landmark::flat(x, dip);
            points[mcp + 3] = Landmark::flat(x, tip);
        }

        if self.index_hooked {
            points[INDEX_MCP + 1] = Landmark::flat(0.44, 0.55);
            points[INDEX_MCP + 2] = Landmark::flat(0.42, 0.55);
            points[INDEX_TIP] = Landmark::flat(0.40, 0.60);
        }

        points[THUMB_CMC] = Landmark::flat(0.44, 0.85);
        points[THUMB_MCP] = Landmark::flat(0.38, 0.78);
        let (ip, tip) = match self.thumb {
            ThumbPosition::Tucked => (Landmark::flat(0.42, 0.79), Landmark::flat(0.47, 0.80)),
            ThumbPosition::Out => (Landmark::flat(0.31, 0.74), Landmark::flat(0.25, 0.70)),
            ThumbPosition::Up => (Landmark::flat(0.33, 0.65), Landmark::flat(0.30, 0.55)),
            ThumbPosition::TouchingIndex => {
                let index_tip = points[INDEX_TIP];
                (Landmark::flat(0.40, 0.70), index_tip)
            }
        };
        points[THUMB_IP] = ip;
        points[THUMB_TIP] = tip;

        let (dx, dy) = self.offset;
        for point in points.iter_mut() {
            point.x += dx;
            point.y += dy;
        }
        points
    }
}

/// Canonical landmarks for a letter pose
pub fn letter_hand(letter: Letter) -> Vec<Landmark> {
    let builder = HandBuilder::new();
    match letter {
        Letter::I => builder.extend(Finger::Index),
        Letter::L => builder.thumb(ThumbPosition::Out).extend(Finger::Index),
        Letter::O => builder
            .hook_index()
            .thumb(ThumbPosition::TouchingIndex)
            .extend(Finger::Middle)
            .extend(Finger::Ring)
            .extend(Finger::Pinky),
        Letter::V => builder.extend(Finger::Index).extend(Finger::Middle),
        Letter::E => builder,
        Letter::U => builder.extend(Finger::Index).extend(Finger::Pinky),
    }
    .build()
}

/// Thumb raised with the other fingers folded
pub fn thumbs_up_hand() -> Vec<Landmark> {
    HandBuilder::new().thumb(ThumbPosition::Up).build()
}

/// Flat open hand that matches no pose
pub fn open_hand() -> Vec<Landmark> {
    HandBuilder::new()
        .thumb(ThumbPosition::Out)
        .extend(Finger::Index)
        .extend(Finger::Middle)
        .extend(Finger::Ring)
        .extend(Finger::Pinky)
        .build()
}

/// Pointing index with the thumb pressed to its tip: matches both I and O
pub fn tie_break_hand() -> Vec<Landmark> {
    HandBuilder::new()
        .extend(Finger::Index)
        .thumb(ThumbPosition::TouchingIndex)
        .build()
}

/// Canonical landmarks for any pose
pub fn pose_hand(pose: Pose) -> Vec<Landmark> {
    match pose {
        Pose::Letter(letter) => letter_hand(letter),
        Pose::ThumbsUp => thumbs_up_hand(),
    }
}
