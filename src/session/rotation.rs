use crate::config::SessionConfig;

/// Scene rotation gain per unit of normalized wrist movement
pub const ROTATION_GAIN: f32 = 5.0;
/// Fraction of the remaining distance covered per smoothing step
pub const ROTATION_SMOOTHING: f32 = 0.1;

/// Hand-driven rotation of the background scene.
///
/// Horizontal wrist movement between consecutive frames pushes the target
/// the opposite way. The rendered angle eases toward the target one
/// [`step`](SceneRotation::step) at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRotation {
    gain: f32,
    smoothing: f32,
    target: f32,
    current: f32,
    previous_x: Option<f32>,
}

impl Default for SceneRotation {
    fn default() -> Self {
        Self::new(ROTATION_GAIN, ROTATION_SMOOTHING)
    }
}

impl From<&SessionConfig> for SceneRotation {
    fn from(config: &SessionConfig) -> Self {
        Self::new(config.rotation_gain, config.rotation_smoothing)
    }
}

impl SceneRotation {
    pub fn new(gain: f32, smoothing: f32) -> Self {
        Self {
            gain,
            smoothing,
            target: 0.0,
            current: 0.0,
            previous_x: None,
        }
    }

    /// Track the wrist for one frame. Returns the new target when it moved.
    ///
    /// While `paused` the wrist is still tracked so resuming does not jump.
    pub fn track(&mut self, wrist_x: Option<f32>, paused: bool) -> Option<f32> {
        let Some(x) = wrist_x else {
            self.previous_x = None;
            return None;
        };

        let moved = match self.previous_x {
            Some(previous) if !paused => {
                let dx = x - previous;
                if dx != 0.0 {
                    self.target -= dx * self.gain;
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        self.previous_x = Some(x);

        moved.then_some(self.target)
    }

    /// Ease the rendered angle toward the target
    pub fn step(&mut self) -> f32 {
        self.current += (self.target - self.current) * self.smoothing;
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn current(&self) -> f32 {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_first_frame_only_records_position() {
        let mut rotation = SceneRotation::default();
        assert_eq!(rotation.track(Some(0.5), false), None);
        assert_eq!(rotation.target(), 0.0);
    }

    #[test]
    fn test_moving_right_rotates_negative() {
        let mut rotation = SceneRotation::default();
        rotation.track(Some(0.5), false);
        let target = rotation.track(Some(0.6), false).unwrap();
        assert!(approx(target, -0.5));
    }

    #[test]
    fn test_lost_hand_forgets_position() {
        let mut rotation = SceneRotation::default();
        rotation.track(Some(0.2), false);
        rotation.track(None, false);
        assert_eq!(rotation.track(Some(0.9), false), None);
        assert_eq!(rotation.target(), 0.0);
    }

    #[test]
    fn test_paused_tracks_without_rotating() {
        let mut rotation = SceneRotation::default();
        rotation.track(Some(0.2), false);
        assert_eq!(rotation.track(Some(0.4), true), None);
        assert_eq!(rotation.target(), 0.0);
        // Resuming measures from the paused position, not the old one
        let target = rotation.track(Some(0.5), false).unwrap();
        assert!(approx(target, -0.5));
    }

    #[test]
    fn test_smoothing_converges() {
        let mut rotation = SceneRotation::default();
        rotation.track(Some(0.0), false);
        rotation.track(Some(0.2), false);
        assert!(approx(rotation.step(), -0.1));
        for _ in 0..200 {
            rotation.step();
        }
        assert!(approx(rotation.current(), -1.0));
    }
}
