use crate::classifier::Letter;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Pose a hold timer can track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldTarget {
    Letter(Letter),
    /// OK sign gating the intro and instruction screens
    Ok,
    /// Finale unlock
    ThumbsUp,
}

impl HoldTarget {
    pub fn label(&self) -> String {
        match self {
            HoldTarget::Letter(letter) => letter.to_string(),
            HoldTarget::Ok => "OK".to_string(),
            HoldTarget::ThumbsUp => "thumbs_up".to_string(),
        }
    }
}

impl fmt::Display for HoldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Result of feeding one frame to a [`HoldTimer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldStatus {
    /// Nothing is being held
    Idle,
    /// `target` has been held continuously; `progress` is in `[0, 1]`
    Holding { target: HoldTarget, progress: f32 },
    /// `target` was held for the full duration. The timer has already reset.
    Confirmed { target: HoldTarget },
}

/// Hold-to-confirm debouncer.
///
/// A pose must stay present on every frame for the whole duration. Losing
/// it for one frame, or switching to another target, starts over from zero.
#[derive(Debug, Clone, Default)]
pub struct HoldTimer {
    active: Option<ActiveHold>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveHold {
    target: HoldTarget,
    started_ms: u64,
    progress: f32,
}

impl HoldTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame's detection.
    pub fn update(
        &mut self,
        detected: Option<HoldTarget>,
        now_ms: u64,
        duration_ms: u64,
    ) -> HoldStatus {
        let Some(target) = detected else {
            self.reset();
            return HoldStatus::Idle;
        };

        let hold = match self.active {
            Some(hold) if hold.target == target => hold,
            _ => {
                debug!("Hold started for {} at {}ms", target, now_ms);
                ActiveHold {
                    target,
                    started_ms: now_ms,
                    progress: 0.0,
                }
            }
        };

        let elapsed = now_ms.saturating_sub(hold.started_ms);
        if elapsed >= duration_ms {
            debug!("Hold confirmed for {} after {}ms", target, elapsed);
            self.active = None;
            return HoldStatus::Confirmed { target };
        }

        let progress = (elapsed as f32 / duration_ms as f32)
            .clamp(0.0, 1.0)
            .max(hold.progress);
        self.active = Some(ActiveHold { progress, ..hold });
        HoldStatus::Holding { target, progress }
    }

    /// Drop any hold in progress, returning the target that was being held
    pub fn reset(&mut self) -> Option<HoldTarget> {
        self.active.take().map(|hold| hold.target)
    }

    pub fn target(&self) -> Option<HoldTarget> {
        self.active.map(|hold| hold.target)
    }

    pub fn progress(&self) -> f32 {
        self.active.map(|hold| hold.progress).unwrap_or(0.0)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: u64 = 33;

    fn letter(l: Letter) -> Option<HoldTarget> {
        Some(HoldTarget::Letter(l))
    }

    #[test]
    fn test_confirms_once_at_threshold() {
        let mut timer = HoldTimer::new();
        let mut confirmations = Vec::new();

        for frame in 0..=300u64 {
            let now = frame * 10;
            if let HoldStatus::Confirmed { target } = timer.update(letter(Letter::I), now, 3000) {
                confirmations.push((frame, target));
            }
        }

        assert_eq!(confirmations, vec![(300, HoldTarget::Letter(Letter::I))]);
        assert!(!timer.is_active());

        // Holding on restarts from zero rather than confirming again
        for frame in 301..400u64 {
            let status = timer.update(letter(Letter::I), frame * 10, 3000);
            assert!(
                !matches!(status, HoldStatus::Confirmed { .. }),
                "second confirmation at frame {}",
                frame
            );
        }
        assert!(timer.is_active());
    }

    #[test]
    fn test_never_confirms_before_threshold() {
        let mut timer = HoldTimer::new();
        timer.update(letter(Letter::V), 1000, 3000);
        match timer.update(letter(Letter::V), 3999, 3000) {
            HoldStatus::Holding { progress, .. } => assert!(progress < 1.0),
            other => panic!("Unexpected status: {:?}", other),
        }
        assert_eq!(
            timer.update(letter(Letter::V), 4000, 3000),
            HoldStatus::Confirmed {
                target: HoldTarget::Letter(Letter::V)
            }
        );
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut timer = HoldTimer::new();
        let mut last = -1.0f32;
        for frame in 0..90u64 {
            match timer.update(Some(HoldTarget::Ok), frame * FRAME_MS, 5000) {
                HoldStatus::Holding { progress, .. } => {
                    assert!((0.0..=1.0).contains(&progress));
                    assert!(progress >= last);
                    last = progress;
                }
                other => panic!("Unexpected status: {:?}", other),
            }
        }
    }

    #[test]
    fn test_single_gap_restarts_from_zero() {
        let mut timer = HoldTimer::new();
        timer.update(letter(Letter::E), 0, 3000);
        timer.update(letter(Letter::E), 2900, 3000);
        assert_eq!(timer.update(None, 2933, 3000), HoldStatus::Idle);

        match timer.update(letter(Letter::E), 2966, 3000) {
            HoldStatus::Holding { progress, .. } => assert_eq!(progress, 0.0),
            other => panic!("Unexpected status: {:?}", other),
        }
        // The first start is forgotten: 3000ms after it is not enough
        assert!(matches!(
            timer.update(letter(Letter::E), 3000, 3000),
            HoldStatus::Holding { .. }
        ));
    }

    #[test]
    fn test_switching_target_restarts() {
        let mut timer = HoldTimer::new();
        timer.update(letter(Letter::I), 0, 3000);
        timer.update(letter(Letter::I), 2500, 3000);

        match timer.update(letter(Letter::L), 2600, 3000) {
            HoldStatus::Holding { target, progress } => {
                assert_eq!(target, HoldTarget::Letter(Letter::L));
                assert_eq!(progress, 0.0);
            }
            other => panic!("Unexpected status: {:?}", other),
        }
        assert_eq!(timer.target(), Some(HoldTarget::Letter(Letter::L)));
        assert!(matches!(
            timer.update(letter(Letter::L), 5599, 3000),
            HoldStatus::Holding { .. }
        ));
        assert!(matches!(
            timer.update(letter(Letter::L), 5600, 3000),
            HoldStatus::Confirmed { .. }
        ));
    }

    #[test]
    fn test_clock_going_backwards_does_not_underflow() {
        let mut timer = HoldTimer::new();
        timer.update(Some(HoldTarget::ThumbsUp), 5000, 3000);
        match timer.update(Some(HoldTarget::ThumbsUp), 4000, 3000) {
            HoldStatus::Holding { progress, .. } => assert_eq!(progress, 0.0),
            other => panic!("Unexpected status: {:?}", other),
        }
    }

    #[test]
    fn test_reset_reports_target() {
        let mut timer = HoldTimer::new();
        assert_eq!(timer.reset(), None);
        timer.update(Some(HoldTarget::Ok), 0, 5000);
        assert_eq!(timer.reset(), Some(HoldTarget::Ok));
        assert_eq!(timer.progress(), 0.0);
    }
}
