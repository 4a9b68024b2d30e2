//! Punch mode: one-shot collision against a tracked fist.

use crate::detection::HitDetector;
use crate::scoring::score_punch;
use crate::tuning::{PunchScoring, Tuning};
use crate::types::{HitOutcome, Target};

/// A fist or other blunt implement.
///
/// The collision primitive is owned by the tracking layer; detection only
/// asks whether it currently overlaps the target.
pub trait PunchImplement {
    fn check_collision(&self, target: &Target) -> bool;

    /// Current speed in m/s.
    fn speed(&self) -> f64;
}

/// Detects a punch on one target. Any contact counts; only the speed is scored.
///
/// A wrong-hand punch still scores as a good hit. Whether to penalize it is
/// a game rule: `is_good` is carried to `HitEvent::correct_hand` for callers.
#[derive(Debug, Clone)]
pub struct PunchHitDetector {
    scoring: PunchScoring,
    is_good: bool,
    outcome: Option<HitOutcome>,
}

impl HitDetector for PunchHitDetector {
    type Implement = dyn PunchImplement;

    fn new(_target: &Target, is_good: bool, tuning: &Tuning) -> Self {
        Self {
            scoring: tuning.punch,
            is_good,
            outcome: None,
        }
    }

    fn is_hit(&mut self, _time: f64, fist: &Self::Implement, target: &Target) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        if !fist.check_collision(target) {
            return false;
        }
        let score = score_punch(&self.scoring, fist.speed());
        log::debug!(
            "{} target punched at {:.3} m/s for {}",
            target.kind,
            score.metrics.slash_speed,
            score.score
        );
        self.outcome = Some(HitOutcome::Good(score));
        true
    }

    fn outcome(&self) -> Option<&HitOutcome> {
        self.outcome.as_ref()
    }

    fn is_good(&self) -> bool {
        self.is_good
    }

    fn reset(&mut self) {
        self.outcome = None;
    }

    fn retarget(&mut self, _target: &Target, is_good: bool) {
        self.is_good = is_good;
        self.outcome = None;
    }
}

// =============================================================================
// Tests
// =============================================================================
