//! Slice and punch scoring.
//!
//! A slice is scored from its entry and exit on the hit plane:
//!
//! ```text
//!            min.x                      max.x
//!   max.y  ┌──────────────────────────────┐
//!          │                              │
//!  entry ──●──────────── direction ──────▶●── exit
//!          │               ┆ dist         │
//!          │               ✕ center       │
//!   min.y  └──────────────────────────────┘
//! ```
//!
//! | Factor | Metric | Gate |
//! |---|---|---|
//! | slice ratio | `direction.x / reference width` | `min_slice_ratio` |
//! | angle | `normalize(direction) · +X` | `min_angle_dot` |
//! | accuracy | center-to-line distance / box height | none |
//! | speed | `|direction| / duration` in m/s | none |

use crate::tuning::{PunchScoring, SliceScoring};
use crate::types::{
    BadHitReason, HitOutcome, ScoreBreakdown, SliceMetrics, SubScores, TargetBox, Vec2,
};

/// Linear remap of `value` from `[low1, high1]` to `[low2, high2]`.
pub fn remap(value: f64, low1: f64, high1: f64, low2: f64, high2: f64) -> f64 {
    low2 + (high2 - low2) * (value - low1) / (high1 - low1)
}

/// Clamps `value` into the span of `from`/`to` (either order), then remaps it
/// so `from` maps to `low` and `to` maps to `high`.
pub fn clamp_and_remap(value: f64, from: f64, to: f64, low: f64, high: f64) -> f64 {
    let clamped = value.clamp(from.min(to), from.max(to));
    remap(clamped, from, to, low, high)
}

/// Rounds to three decimals.
pub fn round_3dec(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Scores slices against one target footprint.
#[derive(Debug, Clone, Copy)]
pub struct SliceScorer {
    pub scoring: SliceScoring,
    /// Sensing footprint, already scaled for leniency
    pub bounds: TargetBox,
    /// Unscaled footprint width the slice ratio is measured against
    pub reference_width: f64,
}

impl SliceScorer {
    pub fn new(scoring: SliceScoring, bounds: TargetBox, reference_width: f64) -> Self {
        Self {
            scoring,
            bounds,
            reference_width,
        }
    }

    /// Outcome awarded to a dot target on any touch.
    pub fn full_score(&self) -> HitOutcome {
        HitOutcome::Good(ScoreBreakdown {
            score: self.scoring.max_score,
            percent: 100.0,
            ..ScoreBreakdown::default()
        })
    }

    /// Validate a slice and compute its score.
    ///
    /// Times are in milliseconds. Failing a gate, or geometry that collapses
    /// to a point or an instant, yields a bad outcome.
    pub fn validate_slice(
        &self,
        entry: Vec2,
        entry_time: f64,
        exit: Vec2,
        exit_time: f64,
    ) -> HitOutcome {
        let s = &self.scoring;
        let direction = exit - entry;

        let slice_ratio = direction.x / self.reference_width;
        if !slice_ratio.is_finite() {
            log::warn!("non-finite slice ratio from entry {:?} exit {:?}", entry, exit);
            return HitOutcome::bad(BadHitReason::Degenerate);
        }
        if slice_ratio < s.min_slice_ratio {
            return HitOutcome::bad(BadHitReason::BadSliceRatio);
        }

        let duration = exit_time - entry_time;
        let slash_speed = direction.magnitude() / duration * 1000.0;
        let Some(unit) = direction.normalized() else {
            log::warn!("zero-length slice direction at {:?}", entry);
            return HitOutcome::bad(BadHitReason::Degenerate);
        };
        if !(duration > 0.0) || !slash_speed.is_finite() {
            log::warn!("slice with non-positive duration {} ms", duration);
            return HitOutcome::bad(BadHitReason::Degenerate);
        }

        let angle_dot = unit.dot(&Vec2::CUT_AXIS);
        if angle_dot < s.min_angle_dot {
            return HitOutcome::bad(BadHitReason::BadAngle);
        }

        let dist_from_center =
            self.bounds.center().distance_to_line(&entry, &exit) / self.bounds.height();
        if !dist_from_center.is_finite() {
            return HitOutcome::bad(BadHitReason::Degenerate);
        }

        let sub_scores = SubScores {
            slice_ratio: s.slice_ratio.award(slice_ratio),
            angle: s.angle.award(angle_dot),
            accuracy: s.accuracy.award(dist_from_center),
            speed: s.speed.award(slash_speed),
        };
        let total = s.base_score
            + sub_scores.slice_ratio
            + sub_scores.angle
            + sub_scores.accuracy
            + sub_scores.speed;
        let capped = total.min(s.max_score);

        HitOutcome::Good(ScoreBreakdown {
            score: round_3dec(capped),
            percent: round_3dec(capped / s.max_score * 100.0),
            sub_scores: SubScores {
                slice_ratio: round_3dec(sub_scores.slice_ratio),
                angle: round_3dec(sub_scores.angle),
                accuracy: round_3dec(sub_scores.accuracy),
                speed: round_3dec(sub_scores.speed),
            },
            metrics: SliceMetrics {
                slice_ratio: round_3dec(slice_ratio),
                angle_dot: round_3dec(angle_dot),
                dist_from_center: round_3dec(dist_from_center),
                slash_speed: round_3dec(slash_speed),
            },
        })
    }
}

/// Score a punch from the fist's speed in m/s.
///
/// Up to `super_speed` the speed term grows linearly to `slow_points`; beyond
/// it the term climbs from `slow_points` to `fast_points` at `max_speed`.
pub fn score_punch(scoring: &PunchScoring, speed: f64) -> ScoreBreakdown {
    let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
    let speed_score = if speed <= scoring.super_speed {
        (speed / scoring.super_speed * scoring.slow_points).min(scoring.slow_points)
    } else {
        clamp_and_remap(
            speed,
            scoring.super_speed,
            scoring.max_speed,
            scoring.slow_points,
            scoring.fast_points,
        )
    };
    let score = scoring.base_score + speed_score;
    ScoreBreakdown {
        score: round_3dec(score),
        percent: round_3dec(score / scoring.max_score() * 100.0),
        sub_scores: SubScores {
            speed: round_3dec(speed_score),
            ..SubScores::default()
        },
        metrics: SliceMetrics {
            slash_speed: round_3dec(speed),
            ..SliceMetrics::default()
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
