//! Swing state machine.
//!
//! ```text
//!                 reaching                 left-edge entry
//!  NotReaching ───────────▶ Reaching ──────────────────────▶ InsideBox
//!       │  ◀─────────────── │   │                              │
//!       │    not reaching   │   │ front/top/bottom entry       │ exit
//!       │                   │   ▼                              ▼
//!       └── inside ───────────▶ Hit ◀──────────────────────────┘
//! ```
//!
//! Wrong targets and dots resolve on first contact from either pre-entry
//! state. Only arrows on a correct implement go through `InsideBox`.

use crate::detection::containment::ContainmentProbe;
use crate::scoring::SliceScorer;
use crate::types::{BadHitReason, BladeSample, HitOutcome, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwingState {
    NotReaching,
    /// The blade pierces the hit plane outside the footprint.
    Reaching,
    InsideBox {
        entry: Vec2,
        entry_time: f64,
    },
    /// Terminal until reset.
    Hit,
}

impl SwingState {
    pub fn name(&self) -> &'static str {
        match self {
            SwingState::NotReaching => "not_reaching",
            SwingState::Reaching => "reaching",
            SwingState::InsideBox { .. } => "inside_box",
            SwingState::Hit => "hit",
        }
    }
}

/// How a target relates to the implement being tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRole {
    /// This implement is the one that should hit the target.
    pub is_good: bool,
    pub is_dot: bool,
}

/// Drives `SwingState` from a stream of samples.
#[derive(Debug, Clone)]
pub struct SwingMachine {
    state: SwingState,
    last_time: Option<f64>,
}

impl Default for SwingMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SwingMachine {
    pub fn new() -> Self {
        Self {
            state: SwingState::NotReaching,
            last_time: None,
        }
    }

    pub fn state(&self) -> SwingState {
        self.state
    }

    pub fn is_hit(&self) -> bool {
        self.state == SwingState::Hit
    }

    /// Feed one sample. Returns the outcome when this sample ends the swing.
    pub fn advance(
        &mut self,
        sample: &BladeSample,
        probe: &mut ContainmentProbe,
        role: TargetRole,
        scorer: &SliceScorer,
    ) -> Option<HitOutcome> {
        let time = sample.time;
        let pair_time = match self.last_time {
            Some(last) => (time + last) * 0.5,
            None => time,
        };

        let (next, outcome) = match self.state {
            SwingState::NotReaching => {
                if probe.test(sample) {
                    match Self::first_contact(role, scorer) {
                        Some(outcome) => (SwingState::Hit, Some(outcome)),
                        None => (
                            SwingState::InsideBox {
                                entry: probe.intersection(),
                                entry_time: pair_time,
                            },
                            None,
                        ),
                    }
                } else if probe.reaching() {
                    (SwingState::Reaching, None)
                } else {
                    (SwingState::NotReaching, None)
                }
            }
            SwingState::Reaching => {
                if probe.test(sample) {
                    match Self::first_contact(role, scorer) {
                        Some(outcome) => (SwingState::Hit, Some(outcome)),
                        None => match probe.left_edge_crossing() {
                            Some(y) => (
                                SwingState::InsideBox {
                                    entry: Vec2::new(probe.bounds().min.x, y),
                                    entry_time: pair_time,
                                },
                                None,
                            ),
                            None => (
                                SwingState::Hit,
                                Some(HitOutcome::bad(BadHitReason::BadEntry)),
                            ),
                        },
                    }
                } else if !probe.reaching() {
                    (SwingState::NotReaching, None)
                } else {
                    (SwingState::Reaching, None)
                }
            }
            SwingState::InsideBox { entry, entry_time } => {
                if probe.test(sample) {
                    (self.state, None)
                } else {
                    let mut exit = probe.intersection().midpoint(&probe.last_intersection());
                    if let Some(furthest) = probe.furthest() {
                        if exit.x < furthest.x {
                            exit = furthest;
                        }
                    }
                    let outcome = scorer.validate_slice(entry, entry_time, exit, pair_time);
                    (SwingState::Hit, Some(outcome))
                }
            }
            SwingState::Hit => (SwingState::Hit, None),
        };

        if next != self.state {
            log::trace!("swing {} -> {} at {:.3} ms", self.state.name(), next.name(), time);
        }
        self.state = next;
        self.last_time = Some(time);
        outcome
    }

    /// Wrong targets and dots resolve on any contact.
    fn first_contact(role: TargetRole, scorer: &SliceScorer) -> Option<HitOutcome> {
        if !role.is_good {
            Some(HitOutcome::bad(BadHitReason::WrongTarget))
        } else if role.is_dot {
            Some(scorer.full_score())
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.state = SwingState::NotReaching;
        self.last_time = None;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::{Leniency, SliceScoring};
    use crate::types::{HitPlane, TargetBox, Vec3};

    const FRAME: f64 = 1000.0 / 90.0;

    struct Rig {
        probe: ContainmentProbe,
        scorer: SliceScorer,
        machine: SwingMachine,
        role: TargetRole,
    }

    impl Rig {
        fn new(is_good: bool, is_dot: bool) -> Self {
            let base = TargetBox::new(Vec2::new(-0.25, -0.25), Vec2::new(0.25, 0.25));
            let leniency = if is_good { Leniency::good() } else { Leniency::bad() };
            let bounds = base.scaled(leniency.box_scaling);
            Self {
                probe: ContainmentProbe::new(bounds, HitPlane::new(0.25), &leniency),
                scorer: SliceScorer::new(SliceScoring::default(), bounds, base.width()),
                machine: SwingMachine::new(),
                role: TargetRole { is_good, is_dot },
            }
        }

        /// Feed blades pointing straight through the plane at each (x, y).
        fn feed(&mut self, points: &[(f64, f64)]) -> Option<HitOutcome> {
            for (i, &(x, y)) in points.iter().enumerate() {
                let sample =
                    BladeSample::new(Vec3::new(x, y, -0.2), Vec3::new(x, y, 0.6), i as f64 * FRAME);
                if let Some(outcome) =
                    self.machine
                        .advance(&sample, &mut self.probe, self.role, &self.scorer)
                {
                    return Some(outcome);
                }
            }
            None
        }
    }

    fn sweep(from: f64, to: f64, y: f64, steps: usize) -> Vec<(f64, f64)> {
        (0..=steps)
            .map(|i| (from + (to - from) * i as f64 / steps as f64, y))
            .collect()
    }

    #[test]
    fn test_starts_not_reaching() {
        let rig = Rig::new(true, false);
        assert_eq!(rig.machine.state(), SwingState::NotReaching);
    }

    #[test]
    fn test_reaching_then_withdraw() {
        let mut rig = Rig::new(true, false);
        assert!(rig.feed(&[(-1.0, 0.0)]).is_none());
        assert_eq!(rig.machine.state(), SwingState::Reaching);

        let away = BladeSample::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.5), 100.0);
        rig.machine
            .advance(&away, &mut rig.probe, rig.role, &rig.scorer);
        assert_eq!(rig.machine.state(), SwingState::NotReaching);
    }

    #[test]
    fn test_clean_left_to_right_slice() {
        let mut rig = Rig::new(true, false);
        let outcome = rig.feed(&sweep(-0.95, 0.95, 0.0, 19)).unwrap();
        assert!(outcome.is_good(), "got {:?}", outcome);
        assert!(rig.machine.is_hit());

        let score = outcome.score().unwrap();
        assert_eq!(score.metrics.angle_dot, 1.0);
        assert!(score.metrics.slice_ratio >= 1.0);
    }

    #[test]
    fn test_entry_point_is_on_left_edge() {
        let mut rig = Rig::new(true, false);
        rig.feed(&[(-0.5, 0.1), (-0.2, 0.1)]);
        match rig.machine.state() {
            SwingState::InsideBox { entry, entry_time } => {
                assert!((entry.x - (-0.3)).abs() < 1e-10);
                assert!((entry.y - 0.1).abs() < 1e-10);
                assert!((entry_time - FRAME * 0.5).abs() < 1e-10);
            }
            other => panic!("expected InsideBox, got {:?}", other),
        }
    }

    #[test]
    fn test_corner_entry_below_footprint_is_bad_entry() {
        let mut rig = Rig::new(true, false);
        // Crosses x = -0.3 at y ~ -0.34, under the footprint
        let outcome = rig.feed(&[(-0.8, -0.9), (0.0, 0.0)]).unwrap();
        assert_eq!(outcome.reason(), Some(BadHitReason::BadEntry));
    }

    #[test]
    fn test_top_entry_is_bad_entry() {
        let mut rig = Rig::new(true, false);
        let outcome = rig.feed(&[(0.0, 0.8), (0.0, 0.5), (0.0, 0.2)]).unwrap();
        assert_eq!(outcome.reason(), Some(BadHitReason::BadEntry));
    }

    #[test]
    fn test_right_to_left_is_bad_entry() {
        let mut rig = Rig::new(true, false);
        let outcome = rig.feed(&sweep(0.95, -0.95, 0.0, 19)).unwrap();
        assert_eq!(outcome.reason(), Some(BadHitReason::BadEntry));
    }

    #[test]
    fn test_direct_appearance_inside_records_entry() {
        let mut rig = Rig::new(true, false);
        assert!(rig.feed(&[(-0.1, 0.0)]).is_none());
        assert!(matches!(rig.machine.state(), SwingState::InsideBox { .. }));
    }

    #[test]
    fn test_wrong_target_any_entry() {
        for points in [
            sweep(-0.95, 0.95, 0.0, 19),
            sweep(0.95, -0.95, 0.0, 19),
            vec![(0.0, 0.8), (0.0, 0.0)],
            vec![(0.0, 0.0)],
        ] {
            let mut rig = Rig::new(false, false);
            let outcome = rig.feed(&points).unwrap();
            assert_eq!(outcome.reason(), Some(BadHitReason::WrongTarget));
        }
    }

    #[test]
    fn test_dot_touch_is_full_score() {
        let mut rig = Rig::new(true, true);
        let outcome = rig.feed(&[(0.0, 0.8), (0.0, 0.1)]).unwrap();
        let score = outcome.score().unwrap();
        assert_eq!(score.score, SliceScoring::default().max_score);
        assert_eq!(score.percent, 100.0);
    }

    #[test]
    fn test_short_slice_is_bad_ratio() {
        let mut rig = Rig::new(true, false);
        // Enter at the left edge, retreat back out the way it came
        let outcome = rig
            .feed(&[(-0.5, 0.0), (-0.25, 0.0), (-0.5, 0.0)])
            .unwrap();
        assert_eq!(outcome.reason(), Some(BadHitReason::BadSliceRatio));
    }

    #[test]
    fn test_overshoot_uses_furthest_point() {
        let mut rig = Rig::new(true, false);
        // Inside up to x=0.25, then the blade swings back and exits to the left
        let outcome = rig
            .feed(&[(-0.5, 0.0), (-0.2, 0.0), (0.25, 0.0), (0.0, 0.0), (-0.5, 0.0)])
            .unwrap();
        let score = outcome.score().unwrap();
        // Exit snapped to x=0.25: ratio (0.25 + 0.3) / 0.5
        assert!((score.metrics.slice_ratio - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_hit_is_terminal() {
        let mut rig = Rig::new(false, false);
        assert!(rig.feed(&[(0.0, 0.0)]).is_some());
        assert!(rig.feed(&sweep(-0.95, 0.95, 0.0, 19)).is_none());
        assert!(rig.machine.is_hit());
    }

    #[test]
    fn test_reset_returns_to_not_reaching() {
        let mut rig = Rig::new(false, false);
        rig.feed(&[(0.0, 0.0)]);
        rig.machine.reset();
        rig.probe.reset();
        assert_eq!(rig.machine.state(), SwingState::NotReaching);
        assert!(rig.feed(&[(0.0, 0.0)]).is_some());
    }
}
