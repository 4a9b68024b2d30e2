//! End-to-end swings through the public detector API.

use slice_core::detection::{BladeHitDetector, HitDetector, SwingState};
use slice_core::tuning::TuningLoader;
use slice_core::{
    Aabb, BadHitReason, BladePose, Hand, HitOutcome, LocalFrame, Target, TargetKind, Tuning, Vec3,
};

/// Drives one detector with a blade held straight into the screen.
struct Swing {
    target: Target,
    detector: BladeHitDetector,
    pose: Option<BladePose>,
    time: f64,
}

impl Swing {
    fn new(kind: TargetKind, frame: LocalFrame, tuning: &Tuning) -> Self {
        let target = Target::new(kind, Hand::Left, Aabb::cube(0.5), frame);
        let detector = BladeHitDetector::new(&target, target.is_good_for(Hand::Left), tuning);
        Self {
            target,
            detector,
            pose: None,
            time: 0.0,
        }
    }

    /// One frame with the blade at target-local (x, y).
    fn frame(&mut self, x: f64, y: f64, dt: f64) -> bool {
        let tip = self.target.frame.local_to_world(&Vec3::new(x, y, -0.2));
        let handle = self.target.frame.local_to_world(&Vec3::new(x, y, 0.6));
        let pose = match self.pose {
            Some(mut pose) => {
                pose.update(tip, handle);
                pose
            }
            None => BladePose::new(tip, handle),
        };
        self.pose = Some(pose);
        self.time += dt;
        self.detector.is_hit(self.time, &pose, &self.target)
    }

    /// Horizontal sweep in 0.1 steps from -0.95 to 0.95 at height `y`.
    fn sweep(&mut self, y: f64, dt: f64) -> Option<HitOutcome> {
        for i in 0..20 {
            if self.frame(-0.95 + 0.1 * i as f64, y, dt) {
                return self.detector.outcome().copied();
            }
        }
        None
    }
}

fn score(outcome: Option<HitOutcome>) -> f64 {
    match outcome {
        Some(HitOutcome::Good(score)) => score.score,
        other => panic!("expected a good slice, got {:?}", other),
    }
}

#[test]
fn test_faster_swing_scores_higher() {
    let tuning = Tuning::standard();
    // Off-center enough that accuracy contributes nothing, keeping totals below the cap
    let slow = score(Swing::new(TargetKind::Arrow, LocalFrame::IDENTITY, &tuning).sweep(0.2, 14.0));
    let fast = score(Swing::new(TargetKind::Arrow, LocalFrame::IDENTITY, &tuning).sweep(0.2, 10.0));
    assert!(fast > slow, "fast {} <= slow {}", fast, slow);
    assert!(fast < tuning.slice.max_score);
}

#[test]
fn test_score_decreases_away_from_center() {
    let tuning = Tuning::standard();
    // Slow enough that speed contributes nothing
    let scores: Vec<f64> = [0.03, 0.09, 0.13]
        .iter()
        .map(|&y| score(Swing::new(TargetKind::Arrow, LocalFrame::IDENTITY, &tuning).sweep(y, 25.0)))
        .collect();
    assert!(scores[0] > scores[1], "{:?}", scores);
    assert!(scores[1] > scores[2], "{:?}", scores);
}

#[test]
fn test_bottom_entry_is_bad() {
    let mut swing = Swing::new(TargetKind::Arrow, LocalFrame::IDENTITY, &Tuning::standard());
    let mut hit = false;
    for i in 0..20 {
        if swing.frame(0.0, -0.95 + 0.1 * i as f64, 11.0) {
            hit = true;
            break;
        }
    }
    assert!(hit);
    assert_eq!(
        swing.detector.outcome().and_then(|o| o.reason()),
        Some(BadHitReason::BadEntry)
    );
}

#[test]
fn test_dot_from_any_side_is_full_score() {
    let tuning = Tuning::standard();
    for (dx, dy) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
        let mut swing = Swing::new(TargetKind::Dot, LocalFrame::IDENTITY, &tuning);
        let mut hit = false;
        for i in 0..20 {
            let t = -0.95 + 0.1 * i as f64;
            if swing.frame(t * dx, t * dy, 11.0) {
                hit = true;
                break;
            }
        }
        assert!(hit);
        assert_eq!(score(swing.detector.outcome().copied()), tuning.slice.max_score);
    }
}

#[test]
fn test_reset_after_hit_then_fresh_swing() {
    let mut swing = Swing::new(TargetKind::Arrow, LocalFrame::IDENTITY, &Tuning::standard());
    assert!(swing.sweep(0.0, 11.0).unwrap().is_good());

    swing.detector.reset();
    swing.pose = None;
    assert_eq!(swing.detector.state(), SwingState::NotReaching);

    // Backhand this time
    let mut hit = false;
    for i in 0..20 {
        if swing.frame(0.95 - 0.1 * i as f64, 0.0, 11.0) {
            hit = true;
            break;
        }
    }
    assert!(hit);
    assert_eq!(
        swing.detector.outcome().and_then(|o| o.reason()),
        Some(BadHitReason::BadEntry)
    );
}

#[test]
fn test_rolled_and_scaled_target() {
    let frame = LocalFrame::rolled(Vec3::new(-0.3, 1.4, -2.0), -std::f64::consts::FRAC_PI_4)
        .with_scale(1.5);
    let mut swing = Swing::new(TargetKind::Arrow, frame, &Tuning::standard());
    assert!(swing.sweep(0.0, 11.0).unwrap().is_good());
}

#[test]
fn test_forgiving_profile_widens_footprint() {
    let loader = TuningLoader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tuning"));
    let forgiving = loader.load("forgiving").unwrap();
    let target = Target::new(TargetKind::Arrow, Hand::Left, Aabb::cube(0.5), LocalFrame::IDENTITY);

    let standard = BladeHitDetector::new(&target, true, &Tuning::standard());
    let wide = <BladeHitDetector as HitDetector>::new(&target, true, &forgiving);
    assert!(wide.footprint().width() > standard.footprint().width());
}
