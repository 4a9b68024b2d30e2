//! Blade hit detector: the per-frame facade over sampling, containment,
//! the swing state machine and scoring.

use crate::detection::containment::ContainmentProbe;
use crate::detection::sampling::SampleBuffer;
use crate::detection::swing::{SwingMachine, SwingState, TargetRole};
use crate::detection::HitDetector;
use crate::scoring::SliceScorer;
use crate::tuning::{Leniency, SamplingTuning, SliceScoring, Tuning};
use crate::types::{BladePose, HitOutcome, Target, TargetBox};

/// Detects slices of one target by one blade.
///
/// Owns its footprint copy and all scratch state. The blade pose and the
/// target's transform are read each frame and never stored.
#[derive(Debug, Clone)]
pub struct BladeHitDetector {
    role: TargetRole,
    sampling: SamplingTuning,
    scoring: SliceScoring,
    good_tuning: Leniency,
    bad_tuning: Leniency,

    probe: ContainmentProbe,
    scorer: SliceScorer,
    samples: SampleBuffer,
    swing: SwingMachine,
    outcome: Option<HitOutcome>,
}

impl BladeHitDetector {
    pub fn new(target: &Target, is_good: bool, tuning: &Tuning) -> Self {
        let (probe, scorer) = Self::bind(target, is_good, tuning.leniency(is_good), tuning.slice);
        Self {
            role: TargetRole {
                is_good,
                is_dot: target.is_dot(),
            },
            sampling: tuning.sampling,
            scoring: tuning.slice,
            good_tuning: tuning.good,
            bad_tuning: tuning.bad,
            probe,
            scorer,
            samples: SampleBuffer::new(),
            swing: SwingMachine::new(),
            outcome: None,
        }
    }

    fn bind(
        target: &Target,
        is_good: bool,
        leniency: Leniency,
        scoring: SliceScoring,
    ) -> (ContainmentProbe, SliceScorer) {
        let base = target.bounds.footprint();
        let bounds: TargetBox = base.scaled(leniency.box_scaling);
        log::trace!(
            "binding {} detector to {} target, footprint {:.3} x {:.3}",
            if is_good { "good" } else { "bad" },
            target.kind,
            bounds.width(),
            bounds.height()
        );
        (
            ContainmentProbe::new(bounds, target.bounds.hit_plane(), &leniency),
            SliceScorer::new(scoring, bounds, base.width()),
        )
    }

    /// Called once per frame with the blade's current world pose.
    ///
    /// Returns true once the swing has resolved; stays true until reset.
    pub fn is_hit(&mut self, time: f64, blade: &BladePose, target: &Target) -> bool {
        if self.swing.is_hit() {
            return true;
        }

        self.samples.capture(
            time,
            blade,
            &target.frame,
            self.sampling.default_frame_interval_ms,
        );
        self.samples
            .synthesize(self.probe.bounds().width(), &self.sampling);

        for sample in self.samples.pending() {
            if let Some(outcome) = self
                .swing
                .advance(sample, &mut self.probe, self.role, &self.scorer)
            {
                log::debug!("{} target resolved: {:?}", target.kind, outcome);
                self.outcome = Some(outcome);
                break;
            }
        }
        self.samples.commit();
        self.swing.is_hit()
    }

    pub fn state(&self) -> SwingState {
        self.swing.state()
    }

    pub fn outcome(&self) -> Option<&HitOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_good(&self) -> bool {
        self.role.is_good
    }

    /// Sensing footprint after leniency scaling.
    pub fn footprint(&self) -> &TargetBox {
        self.probe.bounds()
    }

    pub fn reset(&mut self) {
        self.probe.reset();
        self.samples.reset();
        self.swing.reset();
        self.outcome = None;
    }

    pub fn retarget(&mut self, target: &Target, is_good: bool) {
        let leniency = if is_good {
            self.good_tuning
        } else {
            self.bad_tuning
        };
        let (probe, scorer) = Self::bind(target, is_good, leniency, self.scoring);
        self.probe = probe;
        self.scorer = scorer;
        self.role = TargetRole {
            is_good,
            is_dot: target.is_dot(),
        };
        self.samples.reset();
        self.swing.reset();
        self.outcome = None;
    }
}

impl HitDetector for BladeHitDetector {
    type Implement = BladePose;

    fn new(target: &Target, is_good: bool, tuning: &Tuning) -> Self {
        BladeHitDetector::new(target, is_good, tuning)
    }

    fn is_hit(&mut self, time: f64, implement: &BladePose, target: &Target) -> bool {
        BladeHitDetector::is_hit(self, time, implement, target)
    }

    fn outcome(&self) -> Option<&HitOutcome> {
        BladeHitDetector::outcome(self)
    }

    fn is_good(&self) -> bool {
        BladeHitDetector::is_good(self)
    }

    fn reset(&mut self) {
        BladeHitDetector::reset(self)
    }

    fn retarget(&mut self, target: &Target, is_good: bool) {
        BladeHitDetector::retarget(self, target, is_good)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Aabb, BadHitReason, Hand, LocalFrame, TargetKind, Vec3};

    const FRAME: f64 = 1000.0 / 90.0;

    fn target(kind: TargetKind, frame: LocalFrame) -> Target {
        Target::new(kind, Hand::Right, Aabb::cube(0.5), frame)
    }

    /// Blade held straight into the screen at local (x, y) of `frame`.
    fn blade_at(frame: &LocalFrame, x: f64, y: f64) -> (Vec3, Vec3) {
        (
            frame.local_to_world(&Vec3::new(x, y, -0.2)),
            frame.local_to_world(&Vec3::new(x, y, 0.6)),
        )
    }

    /// Run a swing frame by frame; returns the frame index of the hit.
    fn swing(
        detector: &mut BladeHitDetector,
        target: &Target,
        points: &[(f64, f64)],
    ) -> Option<usize> {
        let (tip, handle) = blade_at(&target.frame, points[0].0, points[0].1);
        let mut pose = BladePose::new(tip, handle);
        for (i, &(x, y)) in points.iter().enumerate() {
            let (tip, handle) = blade_at(&target.frame, x, y);
            pose.update(tip, handle);
            if detector.is_hit(i as f64 * FRAME, &pose, target) {
                return Some(i);
            }
        }
        None
    }

    fn sweep(from: f64, to: f64, y: f64, steps: usize) -> Vec<(f64, f64)> {
        (0..=steps)
            .map(|i| (from + (to - from) * i as f64 / steps as f64, y))
            .collect()
    }

    #[test]
    fn test_footprint_scaled_by_leniency() {
        let t = target(TargetKind::Arrow, LocalFrame::IDENTITY);
        let good = BladeHitDetector::new(&t, true, &Tuning::standard());
        let bad = BladeHitDetector::new(&t, false, &Tuning::standard());
        assert!((good.footprint().width() - 0.6).abs() < 1e-10);
        assert!((bad.footprint().width() - 0.51).abs() < 1e-10);
    }

    #[test]
    fn test_good_slice_in_world_space() {
        let frame = LocalFrame::at(Vec3::new(0.4, 1.2, -3.0));
        let t = target(TargetKind::Arrow, frame);
        let mut detector = BladeHitDetector::new(&t, true, &Tuning::standard());

        let hit = swing(&mut detector, &t, &sweep(-0.95, 0.95, 0.05, 19));
        assert!(hit.is_some());
        assert!(detector.outcome().unwrap().is_good());
        assert_eq!(detector.state(), SwingState::Hit);
    }

    #[test]
    fn test_rolled_target_cut_along_its_axis() {
        // Arrow rotated 90 degrees: local +X is world +Y, so the cut is upward
        let frame = LocalFrame::rolled(Vec3::new(0.0, 1.0, -2.0), std::f64::consts::FRAC_PI_2);
        let t = target(TargetKind::Arrow, frame);

        let mut detector = BladeHitDetector::new(&t, true, &Tuning::standard());
        swing(&mut detector, &t, &sweep(-0.95, 0.95, 0.0, 19)).unwrap();
        assert!(detector.outcome().unwrap().is_good());

        // A world-horizontal swing crosses the rolled target through its local top
        let mut detector = BladeHitDetector::new(&t, true, &Tuning::standard());
        let across: Vec<_> = sweep(-0.95, 0.95, 0.0, 19)
            .into_iter()
            .map(|(x, y)| (y, -x))
            .collect();
        swing(&mut detector, &t, &across).unwrap();
        assert_eq!(
            detector.outcome().unwrap().reason(),
            Some(BadHitReason::BadEntry)
        );
    }

    #[test]
    fn test_fast_swing_does_not_tunnel() {
        let t = target(TargetKind::Arrow, LocalFrame::IDENTITY);
        let mut detector = BladeHitDetector::new(&t, true, &Tuning::standard());
        // 0.9 per frame: the real samples straddle the whole footprint
        let hit = swing(&mut detector, &t, &[(-1.0, 0.0), (-0.7, 0.0), (0.2, 0.0), (1.1, 0.0)]);
        assert!(hit.is_some());
        assert!(detector.outcome().unwrap().is_good());
    }

    #[test]
    fn test_never_reaching_never_hits() {
        let t = target(TargetKind::Arrow, LocalFrame::IDENTITY);
        let mut detector = BladeHitDetector::new(&t, true, &Tuning::standard());
        let mut pose = BladePose::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::new(-1.0, 0.0, 1.8));
        for i in 0..60 {
            let x = -1.0 + i as f64 * 0.05;
            pose.update(Vec3::new(x, 0.0, 1.0), Vec3::new(x, 0.0, 1.8));
            assert!(!detector.is_hit(i as f64 * FRAME, &pose, &t));
        }
        assert_eq!(detector.state(), SwingState::NotReaching);
        assert!(detector.outcome().is_none());
    }

    #[test]
    fn test_is_hit_is_sticky() {
        let t = target(TargetKind::Dot, LocalFrame::IDENTITY);
        let mut detector = BladeHitDetector::new(&t, true, &Tuning::standard());
        swing(&mut detector, &t, &[(0.0, 0.8), (0.0, 0.0)]).unwrap();

        let away = BladePose::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(5.0, 5.0, 6.0));
        assert!(detector.is_hit(1000.0, &away, &t));
        assert!(detector.outcome().unwrap().is_good());
    }

    #[test]
    fn test_reset_allows_fresh_swing() {
        let t = target(TargetKind::Arrow, LocalFrame::IDENTITY);
        let mut detector = BladeHitDetector::new(&t, true, &Tuning::standard());
        swing(&mut detector, &t, &sweep(0.95, -0.95, 0.0, 19)).unwrap();
        assert_eq!(
            detector.outcome().unwrap().reason(),
            Some(BadHitReason::BadEntry)
        );

        detector.reset();
        assert_eq!(detector.state(), SwingState::NotReaching);
        assert!(detector.outcome().is_none());

        swing(&mut detector, &t, &sweep(-0.95, 0.95, 0.0, 19)).unwrap();
        assert!(detector.outcome().unwrap().is_good());
    }

    #[test]
    fn test_retarget_switches_role() {
        let arrow = target(TargetKind::Arrow, LocalFrame::IDENTITY);
        let mut detector = BladeHitDetector::new(&arrow, true, &Tuning::standard());
        swing(&mut detector, &arrow, &sweep(-0.95, 0.95, 0.0, 19)).unwrap();

        let mine = target(TargetKind::Mine, LocalFrame::at(Vec3::new(0.0, 0.0, -1.0)));
        detector.retarget(&mine, mine.is_good_for(Hand::Right));
        assert!(!detector.is_good());
        assert_eq!(detector.state(), SwingState::NotReaching);

        swing(&mut detector, &mine, &[(0.0, 0.5), (0.0, 0.0)]).unwrap();
        assert_eq!(
            detector.outcome().unwrap().reason(),
            Some(BadHitReason::WrongTarget)
        );
    }
}
