//! Hit detection between tracked implements and targets.
//!
//! This module handles:
//! - **Containment**: whether the extended blade currently pierces a target's
//!   footprint on its hit plane
//! - **Swing**: the entry/exit state machine that tells a slash from a stab
//! - **Sampling**: sub-frame interpolation so fast swings cannot tunnel
//! - **Detectors**: the per-(implement, target) facades polled every frame
//!
//! ## Slash vs Stab
//!
//! Targets are thin, and the blade is only sampled once per frame. A valid
//! slice must cross the footprint's left edge while the blade is already
//! reaching through the hit plane:
//!
//! ```text
//!        reaching           inside             outside
//!   ─ ─ ─ ─●─ ─ ─ ─ ┌────────●────────┐ ─ ─ ─ ─●─ ─ ─ ─▶ +X
//!          last     │  entry (min.x)  │  exit
//!                   └─────────────────┘
//! ```
//!
//! Entering from the front, top or bottom is a bad entry.

pub mod blade;
pub mod containment;
pub mod punch;
pub mod sampling;
pub mod swing;

pub use blade::BladeHitDetector;
pub use containment::ContainmentProbe;
pub use punch::{PunchHitDetector, PunchImplement};
pub use sampling::{SampleBuffer, SYNTHETIC_CAPACITY};
pub use swing::{SwingMachine, SwingState, TargetRole};

use crate::tuning::Tuning;
use crate::types::{HitOutcome, Target};

/// A detector for one (implement, target) pairing.
///
/// Implementations are polled once per frame. `is_hit` must stay true once it
/// has returned true, until `reset` or `retarget`.
pub trait HitDetector {
    /// What the detector reads from the implement each frame.
    type Implement: ?Sized;

    /// Build a detector for `target`; `is_good` says whether this implement
    /// is the one that should hit it.
    fn new(target: &Target, is_good: bool, tuning: &Tuning) -> Self
    where
        Self: Sized;

    /// Advance to `time` (milliseconds) and report whether a hit happened.
    fn is_hit(&mut self, time: f64, implement: &Self::Implement, target: &Target) -> bool;

    /// The classification, available once `is_hit` has returned true.
    fn outcome(&self) -> Option<&HitOutcome>;

    /// Whether the bound implement is the one meant to hit the target.
    fn is_good(&self) -> bool;

    /// Clear all transient state, keeping the current target binding.
    fn reset(&mut self);

    /// Reset and bind to a new target, for pooled reuse.
    fn retarget(&mut self, target: &Target, is_good: bool);
}
