//! # Slice Core
//!
//! Per-frame hit detection for blade and punch rhythm targets.
//!
//! ## Architecture
//!
//! - `types`: Core data structures (vectors, footprints, targets, outcomes)
//! - `tuning`: Leniency and scoring profiles, loaded from YAML
//! - `detection`: Containment, swing state machine, sub-frame sampling and
//!   the per-implement detectors
//! - `scoring`: Slice and punch scoring
//! - `system`: Target pool polled once per frame

pub mod detection;
pub mod scoring;
pub mod system;
pub mod tuning;
pub mod types;

pub use detection::{BladeHitDetector, HitDetector, PunchHitDetector, PunchImplement, SwingState};
pub use system::{HitEvent, HitObserver, HitSystem, TargetId};
pub use tuning::{Tuning, TuningError, TuningLoader};
pub use types::{
    Aabb, BadHitReason, BladePose, Hand, HitOutcome, Lane, LocalFrame, ScoreBreakdown,
    Target, TargetKind, Vec3,
};
