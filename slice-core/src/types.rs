//! Core types for slice detection.
//!
//! Units:
//! - Position: meters, in either world space or a target's local space
//! - Time: milliseconds (frame timestamps)
//! - Speed: meters per second
//!
//! Target-local space is the frame every detector works in:
//! - X: the required cutting axis (a valid slice travels toward +X)
//! - Y: across the cut
//! - Z: toward the player; the hit plane sits on the target's front face

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

// =============================================================================
// Vec3 - 3D Vector
// =============================================================================

/// A 3D vector used for blade tip/handle positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (*other - *self).magnitude()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Linear interpolation between two vectors
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        *self + (*other - *self) * t
    }

    /// Drops the Z component.
    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

// =============================================================================
// Vec2 - 2D Vector (hit plane coordinates)
// =============================================================================

/// A point or direction on a target's hit plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// The required cutting direction.
    pub const CUT_AXIS: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(&self) -> Option<Self> {
        let mag = self.magnitude();
        if mag < constants::EPSILON || !mag.is_finite() {
            None
        } else {
            Some(*self / mag)
        }
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        (*self + *other) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Perpendicular distance from `self` to the infinite line through `a` and `b`.
    ///
    /// NaN when `a == b`; callers treat that as degenerate.
    pub fn distance_to_line(&self, a: &Self, b: &Self) -> f64 {
        let numerator = ((b.x - a.x) * (a.y - self.y) - (b.y - a.y) * (a.x - self.x)).abs();
        let denominator = (*b - *a).magnitude();
        if denominator < constants::EPSILON {
            f64::NAN
        } else {
            numerator / denominator
        }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f64) -> Self {
        Self::new(self.x / scalar, self.y / scalar)
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::ZERO
    }
}

// =============================================================================
// Target Geometry
// =============================================================================

/// Axis-aligned rectangle on the hit plane: the target's sensing footprint.
///
/// Invariant: `min.x < max.x` and `min.y < max.y`. A degenerate box is a
/// configuration error upstream; nothing here checks it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl TargetBox {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        self.min.midpoint(&self.max)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: &Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Scales both corners about the local origin.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }
}

/// Plane parallel to the target's local XY plane at a fixed local Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitPlane {
    pub z: f64,
}

impl HitPlane {
    pub const fn new(z: f64) -> Self {
        Self { z }
    }

    /// Intersection of segment `a`-`b` with the plane, projected to 2D.
    ///
    /// A segment lying in the plane yields `a`. Returns `None` if the segment
    /// does not reach the plane.
    pub fn intersect_segment(&self, a: &Vec3, b: &Vec3) -> Option<Vec2> {
        let dz = b.z - a.z;
        if dz.abs() < constants::EPSILON {
            return ((a.z - self.z).abs() < constants::EPSILON).then(|| a.xy());
        }
        let t = (self.z - a.z) / dz;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(a.lerp(b, t).xy())
    }
}

/// Local-space bounding box of a target mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cube of edge `size` centered on the local origin.
    pub fn cube(size: f64) -> Self {
        let h = size * 0.5;
        Self::new(Vec3::new(-h, -h, -h), Vec3::new(h, h, h))
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    /// Projection onto the local XY plane.
    pub fn footprint(&self) -> TargetBox {
        TargetBox::new(self.min.xy(), self.max.xy())
    }

    /// The plane on the target's front face.
    pub fn hit_plane(&self) -> HitPlane {
        HitPlane::new(self.max.z)
    }
}

/// Rigid transform from world space into a target's local space, with an
/// optional uniform scale.
///
/// The axes are the target's local X/Y/Z expressed in world space and must
/// be orthonormal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalFrame {
    pub origin: Vec3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub z_axis: Vec3,
    pub scale: f64,
}

impl LocalFrame {
    pub const IDENTITY: LocalFrame = LocalFrame {
        origin: Vec3::ZERO,
        x_axis: Vec3::new(1.0, 0.0, 0.0),
        y_axis: Vec3::new(0.0, 1.0, 0.0),
        z_axis: Vec3::new(0.0, 0.0, 1.0),
        scale: 1.0,
    };

    pub fn at(origin: Vec3) -> Self {
        Self {
            origin,
            ..Self::IDENTITY
        }
    }

    /// Frame at `origin`, rolled by `angle` radians about the world Z axis.
    ///
    /// Arrow targets use the roll to point their local +X along the cut
    /// direction.
    pub fn rolled(origin: Vec3, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            origin,
            x_axis: Vec3::new(cos, sin, 0.0),
            y_axis: Vec3::new(-sin, cos, 0.0),
            z_axis: Vec3::new(0.0, 0.0, 1.0),
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn world_to_local(&self, p: &Vec3) -> Vec3 {
        let d = *p - self.origin;
        Vec3::new(d.dot(&self.x_axis), d.dot(&self.y_axis), d.dot(&self.z_axis)) / self.scale
    }

    pub fn local_to_world(&self, p: &Vec3) -> Vec3 {
        let s = *p * self.scale;
        self.origin + self.x_axis * s.x + self.y_axis * s.y + self.z_axis * s.z
    }
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// =============================================================================
// Blade Samples
// =============================================================================

/// Blade tip/handle at one instant, in target-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BladeSample {
    pub tip: Vec3,
    pub handle: Vec3,
    /// Timestamp in milliseconds
    pub time: f64,
}

impl BladeSample {
    pub fn new(tip: Vec3, handle: Vec3, time: f64) -> Self {
        Self { tip, handle, time }
    }

    /// Sample `t` of the way from `self` to `other`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            tip: self.tip.lerp(&other.tip, t),
            handle: self.handle.lerp(&other.handle, t),
            time: self.time + (other.time - self.time) * t,
        }
    }

    /// Lengthens the sensing segment: the tip is pushed outward by
    /// `tip_extension` blade lengths and the handle pulled back by
    /// `handle_extension` blade lengths.
    pub fn extended(&self, tip_extension: f64, handle_extension: f64) -> Self {
        let blade = self.tip - self.handle;
        Self {
            tip: self.tip + blade * tip_extension,
            handle: self.handle - blade * handle_extension,
            time: self.time,
        }
    }
}

/// World-space blade pose maintained by the tracking layer.
///
/// `update` is called once per frame before any detector runs; the previous
/// pair is kept so a detector seeing the blade for the first time can
/// fabricate its missing last-frame sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BladePose {
    pub tip: Vec3,
    pub handle: Vec3,
    pub prev_tip: Vec3,
    pub prev_handle: Vec3,
}

impl BladePose {
    /// A pose with no motion history.
    pub fn new(tip: Vec3, handle: Vec3) -> Self {
        Self {
            tip,
            handle,
            prev_tip: tip,
            prev_handle: handle,
        }
    }

    /// Shifts the current pair into the previous slot and records a new one.
    pub fn update(&mut self, tip: Vec3, handle: Vec3) {
        self.prev_tip = self.tip;
        self.prev_handle = self.handle;
        self.tip = tip;
        self.handle = handle;
    }
}

// =============================================================================
// Targets
// =============================================================================

/// Which tracked hand (and therefore which implement color) a target expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// Must be cut along its local +X axis.
    Arrow,
    /// Omnidirectional: any touch by the right implement is a full-score hit.
    Dot,
    /// Must not be touched by anything.
    Mine,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Arrow => write!(f, "arrow"),
            TargetKind::Dot => write!(f, "dot"),
            TargetKind::Mine => write!(f, "mine"),
        }
    }
}

/// Grid cell a beat travels down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lane {
    pub column: i8,
    pub row: i8,
}

impl Lane {
    pub const fn new(column: i8, row: i8) -> Self {
        Self { column, row }
    }
}

/// A beat as seen by hit detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    pub hand: Hand,
    /// Local-space bounds
    pub bounds: Aabb,
    /// Current world-to-local transform, moved by the timeline every frame
    pub frame: LocalFrame,
    /// Only the earliest live beat of a lane is checked; `None` opts out.
    pub lane: Option<Lane>,
    /// Scheduled hit time in milliseconds
    pub time: f64,
}

impl Target {
    /// Mine bounds are halved so grazing one is forgiven.
    pub fn new(kind: TargetKind, hand: Hand, bounds: Aabb, frame: LocalFrame) -> Self {
        let bounds = match kind {
            TargetKind::Mine => bounds.scaled(0.5),
            TargetKind::Arrow | TargetKind::Dot => bounds,
        };
        Self {
            kind,
            hand,
            bounds,
            frame,
            lane: None,
            time: 0.0,
        }
    }

    /// Places the target in `lane`, due at `time` ms.
    pub fn at_beat(mut self, lane: Lane, time: f64) -> Self {
        self.lane = Some(lane);
        self.time = time;
        self
    }

    pub fn is_dot(&self) -> bool {
        self.kind == TargetKind::Dot
    }

    pub fn is_mine(&self) -> bool {
        self.kind == TargetKind::Mine
    }

    /// Whether `hand` is the one that should hit this target.
    pub fn is_good_for(&self, hand: Hand) -> bool {
        !self.is_mine() && self.hand == hand
    }
}

// =============================================================================
// Outcome Types
// =============================================================================

/// Why a hit was classified as bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadHitReason {
    WrongTarget,
    BadEntry,
    BadSliceRatio,
    BadAngle,
    /// Entry and exit collapsed to a point or an instant.
    Degenerate,
}

impl BadHitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadHitReason::WrongTarget => "Bad target hit!",
            BadHitReason::BadEntry => "Bad entry!",
            BadHitReason::BadSliceRatio => "Bad slice ratio!",
            BadHitReason::BadAngle => "Bad angle!",
            BadHitReason::Degenerate => "Degenerate slice!",
        }
    }
}

impl fmt::Display for BadHitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points awarded per factor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub slice_ratio: f64,
    pub angle: f64,
    pub accuracy: f64,
    pub speed: f64,
}

/// Raw swing measurements behind the sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SliceMetrics {
    pub slice_ratio: f64,
    pub angle_dot: f64,
    pub dist_from_center: f64,
    /// Meters per second
    pub slash_speed: f64,
}

/// Score of a good hit.
///
/// Dot and punch hits carry zeroed sub-scores and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: f64,
    /// 0 to 100
    pub percent: f64,
    pub sub_scores: SubScores,
    pub metrics: SliceMetrics,
}

impl ScoreBreakdown {
    pub fn is_perfect(&self, perfect_percent: f64) -> bool {
        self.percent >= perfect_percent
    }
}

/// Final classification of a detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitOutcome {
    Bad { reason: BadHitReason },
    Good(ScoreBreakdown),
}

impl HitOutcome {
    pub fn bad(reason: BadHitReason) -> Self {
        HitOutcome::Bad { reason }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, HitOutcome::Good(_))
    }

    pub fn reason(&self) -> Option<BadHitReason> {
        match self {
            HitOutcome::Bad { reason } => Some(*reason),
            HitOutcome::Good(_) => None,
        }
    }

    pub fn score(&self) -> Option<&ScoreBreakdown> {
        match self {
            HitOutcome::Good(score) => Some(score),
            HitOutcome::Bad { .. } => None,
        }
    }
}

// =============================================================================
// Constants
// =============================================================================

pub mod constants {
    /// Small value for floating-point comparisons
    pub const EPSILON: f64 = 1e-10;

    /// Frame interval assumed when a blade has no history (90 Hz).
    pub const DEFAULT_FRAME_INTERVAL_MS: f64 = 1000.0 / 90.0;
}

// =============================================================================
// Tests
// =============================================================================
