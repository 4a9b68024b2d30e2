//! Containment of the extended blade in a target footprint.

use crate::tuning::Leniency;
use crate::types::{BladeSample, HitPlane, TargetBox, Vec2};

/// Per-detector containment scratch.
///
/// The blade segment is lengthened, projected onto the hit plane and tested
/// against the footprint. The probe remembers the last two intersections and
/// the furthest point reached along +X while inside, which the state machine
/// reads after each `test`.
#[derive(Debug, Clone)]
pub struct ContainmentProbe {
    bounds: TargetBox,
    plane: HitPlane,
    tip_extension: f64,
    handle_extension: f64,

    reaching: bool,
    inside: bool,
    intersection: Vec2,
    last_intersection: Vec2,
    /// Whether `intersection` belongs to the current reach
    primed: bool,
    furthest: Vec2,
}

impl ContainmentProbe {
    pub fn new(bounds: TargetBox, plane: HitPlane, leniency: &Leniency) -> Self {
        Self {
            bounds,
            plane,
            tip_extension: leniency.tip_extension,
            handle_extension: leniency.handle_extension,
            reaching: false,
            inside: false,
            intersection: Vec2::ZERO,
            last_intersection: Vec2::ZERO,
            primed: false,
            furthest: Self::NO_ADVANCE,
        }
    }

    const NO_ADVANCE: Vec2 = Vec2 {
        x: f64::NEG_INFINITY,
        y: 0.0,
    };

    /// Test one sample. Returns whether the extended tip is inside the footprint.
    pub fn test(&mut self, sample: &BladeSample) -> bool {
        let blade = sample.extended(self.tip_extension, self.handle_extension);

        self.reaching = false;
        self.inside = false;

        // Tip in front of the plane, or handle behind it: not touching
        if blade.tip.z > self.plane.z || blade.handle.z < self.plane.z {
            self.primed = false;
            return false;
        }

        let Some(point) = self.plane.intersect_segment(&blade.tip, &blade.handle) else {
            self.primed = false;
            return false;
        };
        if !point.is_finite() {
            log::warn!("non-finite blade intersection from {:?}", sample);
            self.primed = false;
            return false;
        }

        self.reaching = true;
        self.last_intersection = if self.primed { self.intersection } else { point };
        self.intersection = point;
        self.primed = true;

        if self.bounds.contains(&self.intersection) {
            self.inside = true;
            // The exit sample may overshoot past the box; remember how far
            // the previous sample got.
            if self.last_intersection.x > self.furthest.x {
                self.furthest = self.last_intersection;
            }
        }
        self.inside
    }

    pub fn reaching(&self) -> bool {
        self.reaching
    }

    pub fn inside(&self) -> bool {
        self.inside
    }

    pub fn intersection(&self) -> Vec2 {
        self.intersection
    }

    pub fn last_intersection(&self) -> Vec2 {
        self.last_intersection
    }

    /// Furthest point along +X seen while inside, if any.
    pub fn furthest(&self) -> Option<Vec2> {
        self.furthest.x.is_finite().then_some(self.furthest)
    }

    pub fn bounds(&self) -> &TargetBox {
        &self.bounds
    }

    /// Y where the last move crossed the footprint's left edge, if it did.
    pub fn left_edge_crossing(&self) -> Option<f64> {
        let last = self.last_intersection;
        let cur = self.intersection;
        let min_x = self.bounds.min.x;
        if !(last.x < min_x && min_x <= cur.x) {
            return None;
        }
        let t = (min_x - last.x) / (cur.x - last.x);
        let y = last.y + t * (cur.y - last.y);
        (y >= self.bounds.min.y && y <= self.bounds.max.y).then_some(y)
    }

    /// Clear transient state.
    pub fn reset(&mut self) {
        self.reaching = false;
        self.inside = false;
        self.intersection = Vec2::ZERO;
        self.last_intersection = Vec2::ZERO;
        self.primed = false;
        self.furthest = Self::NO_ADVANCE;
    }
}

// =============================================================================
// Tests
// =============================================================================
