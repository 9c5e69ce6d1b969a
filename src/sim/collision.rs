//! Oriented bounding boxes and the Separating Axis Theorem
//!
//! Every collidable entity owns one `ObbCollider` and refreshes it in place
//! after moving. Overlap is a discrete test on the already-stepped boxes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::vector::{project_onto, rotate};

/// Relative slack on the fast-reject bound so float rounding can only make
/// it more conservative
const FAST_REJECT_SLACK: f32 = 1e-4;

/// A rectangle with arbitrary rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObbCollider {
    /// Local X and Y axes, unit length and perpendicular
    pub axes: [Vec2; 2],
    /// Extent along each axis, never negative
    pub half_widths: [f32; 2],
    pub origin: Vec2,
}

impl ObbCollider {
    pub fn new(half_width_x: f32, half_width_y: f32, origin: Vec2, angle: f32) -> Self {
        Self {
            axes: axes_for(angle),
            half_widths: [half_width_x.max(0.0), half_width_y.max(0.0)],
            origin,
        }
    }

    /// Move the box. Axes are only recomputed when an angle is given and
    /// half-widths only replaced when given and positive.
    pub fn update(&mut self, position: Vec2, angle: Option<f32>, half_widths: Option<[f32; 2]>) {
        self.origin = position;
        if let Some(angle) = angle {
            self.axes = axes_for(angle);
        }
        if let Some([hw_x, hw_y]) = half_widths {
            if hw_x > 0.0 {
                self.half_widths[0] = hw_x;
            }
            if hw_y > 0.0 {
                self.half_widths[1] = hw_y;
            }
        }
    }

    /// Corners in winding order
    pub fn corners(&self) -> [Vec2; 4] {
        let ext0 = self.axes[0] * self.half_widths[0];
        let ext1 = self.axes[1] * self.half_widths[1];
        [
            self.origin + ext0 + ext1,
            self.origin - ext0 + ext1,
            self.origin - ext0 - ext1,
            self.origin + ext0 - ext1,
        ]
    }

    /// Half-extent of the axis-aligned box enclosing this one
    pub fn aabb_radius(&self) -> Vec2 {
        let [a0, a1] = self.axes;
        let [hw0, hw1] = self.half_widths;
        Vec2::new(
            a0.x.abs() * hw0 + a1.x.abs() * hw1,
            a0.y.abs() * hw0 + a1.y.abs() * hw1,
        )
    }

    /// Min/max of the corners projected onto `axis`
    fn project(&self, axis: Vec2) -> (f32, f32) {
        self.corners()
            .iter()
            .map(|c| c.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            })
    }
}

fn axes_for(angle: f32) -> [Vec2; 2] {
    [
        rotate(Vec2::X, angle, Vec2::ZERO),
        rotate(Vec2::Y, angle, Vec2::ZERO),
    ]
}

/// Cheap pre-check: true when the boxes certainly do not overlap.
///
/// Overlapping boxes have overlapping AABBs, so the centre offset is bounded
/// per component by the summed AABB radii. Its length is therefore bounded
/// by the length of the summed radius vector, which makes this test free of
/// false negatives.
pub fn fast_reject(a: &ObbCollider, b: &ObbCollider) -> bool {
    let reach = (a.aabb_radius() + b.aabb_radius()).length_squared();
    let dist = (b.origin - a.origin).length_squared();
    reach * (1.0 + FAST_REJECT_SLACK) + FAST_REJECT_SLACK < dist
}

/// Full four-axis SAT check
pub fn sat_overlap(a: &ObbCollider, b: &ObbCollider) -> bool {
    let candidates = [a.axes[0], a.axes[1], b.axes[0], b.axes[1]];
    candidates.iter().all(|&axis| {
        let (min_a, max_a) = a.project(axis);
        let (min_b, max_b) = b.project(axis);
        max_a >= min_b && max_b >= min_a
    })
}

/// Symmetric overlap predicate
pub fn intersects(a: &ObbCollider, b: &ObbCollider) -> bool {
    if fast_reject(a, b) {
        return false;
    }
    sat_overlap(a, b)
}

/// Approximate contact normal for something at `from` striking `target`:
/// whichever projection of the centre offset onto the target's axes is
/// longer. Not unit length.
pub fn bounce_normal(target: &ObbCollider, from: Vec2) -> Vec2 {
    let rel = target.origin - from;
    let p0 = project_onto(rel, target.axes[0]);
    let p1 = project_onto(rel, target.axes[1]);
    if target.axes[0].dot(p0).abs() > target.axes[1].dot(p1).abs() {
        p0
    } else {
        p1
    }
}

/// Mirror `velocity` across the surface with normal `normal`
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * project_onto(velocity, normal)
}
