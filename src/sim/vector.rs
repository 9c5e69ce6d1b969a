//! 2D vector helpers on top of `glam::Vec2`
//!
//! Thin named wrappers so the collision and motion code reads the same way
//! the math is usually written down.

use glam::Vec2;

#[inline]
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    a + b
}

#[inline]
pub fn component_multiply(a: Vec2, b: Vec2) -> Vec2 {
    a * b
}

#[inline]
pub fn scale(v: Vec2, s: f32) -> Vec2 {
    v * s
}

/// Unit vector in the direction of `v`; a zero vector stays zero
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    let len = v.length();
    if len == 0.0 { v } else { v / len }
}

#[inline]
pub fn dot(a: Vec2, b: Vec2) -> f32 {
    a.dot(b)
}

/// Rotate `v` by `angle` radians around `origin`
#[inline]
pub fn rotate(v: Vec2, angle: f32, origin: Vec2) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    let rel = v - origin;
    Vec2::new(rel.x * cos - rel.y * sin, rel.x * sin + rel.y * cos) + origin
}

/// Component of `v` along `axis` (zero when the axis is zero)
#[inline]
pub fn project_onto(v: Vec2, axis: Vec2) -> Vec2 {
    let len_sq = axis.length_squared();
    if len_sq == 0.0 {
        return Vec2::ZERO;
    }
    axis * (v.dot(axis) / len_sq)
}

#[inline]
pub fn squared_distance(p1: Vec2, p2: Vec2) -> f32 {
    (p2 - p1).length_squared()
}

/// Move `value` toward `target` by at most `step`
#[inline]
pub fn approach(value: f32, target: f32, step: f32) -> f32 {
    if value > target {
        (value - step).max(target)
    } else {
        (value + step).min(target)
    }
}
