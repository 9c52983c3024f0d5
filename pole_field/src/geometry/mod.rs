//! Vector math and bounding volumes shared by the field and the engine.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A point or direction in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const X_AXIS: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y_AXIS: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z_AXIS: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared length.
    pub fn mag_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Euclidean length.
    pub fn magnitude(&self) -> f32 {
        self.mag_squared().sqrt()
    }

    pub fn dot(&self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn distance_to_squared(&self, other: Vec3) -> f32 {
        (*self - other).mag_squared()
    }

    pub fn distance_to(&self, other: Vec3) -> f32 {
        (*self - other).magnitude()
    }

    /// Unit vector in the same direction. A zero vector stays zero.
    pub fn normalize(&self) -> Vec3 {
        self.normalize_to(1.0)
    }

    /// Vector in the same direction with the given length. A zero vector stays zero.
    pub fn normalize_to(&self, length: f32) -> Vec3 {
        let mag = self.magnitude();
        if mag > 0.0 {
            *self * (length / mag)
        } else {
            *self
        }
    }

    /// Linear interpolation toward `target` by factor `t`.
    pub fn interpolate_to(&self, target: Vec3, t: f32) -> Vec3 {
        *self + (target - *self) * t
    }

    /// Component-wise product.
    pub fn scale_by(&self, factors: Vec3) -> Vec3 {
        Vec3::new(self.x * factors.x, self.y * factors.y, self.z * factors.z)
    }

    /// Projection onto the XZ ground plane.
    pub fn to_2d_xz(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }

    /// Append the straight-line sub-steps from `self` to `target`.
    ///
    /// Intermediate points are spaced `step` apart; `target` itself is always
    /// appended, `self` never is.
    pub fn split_into_segments(&self, target: Vec3, step: f32, out: &mut Vec<Vec3>) {
        let mut dist = self.distance_to(target);
        if step > 0.0 && dist > step {
            let delta = (target - *self).normalize_to(step);
            let mut pos = *self;
            while dist > step {
                pos += delta;
                out.push(pos);
                dist -= step;
            }
        }
        out.push(target);
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// A point or direction in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector in the same direction. A zero vector stays zero.
    pub fn normalize(&self) -> Vec2 {
        let mag = self.magnitude();
        if mag > 0.0 {
            Vec2::new(self.x / mag, self.y / mag)
        } else {
            *self
        }
    }

    /// Angle in radians between two unit vectors, in `[0, PI]`.
    pub fn angle_between(&self, other: Vec2) -> f32 {
        self.dot(other).clamp(-1.0, 1.0).acos()
    }

    /// Lift into 3D on the XZ plane (`y` becomes `z`).
    pub fn to_3d_xz(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.y)
    }
}

/// Axis-aligned box described by its centre and half-size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec3,
    pub extent: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, extent: Vec3) -> Self {
        Self { center, extent }
    }

    /// Check whether a point lies inside the box (boundary inclusive).
    pub fn contains(&self, p: Vec3) -> bool {
        let d = p - self.center;
        d.x.abs() <= self.extent.x && d.y.abs() <= self.extent.y && d.z.abs() <= self.extent.z
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            extent: Vec3::new(1000.0, 400.0, 500.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_to() {
        let v = Vec3::new(3.0, 0.0, 4.0).normalize_to(10.0);
        assert!((v.magnitude() - 10.0).abs() < 1e-4);
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_split_into_segments() {
        let mut out = Vec::new();
        Vec3::ZERO.split_into_segments(Vec3::new(20.0, 0.0, 0.0), 5.0, &mut out);

        assert_eq!(out.len(), 4);
        assert!((out[0].x - 5.0).abs() < 1e-4);
        assert_eq!(out[3], Vec3::new(20.0, 0.0, 0.0));
    }

    #[test]
    fn test_split_short_segment_only_adds_target() {
        let mut out = Vec::new();
        Vec3::ZERO.split_into_segments(Vec3::new(3.0, 0.0, 0.0), 5.0, &mut out);
        assert_eq!(out, vec![Vec3::new(3.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_angle_between() {
        let a = Vec2::new(1.0, 0.0);
        let b = Vec2::new(0.0, 1.0);
        assert!((a.angle_between(b) - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!(a.angle_between(a).abs() < 1e-3);
    }

    #[test]
    fn test_aabb_contains() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 10.0));
        assert!(bounds.contains(Vec3::new(10.0, -10.0, 0.0)));
        assert!(!bounds.contains(Vec3::new(10.5, 0.0, 0.0)));
    }
}
