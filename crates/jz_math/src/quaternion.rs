//! Unit quaternion rotations
//!
//! Stored as (x, y, z, w) with w the scalar part. Composition follows the
//! Hamilton product, so `a.compose(&b)` applies `b` first, then `a`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::{Matrix3, Vector3};

/// Rotation quaternion
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// Identity rotation
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Create a quaternion from raw components (not normalized)
    #[inline]
    pub const fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around `axis`
    ///
    /// A zero-length axis yields the identity.
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let Some(axis) = axis.try_normalized() else {
            return Self::IDENTITY;
        };
        let half = angle * 0.5;
        let s = half.sin();
        Self::from_xyzw(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Squared magnitude
    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Normalize to unit magnitude (identity if degenerate)
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude_squared().sqrt();
        if mag > 0.0 && mag.is_finite() {
            let inv = 1.0 / mag;
            Self::from_xyzw(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Conjugate; the inverse rotation for unit quaternions
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::from_xyzw(-self.x, -self.y, -self.z, self.w)
    }

    /// Compose two rotations: result applies `other` first, then `self`
    pub fn compose(&self, other: &Self) -> Self {
        let a = self;
        let b = other;
        Self::from_xyzw(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }

    /// Rotate a vector: v' = q v q*
    pub fn rotate(&self, v: Vector3) -> Vector3 {
        let u = Vector3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// Rotate a vector by the inverse of this rotation
    #[inline]
    pub fn inverse_rotate(&self, v: Vector3) -> Vector3 {
        self.conjugate().rotate(v)
    }

    /// Rotation matrix (row-major) equivalent to [`Self::rotate`]
    pub fn to_matrix(&self) -> Matrix3 {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, yy, zz) = (x * x2, y * y2, z * z2);
        let (xy, xz, yz) = (x * y2, x * z2, y * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);

        Matrix3::from_rows([
            [1.0 - (yy + zz), xy - wz, xz + wy],
            [xy + wz, 1.0 - (xx + zz), yz - wx],
            [xz - wy, yz + wx, 1.0 - (xx + yy)],
        ])
    }

    /// Advance the orientation by an angular velocity over `dt` seconds
    ///
    /// First-order integration `q += 0.5 * ω ⊗ q * dt`, renormalized.
    pub fn integrate(&self, angular_velocity: Vector3, dt: f32) -> Self {
        if angular_velocity.length_squared() < 1e-12 {
            return *self;
        }
        let omega = Self::from_xyzw(angular_velocity.x, angular_velocity.y, angular_velocity.z, 0.0);
        let dq = omega.compose(self);
        let half_dt = 0.5 * dt;
        Self::from_xyzw(
            self.x + dq.x * half_dt,
            self.y + dq.y * half_dt,
            self.z + dq.z * half_dt,
            self.w + dq.w * half_dt,
        )
        .normalize()
    }
}
