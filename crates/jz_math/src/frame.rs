//! Rigid coordinate frame (orientation + translation)
//!
//! A frame maps local points to world space by rotating, then translating.

use serde::{Deserialize, Serialize};

use crate::{Quaternion, Vector3};

/// Orientation and translation of a rigid object
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinateFrame3D {
    /// Rotation from local to world space
    pub orientation: Quaternion,
    /// Position of the local origin in world space
    pub translation: Vector3,
}

impl Default for CoordinateFrame3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CoordinateFrame3D {
    pub const IDENTITY: Self = Self {
        orientation: Quaternion::IDENTITY,
        translation: Vector3::ZERO,
    };

    pub fn new(orientation: Quaternion, translation: Vector3) -> Self {
        Self { orientation, translation }
    }

    /// Frame with no rotation
    pub fn from_translation(translation: Vector3) -> Self {
        Self {
            orientation: Quaternion::IDENTITY,
            translation,
        }
    }

    /// Local point to world space
    #[inline]
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        self.orientation.rotate(p) + self.translation
    }

    /// Local direction to world space (no translation)
    #[inline]
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        self.orientation.rotate(v)
    }

    /// World point to local space
    #[inline]
    pub fn inverse_transform_point(&self, p: Vector3) -> Vector3 {
        self.orientation.inverse_rotate(p - self.translation)
    }

    /// World direction to local space
    #[inline]
    pub fn inverse_transform_vector(&self, v: Vector3) -> Vector3 {
        self.orientation.inverse_rotate(v)
    }

    /// Compose two frames: applies `other` first, then `self`
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            orientation: self.orientation.compose(&other.orientation).normalize(),
            translation: self.transform_point(other.translation),
        }
    }

    /// Frame that undoes this one
    pub fn inverse(&self) -> Self {
        let inv = self.orientation.conjugate();
        Self {
            orientation: inv,
            translation: inv.rotate(-self.translation),
        }
    }
}
