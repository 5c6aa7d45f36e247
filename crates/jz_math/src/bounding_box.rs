//! Axis-aligned bounding box

use serde::{Deserialize, Serialize};

use crate::{CoordinateFrame3D, Vector3};

/// Axis-aligned bounding box
///
/// An *inverted* box (any `min` component greater than its `max`) is the
/// empty box: it never overlaps anything and acts as the identity for
/// [`BoundingBox::union`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner (all components are minimums)
    pub min: Vector3,
    /// Maximum corner (all components are maximums)
    pub max: Vector3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::INVERTED_MAX
    }
}

impl BoundingBox {
    /// The maximally inverted (empty) box
    pub const INVERTED_MAX: Self = Self {
        min: Vector3::splat(f32::MAX),
        max: Vector3::splat(-f32::MAX),
    };

    /// Create a new box from min and max corners
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self { min, max }
    }

    /// Create a box centered at a position with given half-extents
    pub fn from_center_half_extents(center: Vector3, half_extents: Vector3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Zero-size box at a point
    pub fn from_point(p: Vector3) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box containing every point (inverted if `points` is empty)
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector3>) -> Self {
        points
            .into_iter()
            .fold(Self::INVERTED_MAX, |b, p| b.grow_point(*p))
    }

    /// True for the empty box, or if any component is NaN
    #[inline]
    pub fn is_inverted(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z)
    }

    /// Get the center of the box
    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents (half the size in each dimension)
    pub fn half_extents(&self) -> Vector3 {
        (self.max - self.min) * 0.5
    }

    /// Get the full size in each dimension
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    /// Surface area (0 for inverted boxes)
    pub fn surface_area(&self) -> f32 {
        if self.is_inverted() {
            return 0.0;
        }
        let s = self.size();
        2.0 * (s.x * s.y + s.y * s.z + s.z * s.x)
    }

    /// Index of the axis with the largest extent
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }

    /// Inclusive overlap test; inverted boxes never overlap
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.is_inverted() || other.is_inverted() {
            return false;
        }
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Check if a point is inside or on the box
    pub fn contains_point(&self, p: Vector3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min_components(other.min),
            max: self.max.max_components(other.max),
        }
    }

    /// Smallest box containing `self` and `p`
    pub fn grow_point(&self, p: Vector3) -> Self {
        Self {
            min: self.min.min_components(p),
            max: self.max.max_components(p),
        }
    }

    /// Box grown by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        if self.is_inverted() {
            return *self;
        }
        let m = Vector3::splat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Translate the box by a delta
    pub fn translated(&self, delta: Vector3) -> Self {
        if self.is_inverted() {
            return *self;
        }
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Conservative world box of this local box under `frame`
    ///
    /// Rotated boxes are over-approximated by the box around the rotated
    /// half-extents.
    pub fn transformed(&self, frame: &CoordinateFrame3D) -> Self {
        if self.is_inverted() {
            return *self;
        }
        let center = frame.transform_point(self.center());
        let extent = frame.orientation.to_matrix().abs().mul_vector(self.half_extents());
        Self::from_center_half_extents(center, extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Quaternion;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_from_center_half_extents() {
        let b = BoundingBox::from_center_half_extents(Vector3::new(1.0, 2.0, 3.0), Vector3::splat(0.5));
        assert_eq!(b.min, Vector3::new(0.5, 1.5, 2.5));
        assert_eq!(b.max, Vector3::new(1.5, 2.5, 3.5));
        assert_eq!(b.center(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_inverted_never_overlaps() {
        let inverted = BoundingBox::INVERTED_MAX;
        let everything = BoundingBox::new(Vector3::splat(-1e30), Vector3::splat(1e30));
        assert!(inverted.is_inverted());
        assert!(!inverted.overlaps(&everything));
        assert!(!everything.overlaps(&inverted));
        assert!(!inverted.overlaps(&inverted));
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let a = BoundingBox::new(Vector3::ZERO, Vector3::ONE);
        let touching = BoundingBox::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(2.0, 1.0, 1.0));
        let apart = BoundingBox::new(Vector3::new(1.1, 0.0, 0.0), Vector3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&touching));
        assert!(!a.overlaps(&apart));
    }

    #[test]
    fn test_point_box_overlaps() {
        let p = BoundingBox::from_point(Vector3::new(0.5, 0.5, 0.5));
        assert!(!p.is_inverted());
        assert!(p.overlaps(&BoundingBox::new(Vector3::ZERO, Vector3::ONE)));
    }

    #[test]
    fn test_union_with_inverted_is_identity() {
        let a = BoundingBox::new(Vector3::ZERO, Vector3::ONE);
        assert_eq!(BoundingBox::INVERTED_MAX.union(&a), a);
    }

    #[test]
    fn test_from_points() {
        let pts = [Vector3::new(1.0, -1.0, 0.0), Vector3::new(-2.0, 3.0, 0.5)];
        let b = BoundingBox::from_points(&pts);
        assert_eq!(b.min, Vector3::new(-2.0, -1.0, 0.0));
        assert_eq!(b.max, Vector3::new(1.0, 3.0, 0.5));
        assert!(BoundingBox::from_points(&[]).is_inverted());
    }

    #[test]
    fn test_transformed_translation_only() {
        let b = BoundingBox::from_center_half_extents(Vector3::ZERO, Vector3::new(1.0, 2.0, 3.0));
        let frame = CoordinateFrame3D::from_translation(Vector3::new(5.0, 0.0, 0.0));
        let t = b.transformed(&frame);
        assert_eq!(t.min, Vector3::new(4.0, -2.0, -3.0));
        assert_eq!(t.max, Vector3::new(6.0, 2.0, 3.0));
    }

    #[test]
    fn test_transformed_rotation_is_conservative() {
        let b = BoundingBox::from_center_half_extents(Vector3::ZERO, Vector3::ONE);
        let frame = CoordinateFrame3D::new(Quaternion::from_axis_angle(Vector3::Y, FRAC_PI_4), Vector3::ZERO);
        let t = b.transformed(&frame);
        let expected = std::f32::consts::SQRT_2;
        assert!((t.max.x - expected).abs() < 1e-5);
        assert!((t.max.y - 1.0).abs() < 1e-5);
        assert!((t.max.z - expected).abs() < 1e-5);
    }

    #[test]
    fn test_longest_axis() {
        let b = BoundingBox::new(Vector3::ZERO, Vector3::new(1.0, 5.0, 2.0));
        assert_eq!(b.longest_axis(), 1);
    }
}
