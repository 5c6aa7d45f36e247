//! Collision shapes
//!
//! Shapes are immutable and described in their own local space. Bodies share
//! them through an `Arc`, so one sphere or mesh can back many bodies.
//!
//! Every convex shape answers a support query: the point of the shape that is
//! farthest along a direction. The narrow-phase builds on that single query.

use jz_math::{BoundingBox, Vector3, ZERO_TOLERANCE};
use serde::{Deserialize, Serialize};

use crate::triangle_tree::TriangleTree;

/// A sphere centered on the local origin
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereShape {
    pub radius: f32,
}

impl SphereShape {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

/// A box centered on the local origin
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    /// Half the size on each axis
    pub half_extents: Vector3,
}

impl BoxShape {
    pub fn new(half_extents: Vector3) -> Self {
        Self { half_extents }
    }

    /// The eight corners
    pub fn corners(&self) -> [Vector3; 8] {
        let h = self.half_extents;
        [
            Vector3::new(-h.x, -h.y, -h.z),
            Vector3::new(h.x, -h.y, -h.z),
            Vector3::new(-h.x, h.y, -h.z),
            Vector3::new(h.x, h.y, -h.z),
            Vector3::new(-h.x, -h.y, h.z),
            Vector3::new(h.x, -h.y, h.z),
            Vector3::new(-h.x, h.y, h.z),
            Vector3::new(h.x, h.y, h.z),
        ]
    }
}

/// Convex hull of a point cloud
///
/// The points are not reduced to the hull; interior points are harmless
/// because they never win a support query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvexShape {
    points: Vec<Vector3>,
}

impl ConvexShape {
    pub fn new(points: Vec<Vector3>) -> Self {
        Self { points }
    }

    /// Hull of a box's corners
    pub fn from_box(half_extents: Vector3) -> Self {
        Self::new(BoxShape::new(half_extents).corners().to_vec())
    }

    pub fn points(&self) -> &[Vector3] {
        &self.points
    }
}

/// A single triangle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangleShape {
    pub p0: Vector3,
    pub p1: Vector3,
    pub p2: Vector3,
}

impl TriangleShape {
    pub fn new(p0: Vector3, p1: Vector3, p2: Vector3) -> Self {
        Self { p0, p1, p2 }
    }

    pub fn vertices(&self) -> [Vector3; 3] {
        [self.p0, self.p1, self.p2]
    }

    /// Support point; ties resolve toward `p0`, then `p1`
    pub fn support(&self, direction: Vector3) -> Vector3 {
        let d0 = self.p0.dot(direction);
        let d1 = self.p1.dot(direction);
        let d2 = self.p2.dot(direction);
        if d0 >= d1 {
            if d0 >= d2 {
                self.p0
            } else {
                self.p2
            }
        } else if d1 >= d2 {
            self.p1
        } else {
            self.p2
        }
    }
}

/// Discriminant of a [`CollisionShape`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Sphere,
    Box,
    Convex,
    Triangle,
    TriangleTree,
}

/// Any shape a body can collide with
#[derive(Clone, Debug)]
pub enum CollisionShape {
    Sphere(SphereShape),
    Box(BoxShape),
    Convex(ConvexShape),
    Triangle(TriangleShape),
    /// Concave triangle mesh
    TriangleTree(TriangleTree),
}

impl CollisionShape {
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere(SphereShape::new(radius))
    }

    pub fn cuboid(half_extents: Vector3) -> Self {
        Self::Box(BoxShape::new(half_extents))
    }

    pub fn convex(points: Vec<Vector3>) -> Self {
        Self::Convex(ConvexShape::new(points))
    }

    pub fn triangle(p0: Vector3, p1: Vector3, p2: Vector3) -> Self {
        Self::Triangle(TriangleShape::new(p0, p1, p2))
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Sphere(_) => ShapeKind::Sphere,
            Self::Box(_) => ShapeKind::Box,
            Self::Convex(_) => ShapeKind::Convex,
            Self::Triangle(_) => ShapeKind::Triangle,
            Self::TriangleTree(_) => ShapeKind::TriangleTree,
        }
    }

    /// Local-space bounding box; inverted if the shape is invalid
    pub fn bounding(&self) -> BoundingBox {
        if !self.is_valid() {
            return BoundingBox::INVERTED_MAX;
        }
        match self {
            Self::Sphere(s) => BoundingBox::from_center_half_extents(Vector3::ZERO, Vector3::splat(s.radius)),
            Self::Box(b) => BoundingBox::from_center_half_extents(Vector3::ZERO, b.half_extents),
            Self::Convex(c) => BoundingBox::from_points(c.points()),
            Self::Triangle(t) => BoundingBox::from_points(&t.vertices()),
            Self::TriangleTree(t) => t.bounding(),
        }
    }

    /// Farthest point of the shape along `direction`, in local space
    ///
    /// `direction` need not be normalized. For a triangle tree this is the
    /// matching corner of its bounding box, which is only an approximation.
    pub fn support(&self, direction: Vector3) -> Vector3 {
        match self {
            Self::Sphere(s) => match direction.try_normalized() {
                Some(d) => d * s.radius,
                None => Vector3::ZERO,
            },
            Self::Box(b) => b.half_extents.component_mul(direction.sign()),
            Self::Convex(c) => {
                let mut best = Vector3::ZERO;
                let mut best_dot = f32::NEG_INFINITY;
                for p in c.points() {
                    let d = p.dot(direction);
                    if d > best_dot {
                        best_dot = d;
                        best = *p;
                    }
                }
                best
            }
            Self::Triangle(t) => t.support(direction),
            Self::TriangleTree(t) => {
                let bounds = t.bounding();
                bounds.center() + bounds.half_extents().component_mul(direction.sign())
            }
        }
    }

    /// Diagonal of the local inverse inertia tensor for `inverse_mass`
    ///
    /// Zero when `inverse_mass` is zero, so immovable bodies never rotate.
    /// Shapes without a closed form use their bounding box.
    pub fn inverse_inertia(&self, inverse_mass: f32) -> Vector3 {
        if inverse_mass <= ZERO_TOLERANCE || !self.is_valid() {
            return Vector3::ZERO;
        }
        match self {
            Self::Sphere(s) => {
                let r2 = s.radius * s.radius;
                if r2 <= ZERO_TOLERANCE {
                    Vector3::ZERO
                } else {
                    Vector3::splat(5.0 * inverse_mass / (2.0 * r2))
                }
            }
            Self::Box(b) => box_inverse_inertia(b.half_extents, inverse_mass),
            _ => box_inverse_inertia(self.bounding().half_extents(), inverse_mass),
        }
    }

    /// Diagonal of the local inertia tensor for `mass`
    pub fn inertia(&self, mass: f32) -> Vector3 {
        if !self.is_valid() {
            return Vector3::ZERO;
        }
        let h = match self {
            Self::Sphere(s) => return Vector3::splat(0.4 * mass * s.radius * s.radius),
            Self::Box(b) => b.half_extents,
            _ => self.bounding().half_extents(),
        };
        let (x2, y2, z2) = (h.x * h.x, h.y * h.y, h.z * h.z);
        Vector3::new(y2 + z2, x2 + z2, x2 + y2) * (mass / 3.0)
    }

    /// True if rotating the shape about its origin leaves its bounds unchanged
    pub fn is_rotationally_invariant(&self) -> bool {
        matches!(self, Self::Sphere(_))
    }

    pub fn is_convex(&self) -> bool {
        !matches!(self, Self::TriangleTree(_))
    }

    /// Finite, non-negative dimensions and at least one primitive
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Sphere(s) => s.radius.is_finite() && s.radius >= 0.0,
            Self::Box(b) => {
                b.half_extents.is_finite()
                    && b.half_extents.x >= 0.0
                    && b.half_extents.y >= 0.0
                    && b.half_extents.z >= 0.0
            }
            Self::Convex(c) => !c.points().is_empty() && c.points().iter().all(|p| p.is_finite()),
            Self::Triangle(t) => t.vertices().iter().all(|p| p.is_finite()),
            Self::TriangleTree(t) => t.triangle_count() > 0,
        }
    }
}

impl From<SphereShape> for CollisionShape {
    fn from(s: SphereShape) -> Self {
        Self::Sphere(s)
    }
}

impl From<BoxShape> for CollisionShape {
    fn from(b: BoxShape) -> Self {
        Self::Box(b)
    }
}

impl From<ConvexShape> for CollisionShape {
    fn from(c: ConvexShape) -> Self {
        Self::Convex(c)
    }
}

impl From<TriangleShape> for CollisionShape {
    fn from(t: TriangleShape) -> Self {
        Self::Triangle(t)
    }
}

impl From<TriangleTree> for CollisionShape {
    fn from(t: TriangleTree) -> Self {
        Self::TriangleTree(t)
    }
}

fn box_inverse_inertia(h: Vector3, inverse_mass: f32) -> Vector3 {
    let (x2, y2, z2) = (h.x * h.x, h.y * h.y, h.z * h.z);
    let axis = |a: f32, b: f32| {
        let sum = a + b;
        if sum <= ZERO_TOLERANCE {
            0.0
        } else {
            3.0 * inverse_mass / sum
        }
    };
    Vector3::new(axis(y2, z2), axis(x2, z2), axis(x2, y2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_support() {
        let s = CollisionShape::sphere(2.0);
        let p = s.support(Vector3::new(0.0, 5.0, 0.0));
        assert!((p - Vector3::new(0.0, 2.0, 0.0)).length() < 1e-6);
        // Zero direction yields the center rather than NaN
        assert_eq!(s.support(Vector3::ZERO), Vector3::ZERO);
    }

    #[test]
    fn test_box_support_is_corner() {
        let b = CollisionShape::cuboid(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(b.support(Vector3::new(1.0, 1.0, 1.0)), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(b.support(Vector3::new(-1.0, 0.5, -0.1)), Vector3::new(-1.0, 2.0, -3.0));
    }

    #[test]
    fn test_box_support_sweep() {
        let half = Vector3::new(1.0, 2.0, 3.0);
        let b = CollisionShape::cuboid(half);
        let corners = BoxShape::new(half).corners();
        let steps = [-1.0, -0.5, 0.0, 0.5, 1.0];
        for &x in &steps {
            for &y in &steps {
                for &z in &steps {
                    // Includes axis directions such as (0, 1, 0) with zero components
                    let dir = Vector3::new(x, y, z);
                    let s = b.support(dir);
                    assert!(corners.contains(&s), "support {:?} along {:?} is not a corner", s, dir);
                    for c in &corners {
                        assert!(s.dot(dir) >= c.dot(dir) - 1e-6, "{:?} beats support along {:?}", c, dir);
                    }
                }
            }
        }
    }

    #[test]
    fn test_triangle_support_tie_breaks_to_p0() {
        let t = TriangleShape::new(Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 1.0, 0.0), Vector3::ZERO);
        assert_eq!(t.support(Vector3::Y), t.p0);
        assert_eq!(t.support(Vector3::X), t.p1);
        assert_eq!(t.support(-Vector3::Y), t.p2);
    }

    #[test]
    fn test_convex_support_picks_extreme_point() {
        let c = CollisionShape::convex(vec![Vector3::ZERO, Vector3::new(3.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0)]);
        assert_eq!(c.support(Vector3::X), Vector3::new(3.0, 0.0, 0.0));
        assert_eq!(c.support(Vector3::Y), Vector3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_bounding() {
        let s = CollisionShape::sphere(1.5);
        assert_eq!(s.bounding().max, Vector3::splat(1.5));
        let t = CollisionShape::triangle(Vector3::ZERO, Vector3::X, Vector3::new(0.0, 0.0, 2.0));
        assert_eq!(t.bounding().max, Vector3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_invalid_shape_has_inverted_bounds() {
        assert!(CollisionShape::sphere(-1.0).bounding().is_inverted());
        assert!(CollisionShape::sphere(f32::NAN).bounding().is_inverted());
        assert!(CollisionShape::convex(Vec::new()).bounding().is_inverted());
        assert!(!CollisionShape::sphere(0.0).bounding().is_inverted());
    }

    #[test]
    fn test_sphere_inverse_inertia() {
        let s = CollisionShape::sphere(1.0);
        let inv = s.inverse_inertia(1.0);
        assert!((inv.x - 2.5).abs() < 1e-6);
        let i = s.inertia(1.0);
        assert!((i.x * inv.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_box_inertia_matches_inverse() {
        let b = CollisionShape::cuboid(Vector3::new(1.0, 2.0, 0.5));
        let i = b.inertia(2.0);
        let inv = b.inverse_inertia(0.5);
        assert!((i.x * inv.x - 1.0).abs() < 1e-5);
        assert!((i.y * inv.y - 1.0).abs() < 1e-5);
        assert!((i.z * inv.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_inverse_mass_has_zero_inverse_inertia() {
        assert_eq!(CollisionShape::cuboid(Vector3::ONE).inverse_inertia(0.0), Vector3::ZERO);
    }

    #[test]
    fn test_only_spheres_are_rotationally_invariant() {
        assert!(CollisionShape::sphere(1.0).is_rotationally_invariant());
        assert!(!CollisionShape::cuboid(Vector3::ONE).is_rotationally_invariant());
    }
}
