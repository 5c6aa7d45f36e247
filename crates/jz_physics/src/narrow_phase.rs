//! Narrow-phase contact generation
//!
//! Dispatches a shape pair to the cheapest exact test that handles it:
//! closed-form tests for spheres and boxes, GJK + EPA for any other convex
//! pair, and a per-triangle pass for triangle trees.

use jz_math::{CoordinateFrame3D, Vector3};

use crate::collision::{box_vs_box, sphere_vs_box, sphere_vs_sphere, sphere_vs_triangle};
use crate::contact::WorldContactPoint;
use crate::gjk;
use crate::shapes::{CollisionShape, TriangleShape};
use crate::triangle_tree::TriangleTree;

/// Contacts between shape A at `frame_a` and shape B at `frame_b`
///
/// Every contact's normal points from A toward B. Box pairs yield a manifold
/// of up to four points and other convex pairs at most one contact; a
/// triangle tree yields the contacts of every touching triangle. Two
/// triangle trees never collide.
pub fn test_collision(
    shape_a: &CollisionShape,
    frame_a: &CoordinateFrame3D,
    shape_b: &CollisionShape,
    frame_b: &CoordinateFrame3D,
) -> Vec<WorldContactPoint> {
    if !shape_a.is_valid() || !shape_b.is_valid() {
        return Vec::new();
    }
    match (shape_a, shape_b) {
        (CollisionShape::TriangleTree(_), CollisionShape::TriangleTree(_)) => Vec::new(),
        (CollisionShape::TriangleTree(tree), _) => test_concave(tree, frame_a, shape_b, frame_b),
        (_, CollisionShape::TriangleTree(tree)) => test_concave(tree, frame_b, shape_a, frame_a)
            .into_iter()
            .map(|c| c.flipped())
            .collect(),
        _ => test_convex(shape_a, frame_a, shape_b, frame_b),
    }
}

/// True if the shapes overlap, skipping contact generation for convex pairs
pub fn test_overlap(
    shape_a: &CollisionShape,
    frame_a: &CoordinateFrame3D,
    shape_b: &CollisionShape,
    frame_b: &CoordinateFrame3D,
) -> bool {
    if !shape_a.is_valid() || !shape_b.is_valid() {
        return false;
    }
    if shape_a.is_convex() && shape_b.is_convex() {
        gjk::intersects(shape_a, frame_a, shape_b, frame_b)
    } else {
        !test_collision(shape_a, frame_a, shape_b, frame_b).is_empty()
    }
}

/// Contacts between two convex shapes
///
/// A box pair returns its clipped face manifold; every other pair returns
/// at most one contact.
pub fn test_convex(
    shape_a: &CollisionShape,
    frame_a: &CoordinateFrame3D,
    shape_b: &CollisionShape,
    frame_b: &CoordinateFrame3D,
) -> Vec<WorldContactPoint> {
    use CollisionShape::{Box, Sphere, Triangle};

    let single = match (shape_a, shape_b) {
        (Sphere(a), Sphere(b)) => sphere_vs_sphere(frame_a.translation, a.radius, frame_b.translation, b.radius),
        (Sphere(s), Box(b)) => sphere_vs_box(frame_a.translation, s.radius, b.half_extents, frame_b),
        (Box(b), Sphere(s)) => {
            sphere_vs_box(frame_b.translation, s.radius, b.half_extents, frame_a).map(|c| c.flipped())
        }
        (Sphere(s), Triangle(t)) => sphere_vs_triangle(frame_a.translation, s.radius, world_triangle(t, frame_b)),
        (Triangle(t), Sphere(s)) => {
            sphere_vs_triangle(frame_b.translation, s.radius, world_triangle(t, frame_a)).map(|c| c.flipped())
        }
        (Box(a), Box(b)) => return box_vs_box(a.half_extents, frame_a, b.half_extents, frame_b),
        _ => gjk::penetration(shape_a, frame_a, shape_b, frame_b),
    };
    single.into_iter().collect()
}

/// Contacts between a triangle tree (A) and a convex shape (B)
///
/// The convex shape's world box is carried into the tree's local space to
/// select candidate triangles, each of which is then tested on its own.
fn test_concave(
    tree: &TriangleTree,
    tree_frame: &CoordinateFrame3D,
    shape: &CollisionShape,
    frame: &CoordinateFrame3D,
) -> Vec<WorldContactPoint> {
    let world_bounds = shape.bounding().transformed(frame);
    let local_bounds = world_bounds.transformed(&tree_frame.inverse());

    tree.query(&local_bounds)
        .into_iter()
        .flat_map(|i| {
            let [p0, p1, p2] = world_triangle(&tree.triangle(i), tree_frame);
            let triangle = CollisionShape::Triangle(TriangleShape::new(p0, p1, p2));
            test_convex(&triangle, &CoordinateFrame3D::IDENTITY, shape, frame)
        })
        .collect()
}

fn world_triangle(t: &TriangleShape, frame: &CoordinateFrame3D) -> [Vector3; 3] {
    t.vertices().map(|p| frame.transform_point(p))
}
