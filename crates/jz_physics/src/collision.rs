//! Collision filtering and closed-form contact tests
//!
//! Provides the body-type bitmask filter used by the broadphase, and the
//! exact sphere and box tests the narrow-phase prefers over GJK.

use bitflags::bitflags;
use jz_math::geometry::{closest_point_on_triangle, closest_points_between_segments, triangle_normal};
use jz_math::{CoordinateFrame3D, Vector3, LOOSE_TOLERANCE, ZERO_TOLERANCE};

use crate::contact::WorldContactPoint;

bitflags! {
    /// Body type bits
    ///
    /// The low three bits are the motion types the world understands. The
    /// remaining bits are free for game categories (debris, pickups, ...)
    /// and only take part in filtering.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BodyType: u32 {
        /// Never moved by the simulation
        const STATIC = 1 << 0;
        /// Moved by gravity, velocity and collisions
        const DYNAMIC = 1 << 1;
        /// Moved only by its own velocity
        const KINEMATIC = 1 << 2;
        /// Every bit (collide with everything)
        const ALL = 0xFFFFFFFF;
    }
}

/// Which bodies a body may collide with
///
/// Two bodies A and B are paired only if:
/// - (A.body_type & B.collides_with) != 0, AND
/// - (B.body_type & A.collides_with) != 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CollisionFilter {
    /// What this body is
    pub body_type: BodyType,
    /// What this body accepts contacts from
    pub collides_with: BodyType,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            body_type: BodyType::DYNAMIC,
            collides_with: BodyType::ALL,
        }
    }
}

impl CollisionFilter {
    pub fn new(body_type: BodyType, collides_with: BodyType) -> Self {
        Self {
            body_type,
            collides_with,
        }
    }

    /// Both sides must accept the other
    pub fn collides_with(&self, other: &Self) -> bool {
        self.body_type.intersects(other.collides_with) && other.body_type.intersects(self.collides_with)
    }

    /// Static level geometry that everything may hit
    pub fn static_world() -> Self {
        Self::new(BodyType::STATIC, BodyType::ALL)
    }
}

/// Sphere A against sphere B (world-space centers)
///
/// Strict: spheres exactly touching do not collide. Coincident centers have
/// no defined normal and produce no contact.
pub fn sphere_vs_sphere(
    center_a: Vector3,
    radius_a: f32,
    center_b: Vector3,
    radius_b: f32,
) -> Option<WorldContactPoint> {
    let delta = center_b - center_a;
    let radius_sum = radius_a + radius_b;
    if delta.length_squared() >= radius_sum * radius_sum {
        return None;
    }
    let normal = delta.try_normalized()?;
    Some(WorldContactPoint::new(
        center_a + normal * radius_a,
        center_b - normal * radius_b,
        normal,
    ))
}

/// Sphere A against box B
///
/// The sphere is tested in the box's local space. A center inside the box is
/// pushed out through the nearest face.
pub fn sphere_vs_box(
    center: Vector3,
    radius: f32,
    half_extents: Vector3,
    box_frame: &CoordinateFrame3D,
) -> Option<WorldContactPoint> {
    let local = box_frame.inverse_transform_point(center);
    let closest = local.clamp_components(-half_extents, half_extents);
    let delta = local - closest;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }

    // Box-to-sphere normal and the box surface point, both local
    let (box_normal, surface) = if dist_sq > ZERO_TOLERANCE * ZERO_TOLERANCE {
        (delta * (1.0 / dist_sq.sqrt()), closest)
    } else {
        // Center inside: leave through the face with the least depth
        let depth = half_extents - local.abs();
        let axis = if depth.x <= depth.y && depth.x <= depth.z {
            0
        } else if depth.y <= depth.z {
            1
        } else {
            2
        };
        let mut normal = Vector3::ZERO;
        normal[axis] = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
        let mut surface = local;
        surface[axis] = half_extents[axis] * normal[axis];
        (normal, surface)
    };

    let normal = -box_frame.transform_vector(box_normal);
    Some(WorldContactPoint::new(
        center + normal * radius,
        box_frame.transform_point(surface),
        normal,
    ))
}

/// Sphere A against triangle B (world-space vertices)
///
/// A center lying on the triangle uses the face normal. Degenerate
/// triangles in that case produce no contact.
pub fn sphere_vs_triangle(center: Vector3, radius: f32, triangle: [Vector3; 3]) -> Option<WorldContactPoint> {
    let [p0, p1, p2] = triangle;
    let closest = closest_point_on_triangle(center, p0, p1, p2);
    let delta = center - closest;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }

    let triangle_to_sphere = if dist_sq > ZERO_TOLERANCE * ZERO_TOLERANCE {
        delta * (1.0 / dist_sq.sqrt())
    } else {
        triangle_normal(p0, p1, p2)?
    };

    let normal = -triangle_to_sphere;
    Some(WorldContactPoint::new(center + normal * radius, closest, normal))
}

/// Face axes win over edge axes unless the edge overlap is clearly smaller
const RELATIVE_AXIS_BIAS: f32 = 0.95;
const ABSOLUTE_AXIS_BIAS: f32 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq)]
enum SatAxis {
    FaceA(usize),
    FaceB(usize),
    Edge(usize, usize),
}

/// Box A against box B by the separating axis test
///
/// Tests the 15 candidate axes and keeps the one with the least overlap,
/// preferring face axes within a small tolerance. On a face axis the
/// incident face of the other box is clipped against the reference face,
/// which yields up to four contact points. An edge axis yields the single
/// point between the two closest edges.
pub fn box_vs_box(
    half_a: Vector3,
    frame_a: &CoordinateFrame3D,
    half_b: Vector3,
    frame_b: &CoordinateFrame3D,
) -> Vec<WorldContactPoint> {
    let axes_a = box_axes(frame_a);
    let axes_b = box_axes(frame_b);
    let t = frame_b.translation - frame_a.translation;
    let overlap_on = |axis: Vector3| -> f32 {
        project_box(half_a, &axes_a, axis) + project_box(half_b, &axes_b, axis) - t.dot(axis).abs()
    };

    let mut face_a = (f32::MAX, 0);
    for (i, axis) in axes_a.iter().enumerate() {
        let overlap = overlap_on(*axis);
        if overlap <= 0.0 {
            return Vec::new();
        }
        if overlap < face_a.0 {
            face_a = (overlap, i);
        }
    }
    let mut face_b = (f32::MAX, 0);
    for (j, axis) in axes_b.iter().enumerate() {
        let overlap = overlap_on(*axis);
        if overlap <= 0.0 {
            return Vec::new();
        }
        if overlap < face_b.0 {
            face_b = (overlap, j);
        }
    }
    let mut edge: Option<(f32, usize, usize, Vector3)> = None;
    for (i, a) in axes_a.iter().enumerate() {
        for (j, b) in axes_b.iter().enumerate() {
            // Parallel edges give no new axis
            let Some(axis) = a.cross(*b).try_normalized() else {
                continue;
            };
            let overlap = overlap_on(axis);
            if overlap <= 0.0 {
                return Vec::new();
            }
            if edge.map_or(true, |(best, ..)| overlap < best) {
                edge = Some((overlap, i, j, axis));
            }
        }
    }

    let clearly_less = |candidate: f32, current: f32| candidate < current * RELATIVE_AXIS_BIAS - ABSOLUTE_AXIS_BIAS;
    let (mut overlap, mut kind, mut axis) = (face_a.0, SatAxis::FaceA(face_a.1), axes_a[face_a.1]);
    if clearly_less(face_b.0, overlap) {
        (overlap, kind, axis) = (face_b.0, SatAxis::FaceB(face_b.1), axes_b[face_b.1]);
    }
    if let Some((edge_overlap, i, j, edge_axis)) = edge {
        if clearly_less(edge_overlap, overlap) {
            (overlap, kind, axis) = (edge_overlap, SatAxis::Edge(i, j), edge_axis);
        }
    }
    let normal = if axis.dot(t) < 0.0 { -axis } else { axis };

    let manifold = match kind {
        SatAxis::FaceA(i) => {
            let reference = FaceBox::new(half_a, frame_a, axes_a);
            let incident = FaceBox::new(half_b, frame_b, axes_b);
            clip_incident_face(&reference, i, normal, &incident)
                .into_iter()
                .map(|(on_reference, on_incident)| WorldContactPoint::new(on_reference, on_incident, normal))
                .collect()
        }
        SatAxis::FaceB(j) => {
            let reference = FaceBox::new(half_b, frame_b, axes_b);
            let incident = FaceBox::new(half_a, frame_a, axes_a);
            clip_incident_face(&reference, j, -normal, &incident)
                .into_iter()
                .map(|(on_reference, on_incident)| WorldContactPoint::new(on_incident, on_reference, normal))
                .collect()
        }
        SatAxis::Edge(i, j) => {
            let (a0, a1) = support_edge(half_a, frame_a, &axes_a, i, normal);
            let (b0, b1) = support_edge(half_b, frame_b, &axes_b, j, -normal);
            let (on_a, on_b) = closest_points_between_segments(a0, a1, b0, b1);
            let mid = (on_a + on_b) * 0.5;
            vec![WorldContactPoint::new(
                mid + normal * (overlap * 0.5),
                mid - normal * (overlap * 0.5),
                normal,
            )]
        }
    };

    if manifold.is_empty() {
        // Clipping lost every point to rounding
        vec![feature_contact(half_a, frame_a, half_b, frame_b, normal, overlap)]
    } else {
        manifold
    }
}

/// A box posed in world space
struct FaceBox {
    half: Vector3,
    center: Vector3,
    axes: [Vector3; 3],
}

impl FaceBox {
    fn new(half: Vector3, frame: &CoordinateFrame3D, axes: [Vector3; 3]) -> Self {
        Self {
            half,
            center: frame.translation,
            axes,
        }
    }
}

/// Clip the incident box's face against reference face `axis`
///
/// `normal` is the reference face's outward normal, pointing at the
/// incident box. Returns `(point on reference face, incident point)` for
/// every clipped point below the reference face, at most four.
fn clip_incident_face(
    reference: &FaceBox,
    axis: usize,
    normal: Vector3,
    incident: &FaceBox,
) -> Vec<(Vector3, Vector3)> {
    let face_center = reference.center + normal * reference.half[axis];

    // The incident face is the one most anti-parallel to the normal
    let mut k = 0;
    for candidate in 1..3 {
        if incident.axes[candidate].dot(normal).abs() > incident.axes[k].dot(normal).abs() {
            k = candidate;
        }
    }
    let incident_normal = if incident.axes[k].dot(normal) > 0.0 {
        -incident.axes[k]
    } else {
        incident.axes[k]
    };
    let center = incident.center + incident_normal * incident.half[k];
    let eu = incident.axes[(k + 1) % 3] * incident.half[(k + 1) % 3];
    let ev = incident.axes[(k + 2) % 3] * incident.half[(k + 2) % 3];
    let mut polygon = vec![center + eu + ev, center - eu + ev, center - eu - ev, center + eu - ev];

    let side_u = reference.axes[(axis + 1) % 3];
    let side_v = reference.axes[(axis + 2) % 3];
    for (side, extent) in [(side_u, reference.half[(axis + 1) % 3]), (side_v, reference.half[(axis + 2) % 3])] {
        let offset = side.dot(reference.center);
        polygon = clip_polygon(&polygon, side, offset + extent);
        polygon = clip_polygon(&polygon, -side, extent - offset);
    }

    let points: Vec<(Vector3, Vector3)> = polygon
        .into_iter()
        .filter_map(|p| {
            let separation = (p - face_center).dot(normal);
            (separation <= 0.0).then(|| (p - normal * separation, p))
        })
        .collect();
    reduce_manifold(points, side_u, side_v)
}

/// Sutherland-Hodgman step: keep the part of `points` with `p . normal <= limit`
fn clip_polygon(points: &[Vector3], normal: Vector3, limit: f32) -> Vec<Vector3> {
    let mut out = Vec::with_capacity(points.len() + 1);
    for (i, &p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let dp = p.dot(normal) - limit;
        let dq = q.dot(normal) - limit;
        if dp <= 0.0 {
            out.push(p);
        }
        if (dp < 0.0 && dq > 0.0) || (dp > 0.0 && dq < 0.0) {
            out.push(p + (q - p) * (dp / (dp - dq)));
        }
    }
    out
}

/// Keep the extreme point in each diagonal direction of the face
fn reduce_manifold(points: Vec<(Vector3, Vector3)>, u: Vector3, v: Vector3) -> Vec<(Vector3, Vector3)> {
    if points.len() <= 4 {
        return points;
    }
    let mut kept: Vec<usize> = Vec::with_capacity(4);
    for direction in [u + v, u - v, v - u, -u - v] {
        let mut best = 0;
        for (i, (_, p)) in points.iter().enumerate() {
            if p.dot(direction) > points[best].1.dot(direction) {
                best = i;
            }
        }
        if !kept.contains(&best) {
            kept.push(best);
        }
    }
    kept.into_iter().map(|i| points[i]).collect()
}

/// The edge along `along` farthest in `direction`
fn support_edge(
    half: Vector3,
    frame: &CoordinateFrame3D,
    axes: &[Vector3; 3],
    along: usize,
    direction: Vector3,
) -> (Vector3, Vector3) {
    let mut center = frame.translation;
    for k in (0..3).filter(|&k| k != along) {
        let sign = if axes[k].dot(direction) >= 0.0 { 1.0 } else { -1.0 };
        center += axes[k] * (half[k] * sign);
    }
    let extent = axes[along] * half[along];
    (center - extent, center + extent)
}

/// Single contact on the smaller touching feature
fn feature_contact(
    half_a: Vector3,
    frame_a: &CoordinateFrame3D,
    half_b: Vector3,
    frame_b: &CoordinateFrame3D,
    normal: Vector3,
    overlap: f32,
) -> WorldContactPoint {
    let (feature_a, count_a, span_a) = deepest_feature(half_a, frame_a, normal);
    let (feature_b, count_b, span_b) = deepest_feature(half_b, frame_b, -normal);

    let use_b = count_b < count_a || (count_b == count_a && span_b <= span_a);
    if use_b {
        WorldContactPoint::new(feature_b + normal * overlap, feature_b, normal)
    } else {
        WorldContactPoint::new(feature_a, feature_a - normal * overlap, normal)
    }
}

fn box_axes(frame: &CoordinateFrame3D) -> [Vector3; 3] {
    [
        frame.transform_vector(Vector3::X),
        frame.transform_vector(Vector3::Y),
        frame.transform_vector(Vector3::Z),
    ]
}

fn project_box(half: Vector3, axes: &[Vector3; 3], axis: Vector3) -> f32 {
    half.x * axes[0].dot(axis).abs() + half.y * axes[1].dot(axis).abs() + half.z * axes[2].dot(axis).abs()
}

/// Centroid, vertex count and spread of the corners farthest along `direction`
fn deepest_feature(half: Vector3, frame: &CoordinateFrame3D, direction: Vector3) -> (Vector3, usize, f32) {
    let corners = crate::shapes::BoxShape::new(half)
        .corners()
        .map(|c| frame.transform_point(c));
    let max = corners
        .iter()
        .map(|c| c.dot(direction))
        .fold(f32::NEG_INFINITY, f32::max);

    let mut sum = Vector3::ZERO;
    let mut count = 0;
    for c in corners.iter().filter(|c| c.dot(direction) >= max - LOOSE_TOLERANCE) {
        sum += *c;
        count += 1;
    }
    let centroid = sum * (1.0 / count.max(1) as f32);
    let span = corners
        .iter()
        .filter(|c| c.dot(direction) >= max - LOOSE_TOLERANCE)
        .map(|c| (*c - centroid).length_squared())
        .fold(0.0, f32::max);
    (centroid, count, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jz_math::Quaternion;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, SQRT_2};

    #[test]
    fn test_filter_is_symmetric() {
        let dynamic = CollisionFilter::new(BodyType::DYNAMIC, BodyType::ALL);
        let ghost = CollisionFilter::new(BodyType::DYNAMIC, BodyType::STATIC);
        let ground = CollisionFilter::static_world();

        assert!(dynamic.collides_with(&ground));
        assert!(ground.collides_with(&dynamic));
        // The ghost only accepts static bodies
        assert!(!ghost.collides_with(&dynamic));
        assert!(!dynamic.collides_with(&ghost));
        assert!(ghost.collides_with(&ground));
    }

    #[test]
    fn test_custom_bits_filter() {
        let debris = BodyType::from_bits_retain(1 << 8);
        let a = CollisionFilter::new(BodyType::DYNAMIC | debris, BodyType::STATIC);
        let b = CollisionFilter::new(BodyType::DYNAMIC | debris, BodyType::STATIC);
        assert!(!a.collides_with(&b));
    }

    #[test]
    fn test_sphere_sphere_overlap() {
        let c = sphere_vs_sphere(Vector3::ZERO, 1.0, Vector3::new(1.5, 0.0, 0.0), 1.0).unwrap();
        assert_eq!(c.world_normal, Vector3::X);
        assert!((c.penetration() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_sphere_boundary_is_strict() {
        assert!(sphere_vs_sphere(Vector3::ZERO, 1.0, Vector3::new(2.0, 0.0, 0.0), 1.0).is_none());
        assert!(sphere_vs_sphere(Vector3::ZERO, 1.0, Vector3::new(1.999, 0.0, 0.0), 1.0).is_some());
    }

    #[test]
    fn test_sphere_sphere_coincident_is_none() {
        assert!(sphere_vs_sphere(Vector3::ZERO, 1.0, Vector3::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_sphere_resting_on_box() {
        let frame = CoordinateFrame3D::IDENTITY;
        let c = sphere_vs_box(Vector3::new(0.0, 1.4, 0.0), 0.5, Vector3::ONE, &frame).unwrap();
        // Normal points from the sphere down into the box
        assert!((c.world_normal - (-Vector3::Y)).length() < 1e-6);
        assert!((c.penetration() - 0.1).abs() < 1e-5);
        assert!((c.world_point_b - Vector3::Y).length() < 1e-6);
    }

    #[test]
    fn test_sphere_center_inside_box() {
        let frame = CoordinateFrame3D::IDENTITY;
        let c = sphere_vs_box(Vector3::new(0.0, 0.0, 0.8), 0.5, Vector3::ONE, &frame).unwrap();
        assert!((c.world_normal - (-Vector3::Z)).length() < 1e-6);
        assert!((c.penetration() - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_vs_rotated_box() {
        let frame = CoordinateFrame3D::new(
            Quaternion::from_axis_angle(Vector3::Z, FRAC_PI_2),
            Vector3::new(5.0, 0.0, 0.0),
        );
        // Box half extents (2, 1, 1) rotated so its long axis points along Y
        let c = sphere_vs_box(Vector3::new(5.0, 2.3, 0.0), 0.5, Vector3::new(2.0, 1.0, 1.0), &frame).unwrap();
        assert!((c.world_normal - (-Vector3::Y)).length() < 1e-5);
        assert!((c.penetration() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_sphere_vs_triangle() {
        let tri = [Vector3::new(-1.0, 0.0, -1.0), Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, -1.0)];
        let c = sphere_vs_triangle(Vector3::new(0.0, 0.3, 0.0), 0.5, tri).unwrap();
        assert!((c.world_normal - (-Vector3::Y)).length() < 1e-6);
        assert!((c.penetration() - 0.2).abs() < 1e-5);
        assert!(sphere_vs_triangle(Vector3::new(0.0, 0.6, 0.0), 0.5, tri).is_none());
    }

    #[test]
    fn test_sphere_on_degenerate_triangle_is_none() {
        let tri = [Vector3::ZERO, Vector3::X, Vector3::new(2.0, 0.0, 0.0)];
        assert!(sphere_vs_triangle(Vector3::new(0.5, 0.0, 0.0), 0.5, tri).is_none());
    }

    #[test]
    fn test_box_resting_on_larger_box() {
        let ground = CoordinateFrame3D::IDENTITY;
        let top = CoordinateFrame3D::from_translation(Vector3::new(2.0, 1.45, 0.0));
        let contacts = box_vs_box(Vector3::new(10.0, 1.0, 10.0), &ground, Vector3::splat(0.5), &top);
        // One point per corner of the small box's bottom face
        assert_eq!(contacts.len(), 4);
        for c in &contacts {
            assert!((c.world_normal - Vector3::Y).length() < 1e-5);
            assert!((c.penetration() - 0.05).abs() < 1e-4);
            let mid = c.midpoint();
            assert!(((mid.x - 2.0).abs() - 0.5).abs() < 1e-4);
            assert!((mid.z.abs() - 0.5).abs() < 1e-4);
        }
        // The manifold is centred under the small box
        let center = contacts.iter().fold(Vector3::ZERO, |sum, c| sum + c.midpoint()) * 0.25;
        assert!((center.x - 2.0).abs() < 1e-4);
        assert!(center.z.abs() < 1e-4);
    }

    #[test]
    fn test_separated_boxes() {
        let a = CoordinateFrame3D::IDENTITY;
        let b = CoordinateFrame3D::from_translation(Vector3::new(2.01, 0.0, 0.0));
        assert!(box_vs_box(Vector3::ONE, &a, Vector3::ONE, &b).is_empty());
    }

    #[test]
    fn test_rotated_box_corner_contact() {
        let a = CoordinateFrame3D::IDENTITY;
        let tilt = Quaternion::from_axis_angle(Vector3::new(1.0, 0.0, 1.0), 0.6);
        let b = CoordinateFrame3D::new(tilt, Vector3::new(0.0, 1.8, 0.0));
        let contacts = box_vs_box(Vector3::ONE, &a, Vector3::splat(0.5), &b);
        assert!(!contacts.is_empty());
        for c in &contacts {
            assert!(c.world_normal.dot(Vector3::Y) > 0.9);
            assert!(c.penetration() > 0.0);
        }
    }

    #[test]
    fn test_tilted_box_on_edge_gets_two_points() {
        let ground = CoordinateFrame3D::IDENTITY;
        // Rolled 0.3 rad about X: the lower long edge dips into the ground
        let roll = Quaternion::from_axis_angle(Vector3::X, 0.3);
        let low = 0.5 * 0.3f32.cos() + 0.5 * 0.3f32.sin();
        let top = CoordinateFrame3D::new(roll, Vector3::new(0.0, 1.0 + low - 0.02, 0.0));
        let contacts = box_vs_box(Vector3::new(10.0, 1.0, 10.0), &ground, Vector3::splat(0.5), &top);

        assert_eq!(contacts.len(), 2);
        for c in &contacts {
            assert!((c.world_normal - Vector3::Y).length() < 1e-5);
            assert!((c.penetration() - 0.02).abs() < 1e-3);
        }
        // The two points are the ends of the edge, one unit apart along X
        let span = (contacts[0].midpoint() - contacts[1].midpoint()).abs();
        assert!((span.x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_face_contact_from_box_b() {
        // A diamond-turned small box A pokes its top edge up into a large box B,
        // so B's bottom face is the reference
        let a = CoordinateFrame3D::new(
            Quaternion::from_axis_angle(Vector3::Z, FRAC_PI_4),
            Vector3::new(0.0, -0.95 - 0.5 * SQRT_2, 0.0),
        );
        let b = CoordinateFrame3D::IDENTITY;
        let contacts = box_vs_box(Vector3::splat(0.5), &a, Vector3::new(10.0, 1.0, 10.0), &b);

        assert_eq!(contacts.len(), 2);
        for c in &contacts {
            // Normal runs from A to B
            assert!((c.world_normal - Vector3::Y).length() < 1e-4);
            assert!((c.penetration() - 0.05).abs() < 1e-3);
            assert!((c.world_point_b.y + 1.0).abs() < 1e-4);
            assert!(c.midpoint().x.abs() < 1e-3);
            assert!((c.midpoint().z.abs() - 0.5).abs() < 1e-3);
        }
    }

    #[test]
    fn test_crossed_edges_give_one_point() {
        // Two boxes rotated 45 degrees about perpendicular axes meet edge to edge
        let a = CoordinateFrame3D::new(Quaternion::from_axis_angle(Vector3::X, FRAC_PI_4), Vector3::ZERO);
        let b = CoordinateFrame3D::new(
            Quaternion::from_axis_angle(Vector3::Z, FRAC_PI_4),
            Vector3::new(0.0, 2.0 * SQRT_2 - 0.05, 0.0),
        );
        let contacts = box_vs_box(Vector3::ONE, &a, Vector3::ONE, &b);
        assert_eq!(contacts.len(), 1);
        let c = contacts[0];
        assert!((c.world_normal - Vector3::Y).length() < 1e-4);
        assert!((c.penetration() - 0.05).abs() < 1e-3);
        assert!((c.midpoint() - Vector3::new(0.0, SQRT_2 - 0.025, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_clip_polygon_cuts_square() {
        let square = [
            Vector3::new(-1.0, 0.0, -1.0),
            Vector3::new(1.0, 0.0, -1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(-1.0, 0.0, 1.0),
        ];
        let clipped = clip_polygon(&square, Vector3::X, 0.5);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|p| p.x <= 0.5 + 1e-6));
    }
}
