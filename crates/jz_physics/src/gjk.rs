//! GJK intersection and EPA penetration for arbitrary convex pairs
//!
//! Both algorithms work on the Minkowski difference A - B through the
//! shapes' support functions. Every simplex vertex remembers the support
//! points of A and B it came from, so the final EPA face maps back to a
//! contact point on each shape.

use jz_math::{CoordinateFrame3D, Vector3, ZERO_TOLERANCE};

use crate::contact::WorldContactPoint;
use crate::shapes::CollisionShape;

/// Iteration cap for both GJK and EPA
pub const MAX_ITERATIONS: usize = 64;

const EPA_TOLERANCE: f32 = 1e-4;

/// World-space support point of a shape placed at `frame`
pub fn support_world(shape: &CollisionShape, frame: &CoordinateFrame3D, direction: Vector3) -> Vector3 {
    frame.transform_point(shape.support(frame.inverse_transform_vector(direction)))
}

#[derive(Clone, Copy, Debug)]
struct SupportPoint {
    /// Point of the Minkowski difference
    w: Vector3,
    a: Vector3,
    b: Vector3,
}

struct Minkowski<'a> {
    shape_a: &'a CollisionShape,
    frame_a: &'a CoordinateFrame3D,
    shape_b: &'a CollisionShape,
    frame_b: &'a CoordinateFrame3D,
}

impl Minkowski<'_> {
    fn support(&self, direction: Vector3) -> SupportPoint {
        let a = support_world(self.shape_a, self.frame_a, direction);
        let b = support_world(self.shape_b, self.frame_b, -direction);
        SupportPoint { w: a - b, a, b }
    }
}

/// Penetration contact between two convex shapes, `None` if they are apart
///
/// Touching shapes (zero depth) report no contact.
pub fn penetration(
    shape_a: &CollisionShape,
    frame_a: &CoordinateFrame3D,
    shape_b: &CollisionShape,
    frame_b: &CoordinateFrame3D,
) -> Option<WorldContactPoint> {
    let m = Minkowski {
        shape_a,
        frame_a,
        shape_b,
        frame_b,
    };
    let simplex = gjk(&m)?;
    let tetrahedron = complete_simplex(&m, simplex)?;
    epa(&m, tetrahedron)
}

/// True if the convex shapes overlap
pub fn intersects(
    shape_a: &CollisionShape,
    frame_a: &CoordinateFrame3D,
    shape_b: &CollisionShape,
    frame_b: &CoordinateFrame3D,
) -> bool {
    let m = Minkowski {
        shape_a,
        frame_a,
        shape_b,
        frame_b,
    };
    gjk(&m).is_some()
}

fn gjk(m: &Minkowski) -> Option<Vec<SupportPoint>> {
    let mut simplex: Vec<SupportPoint> = Vec::with_capacity(4);

    let first = m.support(Vector3::X);
    simplex.push(first);
    let mut direction = -first.w;
    if direction.length_squared() <= ZERO_TOLERANCE * ZERO_TOLERANCE {
        return Some(simplex);
    }

    for _ in 0..MAX_ITERATIONS {
        let point = m.support(direction);
        if point.w.dot(direction) <= 0.0 {
            return None;
        }
        simplex.push(point);

        if do_simplex(&mut simplex, &mut direction) {
            return Some(simplex);
        }
        // Origin lies on the current simplex
        if direction.length_squared() <= ZERO_TOLERANCE * ZERO_TOLERANCE {
            return Some(simplex);
        }
    }

    log::trace!("GJK hit the iteration cap");
    None
}

fn triple_cross(a: Vector3, b: Vector3, c: Vector3) -> Vector3 {
    a.cross(b).cross(c)
}

/// Reduce the simplex to the feature nearest the origin and pick the next
/// search direction. Returns true once the origin is enclosed.
fn do_simplex(simplex: &mut Vec<SupportPoint>, direction: &mut Vector3) -> bool {
    match simplex.len() {
        2 => do_line(simplex, direction),
        3 => do_triangle(simplex, direction),
        4 => do_tetrahedron(simplex, direction),
        _ => false,
    }
}

fn do_line(simplex: &mut Vec<SupportPoint>, direction: &mut Vector3) -> bool {
    let a = simplex[1];
    let b = simplex[0];
    let ab = b.w - a.w;
    let ao = -a.w;

    if ab.dot(ao) > 0.0 {
        *direction = triple_cross(ab, ao, ab);
        if direction.length_squared() <= ZERO_TOLERANCE * ZERO_TOLERANCE {
            // Origin on the line itself
            *direction = Vector3::ZERO;
        }
    } else {
        *simplex = vec![a];
        *direction = ao;
    }
    false
}

fn do_triangle(simplex: &mut Vec<SupportPoint>, direction: &mut Vector3) -> bool {
    let a = simplex[2];
    let b = simplex[1];
    let c = simplex[0];
    let ab = b.w - a.w;
    let ac = c.w - a.w;
    let ao = -a.w;
    let abc = ab.cross(ac);

    if abc.cross(ac).dot(ao) > 0.0 {
        if ac.dot(ao) > 0.0 {
            *simplex = vec![c, a];
            *direction = triple_cross(ac, ao, ac);
        } else {
            *simplex = vec![b, a];
            return do_line(simplex, direction);
        }
    } else if ab.cross(abc).dot(ao) > 0.0 {
        *simplex = vec![b, a];
        return do_line(simplex, direction);
    } else {
        let side = abc.dot(ao);
        if side > 0.0 {
            *direction = abc;
        } else if side < 0.0 {
            *simplex = vec![b, c, a];
            *direction = -abc;
        } else {
            // Origin in the triangle's plane
            *direction = Vector3::ZERO;
        }
    }
    false
}

fn do_tetrahedron(simplex: &mut Vec<SupportPoint>, direction: &mut Vector3) -> bool {
    let a = simplex[3];
    let b = simplex[2];
    let c = simplex[1];
    let d = simplex[0];
    let ab = b.w - a.w;
    let ac = c.w - a.w;
    let ad = d.w - a.w;
    let ao = -a.w;

    let abc = ab.cross(ac);
    let acd = ac.cross(ad);
    let adb = ad.cross(ab);

    if abc.dot(ao) > 0.0 {
        *simplex = vec![c, b, a];
        *direction = abc;
        return do_triangle(simplex, direction);
    }
    if acd.dot(ao) > 0.0 {
        *simplex = vec![d, c, a];
        *direction = acd;
        return do_triangle(simplex, direction);
    }
    if adb.dot(ao) > 0.0 {
        *simplex = vec![b, d, a];
        *direction = adb;
        return do_triangle(simplex, direction);
    }
    true
}

/// Grow a GJK simplex that stopped early into a non-degenerate tetrahedron
fn complete_simplex(m: &Minkowski, mut simplex: Vec<SupportPoint>) -> Option<[SupportPoint; 4]> {
    let eps = ZERO_TOLERANCE * 10.0;
    let axes = [Vector3::X, -Vector3::X, Vector3::Y, -Vector3::Y, Vector3::Z, -Vector3::Z];

    if simplex.len() == 1 {
        let origin = simplex[0].w;
        let found = axes
            .iter()
            .map(|d| m.support(*d))
            .find(|p| (p.w - origin).length() > eps);
        simplex.push(found?);
    }

    if simplex.len() == 2 {
        let line = (simplex[1].w - simplex[0].w).try_normalized()?;
        let perp = line.any_perpendicular();
        let other = line.cross(perp);
        let origin = simplex[0].w;
        let found = [perp, -perp, other, -other]
            .iter()
            .map(|d| m.support(*d))
            .find(|p| (p.w - origin).cross(line).length() > eps);
        simplex.push(found?);
    }

    if simplex.len() == 3 {
        let normal = (simplex[1].w - simplex[0].w)
            .cross(simplex[2].w - simplex[0].w)
            .try_normalized()?;
        let origin = simplex[0].w;
        let found = [normal, -normal]
            .iter()
            .map(|d| m.support(*d))
            .find(|p| (p.w - origin).dot(normal).abs() > eps);
        simplex.push(found?);
    }

    match simplex.as_slice() {
        [a, b, c, d] => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug)]
struct Face {
    indices: [usize; 3],
    normal: Vector3,
    distance: f32,
}

fn make_face(points: &[SupportPoint], i: usize, j: usize, k: usize) -> Option<Face> {
    let a = points[i].w;
    let normal = (points[j].w - a).cross(points[k].w - a).try_normalized()?;
    Some(Face {
        indices: [i, j, k],
        normal,
        distance: normal.dot(a),
    })
}

/// Record a horizon edge, cancelling it if the reverse edge is already there
fn add_edge(edges: &mut Vec<(usize, usize)>, a: usize, b: usize) {
    if let Some(pos) = edges.iter().position(|&(x, y)| x == b && y == a) {
        edges.swap_remove(pos);
    } else {
        edges.push((a, b));
    }
}

fn epa(m: &Minkowski, tetrahedron: [SupportPoint; 4]) -> Option<WorldContactPoint> {
    let mut points: Vec<SupportPoint> = tetrahedron.to_vec();
    let centroid = points.iter().fold(Vector3::ZERO, |acc, p| acc + p.w) * 0.25;

    // Wind every starting face so its normal points away from the interior
    let mut faces = Vec::with_capacity(16);
    for [i, j, k] in [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]] {
        let face = make_face(&points, i, j, k)?;
        if face.normal.dot(points[i].w - centroid) < 0.0 {
            faces.push(make_face(&points, i, k, j)?);
        } else {
            faces.push(face);
        }
    }

    let mut best = faces[0];
    for _ in 0..MAX_ITERATIONS {
        best = *faces
            .iter()
            .min_by(|x, y| x.distance.total_cmp(&y.distance))?;

        let support = m.support(best.normal);
        if support.w.dot(best.normal) - best.distance < EPA_TOLERANCE {
            return contact_from_face(&points, &best);
        }

        let new_index = points.len();
        points.push(support);

        let mut edges = Vec::new();
        faces.retain(|f| {
            let visible = f.normal.dot(support.w - points[f.indices[0]].w) > 0.0;
            if visible {
                add_edge(&mut edges, f.indices[0], f.indices[1]);
                add_edge(&mut edges, f.indices[1], f.indices[2]);
                add_edge(&mut edges, f.indices[2], f.indices[0]);
            }
            !visible
        });
        for (i, j) in edges {
            if let Some(face) = make_face(&points, i, j, new_index) {
                faces.push(face);
            }
        }
        if faces.is_empty() {
            return None;
        }
    }

    log::trace!("EPA hit the iteration cap, using closest face");
    contact_from_face(&points, &best)
}

fn contact_from_face(points: &[SupportPoint], face: &Face) -> Option<WorldContactPoint> {
    if face.distance <= ZERO_TOLERANCE {
        return None;
    }
    let [a, b, c] = face.indices.map(|i| points[i]);
    let (u, v, w) = barycentric(face.normal * face.distance, a.w, b.w, c.w);
    let point_a = a.a * u + b.a * v + c.a * w;
    let point_b = a.b * u + b.b * v + c.b * w;
    Some(WorldContactPoint::new(point_a, point_b, face.normal))
}

fn barycentric(p: Vector3, a: Vector3, b: Vector3, c: Vector3) -> (f32, f32, f32) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= ZERO_TOLERANCE * ZERO_TOLERANCE {
        return (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    (1.0 - v - w, v, w)
}
