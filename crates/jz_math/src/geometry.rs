//! Tolerances and guarded geometric queries
//!
//! Every division here checks its denominator against [`ZERO_TOLERANCE`] and
//! falls back to a defined result instead of producing NaN or infinity.

use crate::Vector3;

/// Values at or below this magnitude are treated as zero
pub const ZERO_TOLERANCE: f32 = 1e-6;

/// Looser tolerance for accumulated geometric error
pub const LOOSE_TOLERANCE: f32 = 1e-3;

/// Parameter `t` in [0, 1] of the point on segment `a..b` closest to `p`
///
/// A zero-length segment returns 0.
pub fn segment_parameter(p: Vector3, a: Vector3, b: Vector3) -> f32 {
    let ab = b - a;
    let denom = ab.length_squared();
    if denom <= ZERO_TOLERANCE * ZERO_TOLERANCE {
        return 0.0;
    }
    ((p - a).dot(ab) / denom).clamp(0.0, 1.0)
}

/// Point on segment `a..b` closest to `p`
pub fn closest_point_on_segment(p: Vector3, a: Vector3, b: Vector3) -> Vector3 {
    a + (b - a) * segment_parameter(p, a, b)
}

/// Closest points between segments `p1..q1` and `p2..q2`
///
/// Returns `(point_on_first, point_on_second)`. Degenerate and parallel
/// segments pick parameter 0 on the first segment.
pub fn closest_points_between_segments(
    p1: Vector3,
    q1: Vector3,
    p2: Vector3,
    q2: Vector3,
) -> (Vector3, Vector3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);
    let eps = ZERO_TOLERANCE * ZERO_TOLERANCE;

    if a <= eps && e <= eps {
        return (p1, p2);
    }

    let (s, t) = if a <= eps {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= eps {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > eps {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}

/// Point on triangle `a, b, c` closest to `p`
///
/// Uses the Voronoi-region walk. A degenerate (zero-area) triangle falls back
/// to the closest point over its three edges.
pub fn closest_point_on_triangle(p: Vector3, a: Vector3, b: Vector3, c: Vector3) -> Vector3 {
    let ab = b - a;
    let ac = c - a;
    if ab.cross(ac).length_squared() <= ZERO_TOLERANCE * ZERO_TOLERANCE {
        return closest_point_on_edges(p, a, b, c);
    }

    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = va + vb + vc;
    if denom.abs() <= ZERO_TOLERANCE {
        return closest_point_on_edges(p, a, b, c);
    }
    let v = vb / denom;
    let w = vc / denom;
    a + ab * v + ac * w
}

fn closest_point_on_edges(p: Vector3, a: Vector3, b: Vector3, c: Vector3) -> Vector3 {
    [(a, b), (b, c), (c, a)]
        .into_iter()
        .map(|(s, e)| closest_point_on_segment(p, s, e))
        .min_by(|x, y| {
            (*x - p)
                .length_squared()
                .total_cmp(&(*y - p).length_squared())
        })
        .unwrap_or(a)
}

/// Distance `t` along a ray to a plane (`normal · x = distance`)
///
/// Returns `None` when the ray is parallel to the plane or the hit lies
/// behind the origin.
pub fn ray_plane_intersection(
    origin: Vector3,
    direction: Vector3,
    plane_normal: Vector3,
    plane_distance: f32,
) -> Option<f32> {
    let denom = plane_normal.dot(direction);
    if denom.abs() <= ZERO_TOLERANCE {
        return None;
    }
    let t = (plane_distance - plane_normal.dot(origin)) / denom;
    if t >= 0.0 && t.is_finite() {
        Some(t)
    } else {
        None
    }
}

/// Unit normal of triangle `a, b, c` (counter-clockwise), `None` if degenerate
pub fn triangle_normal(a: Vector3, b: Vector3, c: Vector3) -> Option<Vector3> {
    (b - a).cross(c - a).try_normalized()
}
