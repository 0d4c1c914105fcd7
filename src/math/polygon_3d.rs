use super::{Point3, Vector3, TOLERANCE};

/// Computes the unit normal of a polygon using Newell's method.
///
/// Returns `None` for degenerate polygons (fewer than three points or zero
/// area).
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Option<Vector3> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }

    let len = normal.norm();
    if len < TOLERANCE {
        return None;
    }
    Some(normal / len)
}

/// Arithmetic mean of a set of points. Returns the origin for an empty slice.
#[must_use]
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }

    #[allow(clippy::cast_precision_loss)]
    let inv_n = 1.0 / points.len() as f64;
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum * inv_n)
}
