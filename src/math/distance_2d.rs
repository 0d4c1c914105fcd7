use super::Point2;

/// Returns the point on segment `a`→`b` closest to `p`, with its parameter
/// `t` in `[0, 1]`.
#[must_use]
pub fn closest_point_on_segment(p: &Point2, a: &Point2, b: &Point2) -> (Point2, f64) {
    let ab = b - a;
    let len_sq = ab.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return (*a, 0.0);
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Returns the midpoint of a segment.
#[must_use]
pub fn segment_midpoint(a: &Point2, b: &Point2) -> Point2 {
    nalgebra::center(a, b)
}

/// Returns whichever endpoint of `a`→`b` is nearer to `p` (`a` on ties).
#[must_use]
pub fn nearer_endpoint(p: &Point2, a: &Point2, b: &Point2) -> Point2 {
    if (a - p).norm() <= (b - p).norm() {
        *a
    } else {
        *b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn dist(q: &Point2, a: &Point2, b: &Point2) -> f64 {
        let (closest, _) = closest_point_on_segment(q, a, b);
        (q - closest).norm()
    }

    #[test]
    fn segment_dist_perpendicular_projection() {
        // Point (1, 1) to segment (0,0)→(2,0). Closest at (1,0), dist = 1.
        let d = dist(&p(1.0, 1.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_endpoint_closest() {
        // Point (-1, 0) to segment (0,0)→(2,0). Closest at (0,0), dist = 1.
        let d = dist(&p(-1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_on_segment() {
        let d = dist(&p(1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!(d.abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_degenerate() {
        // Zero-length segment: distance is point-to-point.
        let d = dist(&p(3.0, 4.0), &p(0.0, 0.0), &p(0.0, 0.0));
        assert!((d - 5.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn closest_point_reports_parameter() {
        let (c, t) = closest_point_on_segment(&p(3.0, 2.0), &p(0.0, 0.0), &p(4.0, 0.0));
        assert!((c.x - 3.0).abs() < TOL && c.y.abs() < TOL);
        assert!((t - 0.75).abs() < TOL, "t={t}");
    }

    #[test]
    fn nearer_endpoint_prefers_first_on_tie() {
        let e = nearer_endpoint(&p(1.0, 5.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert_eq!(e, p(0.0, 0.0));
        let e = nearer_endpoint(&p(1.9, 0.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert_eq!(e, p(2.0, 0.0));
    }
}
