use nalgebra::Vector4;

use crate::error::{OperationError, ProjectionError, Result};
use crate::math::{Matrix4, Point2, Point3, Vector3, TOLERANCE};

/// Camera state for mapping world space to the viewport's pixel space.
///
/// Pixel coordinates have their origin at the bottom-left corner of the
/// viewport with Y pointing up.
#[derive(Debug, Clone)]
pub struct Viewport {
    view_projection: Matrix4,
    inverse: Matrix4,
    width: f64,
    height: f64,
    eye: Point3,
    forward: Vector3,
    perspective: bool,
}

impl Viewport {
    /// Creates a viewport from view and projection matrices and a pixel size.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is not positive or the combined matrix
    /// cannot be inverted.
    pub fn new(view: Matrix4, projection: Matrix4, width: f64, height: f64) -> Result<Self> {
        if !(width > 0.0 && height > 0.0) {
            return Err(OperationError::InvalidInput(format!(
                "viewport size must be positive, got {width}x{height}"
            ))
            .into());
        }

        let view_projection = projection * view;
        let inverse = view_projection
            .try_inverse()
            .ok_or(ProjectionError::NotInvertible)?;
        let view_inverse = view.try_inverse().ok_or(ProjectionError::NotInvertible)?;

        let eye = view_inverse * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let forward = view_inverse * Vector4::new(0.0, 0.0, -1.0, 0.0);
        let forward = Vector3::new(forward.x, forward.y, forward.z)
            .try_normalize(TOLERANCE)
            .ok_or(ProjectionError::NotInvertible)?;

        Ok(Self {
            view_projection,
            inverse,
            width,
            height,
            eye: Point3::new(eye.x, eye.y, eye.z),
            forward,
            perspective: projection[(3, 3)].abs() < TOLERANCE,
        })
    }

    /// Orthographic camera at `eye` looking at `target`, showing
    /// `half_extent` world units either side of the centre horizontally.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera is degenerate.
    pub fn orthographic(
        eye: Point3,
        target: Point3,
        up: Vector3,
        half_extent: f64,
        width: f64,
        height: f64,
    ) -> Result<Self> {
        let aspect = height / width;
        let view = Matrix4::look_at_rh(&eye, &target, &up);
        let projection = Matrix4::new_orthographic(
            -half_extent,
            half_extent,
            -half_extent * aspect,
            half_extent * aspect,
            0.01,
            1000.0,
        );
        Self::new(view, projection, width, height)
    }

    /// Perspective camera at `eye` looking at `target`, with vertical field of
    /// view `fovy` in radians.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera is degenerate.
    pub fn perspective(
        eye: Point3,
        target: Point3,
        up: Vector3,
        fovy: f64,
        width: f64,
        height: f64,
    ) -> Result<Self> {
        let view = Matrix4::look_at_rh(&eye, &target, &up);
        let projection = Matrix4::new_perspective(width / height, fovy, 0.01, 1000.0);
        Self::new(view, projection, width, height)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Camera position in world space.
    #[must_use]
    pub fn eye(&self) -> Point3 {
        self.eye
    }

    #[must_use]
    pub fn is_perspective(&self) -> bool {
        self.perspective
    }

    /// Projects a world-space point to pixel space, or `None` if it lies
    /// behind the camera.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Option<Point2> {
        self.try_project(point).ok()
    }

    /// Like [`Viewport::project`], reporting the failure.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::BehindCamera`] for points behind the eye.
    pub fn try_project(&self, point: &Point3) -> Result<Point2> {
        let clip = self.view_projection * Vector4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= TOLERANCE {
            return Err(ProjectionError::BehindCamera.into());
        }
        let x = clip.x / clip.w;
        let y = clip.y / clip.w;
        Ok(Point2::new(
            (x + 1.0) * 0.5 * self.width,
            (y + 1.0) * 0.5 * self.height,
        ))
    }

    /// Projects every point; entries behind the camera are `None`.
    #[must_use]
    pub fn project_all(&self, points: &[Point3]) -> Vec<Option<Point2>> {
        points.iter().map(|p| self.project(p)).collect()
    }

    /// Places a pixel position back in world space at the depth of
    /// `depth_anchor`.
    #[must_use]
    pub fn unproject(&self, point: &Point2, depth_anchor: &Point3) -> Option<Point3> {
        let anchor = self.view_projection
            * Vector4::new(depth_anchor.x, depth_anchor.y, depth_anchor.z, 1.0);
        if anchor.w.abs() <= TOLERANCE {
            return None;
        }
        let ndc = Vector4::new(
            point.x / self.width * 2.0 - 1.0,
            point.y / self.height * 2.0 - 1.0,
            anchor.z / anchor.w,
            1.0,
        );
        let world = self.inverse * ndc;
        if world.w.abs() <= TOLERANCE {
            return None;
        }
        Some(Point3::new(
            world.x / world.w,
            world.y / world.w,
            world.z / world.w,
        ))
    }

    /// Whether a surface at `point` with `normal` faces the camera.
    #[must_use]
    pub fn faces_camera(&self, point: &Point3, normal: &Vector3) -> bool {
        let to_eye = if self.perspective {
            self.eye - point
        } else {
            -self.forward
        };
        normal.dot(&to_eye) >= 0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Top-down orthographic view: world (x, y) maps to (10x + 50, 10y + 50).
    fn top_view() -> Viewport {
        Viewport::orthographic(
            Point3::new(0.0, 0.0, 10.0),
            Point3::origin(),
            Vector3::y(),
            5.0,
            100.0,
            100.0,
        )
        .unwrap()
    }

    #[test]
    fn orthographic_projection_maps_linearly() {
        let vp = top_view();
        let p = vp.project(&Point3::new(1.0, -2.0, 0.0)).unwrap();
        assert_relative_eq!(p, Point2::new(60.0, 30.0), epsilon = 1e-9);
        assert!(!vp.is_perspective());
    }

    #[test]
    fn unproject_inverts_project_at_anchor_depth() {
        let vp = top_view();
        let anchor = Point3::new(0.0, 0.0, 1.5);
        let world = vp.unproject(&Point2::new(70.0, 40.0), &anchor).unwrap();
        assert_relative_eq!(world, Point3::new(2.0, -1.0, 1.5), epsilon = 1e-9);
    }

    #[test]
    fn perspective_rejects_points_behind_eye() {
        let vp = Viewport::perspective(
            Point3::new(0.0, 0.0, 10.0),
            Point3::origin(),
            Vector3::y(),
            1.0,
            200.0,
            100.0,
        )
        .unwrap();
        assert!(vp.is_perspective());
        assert_relative_eq!(
            vp.project(&Point3::origin()).unwrap(),
            Point2::new(100.0, 50.0),
            epsilon = 1e-9
        );
        assert!(vp.project(&Point3::new(0.0, 0.0, 20.0)).is_none());
        assert!(vp.try_project(&Point3::new(0.0, 0.0, 20.0)).is_err());

        let all = vp.project_all(&[Point3::origin(), Point3::new(0.0, 0.0, 20.0)]);
        assert!(all[0].is_some() && all[1].is_none());
    }

    #[test]
    fn facing_test_uses_view_direction() {
        let vp = top_view();
        assert!(vp.faces_camera(&Point3::origin(), &Vector3::z()));
        assert!(!vp.faces_camera(&Point3::origin(), &-Vector3::z()));
        assert_relative_eq!(vp.eye(), Point3::new(0.0, 0.0, 10.0), epsilon = 1e-9);
    }

    #[test]
    fn degenerate_size_is_rejected() {
        let view = Matrix4::identity();
        assert!(Viewport::new(view, Matrix4::identity(), 0.0, 10.0).is_err());
        assert!(Viewport::new(view, Matrix4::zeros(), 10.0, 10.0).is_err());
    }
}
