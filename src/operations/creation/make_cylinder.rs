use std::f64::consts::TAU;

use crate::error::{OperationError, Result};
use crate::math::{Point3, TOLERANCE};
use crate::topology::{MeshStore, VertexId};

use super::BuiltMesh;

/// Creates a quad-strip cylinder around the Z axis, base at the origin.
///
/// Without caps the result is an open tube with two boundary loops. Faces
/// are ordered ring by ring, then the bottom and top caps when present.
pub struct MakeCylinder {
    segments: usize,
    rings: usize,
    radius: f64,
    height: f64,
    caps: bool,
}

impl MakeCylinder {
    /// Creates a new `MakeCylinder` operation (open tube).
    #[must_use]
    pub fn new(segments: usize, rings: usize, radius: f64, height: f64) -> Self {
        Self {
            segments,
            rings,
            radius,
            height,
            caps: false,
        }
    }

    /// Closes both ends with an n-gon.
    #[must_use]
    pub fn with_caps(mut self, caps: bool) -> Self {
        self.caps = caps;
        self
    }

    /// Executes the operation, inserting the cylinder into the store.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than three segments, no rings, or
    /// the radius or height is not positive.
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self, store: &mut MeshStore) -> Result<BuiltMesh> {
        if self.segments < 3 {
            return Err(
                OperationError::InvalidInput("cylinder needs at least 3 segments".into()).into(),
            );
        }
        if self.rings == 0 {
            return Err(
                OperationError::InvalidInput("cylinder needs at least 1 ring".into()).into(),
            );
        }
        if self.radius < TOLERANCE || self.height < TOLERANCE {
            return Err(OperationError::InvalidInput(
                "cylinder radius and height must be positive".into(),
            )
            .into());
        }

        let n = self.segments;
        let mut vertices = Vec::with_capacity(n * (self.rings + 1));
        for r in 0..=self.rings {
            let z = self.height * r as f64 / self.rings as f64;
            for s in 0..n {
                let angle = TAU * s as f64 / n as f64;
                let point = Point3::new(self.radius * angle.cos(), self.radius * angle.sin(), z);
                vertices.push(store.add_vertex(point));
            }
        }

        let mut faces = Vec::with_capacity(n * self.rings + 2);
        for r in 0..self.rings {
            for s in 0..n {
                let a = r * n + s;
                let b = r * n + (s + 1) % n;
                let quad = [vertices[a], vertices[b], vertices[b + n], vertices[a + n]];
                faces.push(store.add_face(&quad)?);
            }
        }

        if self.caps {
            let bottom: Vec<VertexId> = vertices[..n].iter().rev().copied().collect();
            faces.push(store.add_face(&bottom)?);
            let top = &vertices[self.rings * n..];
            faces.push(store.add_face(top)?);
        }

        Ok(BuiltMesh { vertices, faces })
    }
}
