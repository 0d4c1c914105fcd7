use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::topology::{FaceId, MeshStore, VertexId};

/// IDs of the elements created by a construction operation.
#[derive(Debug, Clone, Default)]
pub struct BuiltMesh {
    /// Created vertices, in input order.
    pub vertices: Vec<VertexId>,
    /// Created faces, in input order.
    pub faces: Vec<FaceId>,
}

/// Builds a polygon mesh from a point list and index polygons.
pub struct MakeMesh {
    points: Vec<Point3>,
    polygons: Vec<Vec<usize>>,
}

impl MakeMesh {
    /// Creates a new `MakeMesh` operation.
    #[must_use]
    pub fn new(points: Vec<Point3>, polygons: Vec<Vec<usize>>) -> Self {
        Self { points, polygons }
    }

    /// Executes the operation, inserting the mesh into the store.
    ///
    /// # Errors
    ///
    /// Returns an error if a polygon references a point out of range or is
    /// not a valid face.
    pub fn execute(&self, store: &mut MeshStore) -> Result<BuiltMesh> {
        for polygon in &self.polygons {
            if let Some(&bad) = polygon.iter().find(|&&i| i >= self.points.len()) {
                return Err(OperationError::InvalidInput(format!(
                    "polygon index {bad} out of range ({} points)",
                    self.points.len()
                ))
                .into());
            }
        }

        let vertices: Vec<VertexId> = self.points.iter().map(|&p| store.add_vertex(p)).collect();
        let mut faces = Vec::with_capacity(self.polygons.len());
        for polygon in &self.polygons {
            let ids: Vec<VertexId> = polygon.iter().map(|&i| vertices[i]).collect();
            faces.push(store.add_face(&ids)?);
        }

        Ok(BuiltMesh { vertices, faces })
    }
}
