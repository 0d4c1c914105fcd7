use crate::error::{OperationError, Result};
use crate::math::{Point3, TOLERANCE};
use crate::topology::{FaceId, MeshStore, VertexId};

/// A rectangular grid of quads created by [`MakeGrid`].
#[derive(Debug, Clone)]
pub struct Grid {
    /// Vertices, row-major: index `j * (columns + 1) + i`.
    pub vertices: Vec<VertexId>,
    /// Faces, row-major: index `j * columns + i`.
    pub faces: Vec<FaceId>,
    pub columns: usize,
    pub rows: usize,
}

impl Grid {
    /// The face in column `i`, row `j`.
    #[must_use]
    pub fn face_at(&self, i: usize, j: usize) -> Option<FaceId> {
        if i >= self.columns || j >= self.rows {
            return None;
        }
        self.faces.get(j * self.columns + i).copied()
    }

    /// The vertex at grid corner (`i`, `j`).
    #[must_use]
    pub fn vertex_at(&self, i: usize, j: usize) -> Option<VertexId> {
        if i > self.columns || j > self.rows {
            return None;
        }
        self.vertices.get(j * (self.columns + 1) + i).copied()
    }

    /// Faces of the block spanning columns `i0..i1` and rows `j0..j1`.
    #[must_use]
    pub fn block(&self, i0: usize, i1: usize, j0: usize, j1: usize) -> Vec<FaceId> {
        (j0..j1)
            .flat_map(|j| (i0..i1).filter_map(move |i| self.face_at(i, j)))
            .collect()
    }
}

/// Creates a flat grid of quads in the XY plane, centred on the origin,
/// facing +Z.
pub struct MakeGrid {
    columns: usize,
    rows: usize,
    cell_size: f64,
}

impl MakeGrid {
    /// Creates a new `MakeGrid` operation.
    #[must_use]
    pub fn new(columns: usize, rows: usize, cell_size: f64) -> Self {
        Self {
            columns,
            rows,
            cell_size,
        }
    }

    /// Executes the operation, inserting the grid into the store.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or the cell size is not
    /// positive.
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self, store: &mut MeshStore) -> Result<Grid> {
        if self.columns == 0 || self.rows == 0 {
            return Err(OperationError::InvalidInput("grid needs at least one cell".into()).into());
        }
        if self.cell_size < TOLERANCE {
            return Err(
                OperationError::InvalidInput("grid cell size must be positive".into()).into(),
            );
        }

        let s = self.cell_size;
        let x0 = -(self.columns as f64) * s * 0.5;
        let y0 = -(self.rows as f64) * s * 0.5;

        let mut vertices = Vec::with_capacity((self.columns + 1) * (self.rows + 1));
        for j in 0..=self.rows {
            for i in 0..=self.columns {
                let point = Point3::new(x0 + i as f64 * s, y0 + j as f64 * s, 0.0);
                vertices.push(store.add_vertex(point));
            }
        }

        let stride = self.columns + 1;
        let mut faces = Vec::with_capacity(self.columns * self.rows);
        for j in 0..self.rows {
            for i in 0..self.columns {
                let a = j * stride + i;
                let quad = [
                    vertices[a],
                    vertices[a + 1],
                    vertices[a + 1 + stride],
                    vertices[a + stride],
                ];
                faces.push(store.add_face(&quad)?);
            }
        }

        Ok(Grid {
            vertices,
            faces,
            columns: self.columns,
            rows: self.rows,
        })
    }
}
