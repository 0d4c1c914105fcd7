use std::collections::HashMap;

use tracing::debug;

use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::topology::{FaceId, MeshStore, MirrorAxes, VertexId};

/// Default distance under which two positions count as mirror images.
pub const DEFAULT_MIRROR_TOLERANCE: f64 = 1e-4;

type CellKey = (i64, i64, i64);

/// Extends the selection with its mirror image across object-space axes.
///
/// Axes are applied one after another (X, then Y, then Z), each working on
/// the selection left by the previous one, so two axes give a four-fold
/// symmetric selection. Selected vertices, edges and faces are all mirrored;
/// the store is flushed in its element mode afterwards.
pub struct MirrorSelect {
    axes: MirrorAxes,
    tolerance: f64,
}

impl MirrorSelect {
    /// Creates a new `MirrorSelect` operation.
    #[must_use]
    pub fn new(axes: MirrorAxes) -> Self {
        Self {
            axes,
            tolerance: DEFAULT_MIRROR_TOLERANCE,
        }
    }

    /// Sets the matching tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the mirror. Returns the number of vertices newly selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is not positive.
    pub fn execute(&self, store: &mut MeshStore) -> Result<usize> {
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(
                OperationError::InvalidInput("mirror tolerance must be positive".into()).into(),
            );
        }
        if self.axes.is_empty() {
            return Ok(0);
        }

        let index = self.position_index(store);
        let before = store.selected_vertices().len();

        for (axis, flag) in [MirrorAxes::X, MirrorAxes::Y, MirrorAxes::Z].into_iter().enumerate() {
            if self.axes.contains(flag) {
                self.mirror_axis(store, &index, axis)?;
            }
        }

        store.select_flush_mode();
        let added = store.selected_vertices().len().saturating_sub(before);
        debug!(axes = ?self.axes, added, "mirrored selection");
        Ok(added)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, point: &Point3) -> CellKey {
        let q = |c: f64| (c / self.tolerance).round() as i64;
        (q(point.x), q(point.y), q(point.z))
    }

    fn position_index(&self, store: &MeshStore) -> HashMap<CellKey, VertexId> {
        let mut index = HashMap::with_capacity(store.num_vertices());
        for (id, v) in store.vertices() {
            index.entry(self.key(&v.point)).or_insert(id);
        }
        index
    }

    fn mirror_vertex(
        &self,
        store: &MeshStore,
        index: &HashMap<CellKey, VertexId>,
        vertex: VertexId,
        axis: usize,
    ) -> Result<Option<VertexId>> {
        let mut point = store.vertex(vertex)?.point;
        point[axis] = -point[axis];
        self.lookup(store, index, &point)
    }

    /// Nearest indexed vertex within tolerance of `point`. Neighbouring cells
    /// are searched too, since a match may round into the next cell.
    fn lookup(
        &self,
        store: &MeshStore,
        index: &HashMap<CellKey, VertexId>,
        point: &Point3,
    ) -> Result<Option<VertexId>> {
        let (x, y, z) = self.key(point);
        let mut best: Option<(VertexId, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(&candidate) = index.get(&(x + dx, y + dy, z + dz)) else {
                        continue;
                    };
                    let dist = (store.vertex(candidate)?.point - point).norm();
                    if dist <= self.tolerance && best.is_none_or(|(_, d)| dist < d) {
                        best = Some((candidate, dist));
                    }
                }
            }
        }
        Ok(best.map(|(v, _)| v))
    }

    fn mirror_axis(
        &self,
        store: &mut MeshStore,
        index: &HashMap<CellKey, VertexId>,
        axis: usize,
    ) -> Result<()> {
        let mut vertices = Vec::new();
        for v in store.selected_vertices() {
            if let Some(m) = self.mirror_vertex(store, index, v, axis)? {
                vertices.push(m);
            }
        }

        let mut edges = Vec::new();
        for e in store.selected_edges() {
            let [a, b] = store.verts_of_edge(e)?;
            let ma = self.mirror_vertex(store, index, a, axis)?;
            let mb = self.mirror_vertex(store, index, b, axis)?;
            if let (Some(ma), Some(mb)) = (ma, mb) {
                if let Some(m) = store.edge_between(ma, mb) {
                    edges.push(m);
                }
            }
        }

        let mut faces = Vec::new();
        for f in store.selected_faces() {
            if let Some(m) = self.mirror_face(store, index, f, axis)? {
                faces.push(m);
            }
        }

        for v in vertices {
            store.set_vertex_select(v, true)?;
        }
        for e in edges {
            store.set_edge_select(e, true)?;
        }
        for f in faces {
            store.set_face_select(f, true)?;
        }
        Ok(())
    }

    fn mirror_face(
        &self,
        store: &MeshStore,
        index: &HashMap<CellKey, VertexId>,
        face: FaceId,
        axis: usize,
    ) -> Result<Option<FaceId>> {
        let mut mirrored = Vec::with_capacity(store.face(face)?.len());
        for v in store.verts_of_face(face)? {
            match self.mirror_vertex(store, index, v, axis)? {
                Some(m) => mirrored.push(m),
                None => return Ok(None),
            }
        }
        let Some(&first) = mirrored.first() else {
            return Ok(None);
        };

        for candidate in store.faces_of_vertex(first)? {
            let same_len = store.face(candidate)?.len() == mirrored.len();
            if same_len && store.verts_of_face(candidate)?.all(|v| mirrored.contains(&v)) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}
