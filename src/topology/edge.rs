use super::corner::CornerId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the mesh store.
    pub struct EdgeId;
}

/// Data associated with a mesh edge.
///
/// An edge connects two vertices. Faces using the edge are reached through
/// its radial list of corners: one corner per face side.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// The two end vertices, in creation order.
    pub(crate) vertices: [VertexId; 2],
    /// Corners whose outgoing side is this edge.
    pub(crate) corners: Vec<CornerId>,
    /// Selection flag.
    pub select: bool,
}

impl EdgeData {
    pub(crate) fn new(a: VertexId, b: VertexId) -> Self {
        Self {
            vertices: [a, b],
            corners: Vec::new(),
            select: false,
        }
    }

    /// The two end vertices.
    #[must_use]
    pub fn vertices(&self) -> [VertexId; 2] {
        self.vertices
    }

    /// Corners using this edge (one per incident face side).
    #[must_use]
    pub fn corners(&self) -> &[CornerId] {
        &self.corners
    }

    /// Number of face sides using this edge.
    ///
    /// 0 = wire edge, 1 = boundary, 2 = manifold, more = non-manifold.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.corners.len()
    }

    /// Returns `true` if `v` is one of the end vertices.
    #[must_use]
    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.vertices[0] == v || self.vertices[1] == v
    }
}
