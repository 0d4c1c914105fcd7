use crate::math::Point3;

use super::edge::EdgeId;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the mesh store.
    pub struct VertexId;
}

/// Data associated with a mesh vertex.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The 3D position of the vertex in object space.
    pub point: Point3,
    /// Selection flag.
    pub select: bool,
    /// Incident edges, in insertion order.
    pub(crate) edges: Vec<EdgeId>,
}

impl VertexData {
    /// Creates a new, unconnected vertex at the given point.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            select: false,
            edges: Vec::new(),
        }
    }

    /// Incident edges, in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Number of incident edges.
    #[must_use]
    pub fn valence(&self) -> usize {
        self.edges.len()
    }
}
