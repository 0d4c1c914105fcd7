use super::edge::EdgeId;
use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a face corner (a face-edge use).
    pub struct CornerId;
}

/// A face corner: one side of a face, starting at `vertex` and running along
/// `edge` to the vertex of `next`.
#[derive(Debug, Clone, Copy)]
pub struct CornerData {
    /// Owning face.
    pub face: FaceId,
    /// Vertex this corner starts from.
    pub vertex: VertexId,
    /// Edge from `vertex` to the next corner's vertex.
    pub edge: EdgeId,
    /// Next corner around the face.
    pub next: CornerId,
    /// Previous corner around the face.
    pub prev: CornerId,
}
