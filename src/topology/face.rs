use super::corner::CornerId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the mesh store.
    pub struct FaceId;
}

/// Data associated with a polygon face.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// Corners in winding order; corner `i` owns the side from vertex `i` to
    /// vertex `i + 1`.
    pub(crate) corners: Vec<CornerId>,
    /// Selection flag.
    pub select: bool,
}

impl FaceData {
    /// Corners in winding order.
    #[must_use]
    pub fn corners(&self) -> &[CornerId] {
        &self.corners
    }

    /// Number of sides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// Always `false` for faces created through the store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }
}
