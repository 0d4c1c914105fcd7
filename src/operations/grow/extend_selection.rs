use tracing::debug;

use crate::error::Result;
use crate::topology::{ElementSet, FaceId, MeshStore};

use super::LoopExtension;

/// Extends the store's face selection to its boundary loops in place.
pub struct ExtendToBoundaryLoops {
    inner: bool,
}

impl ExtendToBoundaryLoops {
    /// Creates a new outward `ExtendToBoundaryLoops` operation.
    #[must_use]
    pub fn new() -> Self {
        Self { inner: false }
    }

    /// Shrinks to the inner loops instead.
    #[must_use]
    pub fn inner(mut self, inner: bool) -> Self {
        self.inner = inner;
        self
    }

    /// Executes the operation. The selection is replaced by the resulting
    /// faces together with their edges and vertices.
    ///
    /// Returns the resulting faces. An empty face selection is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension fails; the selection is then
    /// unchanged.
    pub fn execute(&self, store: &mut MeshStore, extension: &mut LoopExtension) -> Result<Vec<FaceId>> {
        let faces = store.selected_faces();
        if faces.is_empty() {
            return Ok(faces);
        }

        let grown = extension.extend(store, &faces, self.inner)?;
        let selection = ElementSet::from_faces(store, grown.iter().copied())?;
        selection.restore(store);

        debug!(
            before = faces.len(),
            after = grown.len(),
            backend = extension.backend_name(),
            "extended selection to boundary loops"
        );
        Ok(grown)
    }
}

impl Default for ExtendToBoundaryLoops {
    fn default() -> Self {
        Self::new()
    }
}
