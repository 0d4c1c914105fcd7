use tracing::debug;

use crate::error::{OperationError, Result, SelectError};
use crate::topology::{FaceId, MeshStore};

use super::{AcceleratedLoopExtender, GrowToBoundaryLoop};

/// Strategy for growing a face region to its boundary loops.
pub trait LoopExtender {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Grows `faces` outward, or inward when `inner` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing or the implementation cannot
    /// serve this store.
    fn extend(&self, store: &MeshStore, faces: &[FaceId], inner: bool) -> Result<Vec<FaceId>>;
}

/// Loop extender running [`GrowToBoundaryLoop`] directly on the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceLoopExtender;

impl LoopExtender for ReferenceLoopExtender {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn extend(&self, store: &MeshStore, faces: &[FaceId], inner: bool) -> Result<Vec<FaceId>> {
        GrowToBoundaryLoop::new(faces).inner(inner).execute(store)
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Accelerated(Box<AcceleratedLoopExtender>),
    Reference(ReferenceLoopExtender),
}

/// Loop extender chosen once per session.
///
/// [`LoopExtension::probe`] prefers the accelerated snapshot. If a call on it
/// reports [`OperationError::BackendUnavailable`], that call is answered by
/// the reference implementation and the session stays on it from then on.
#[derive(Debug, Clone)]
pub struct LoopExtension {
    backend: Backend,
}

impl LoopExtension {
    /// Picks the best available implementation for `store`.
    #[must_use]
    pub fn probe(store: &MeshStore) -> Self {
        let backend = match AcceleratedLoopExtender::build(store) {
            Ok(fast) => Backend::Accelerated(Box::new(fast)),
            Err(e) => {
                debug!(error = %e, "accelerated loop extension unavailable");
                Backend::Reference(ReferenceLoopExtender)
            }
        };
        Self { backend }
    }

    /// Always uses the reference implementation.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            backend: Backend::Reference(ReferenceLoopExtender),
        }
    }

    /// Name of the implementation currently in use.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Accelerated(fast) => fast.name(),
            Backend::Reference(slow) => slow.name(),
        }
    }

    /// Grows `faces` with the current implementation, falling back when the
    /// accelerated one is unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing from the store.
    pub fn extend(&mut self, store: &MeshStore, faces: &[FaceId], inner: bool) -> Result<Vec<FaceId>> {
        if let Backend::Accelerated(fast) = &self.backend {
            match fast.extend(store, faces, inner) {
                Err(SelectError::Operation(OperationError::BackendUnavailable(reason))) => {
                    debug!(%reason, "falling back to reference loop extension");
                    self.backend = Backend::Reference(ReferenceLoopExtender);
                }
                other => return other,
            }
        }
        ReferenceLoopExtender.extend(store, faces, inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeGrid;

    #[test]
    fn probe_prefers_accelerated() {
        let mut store = MeshStore::new();
        MakeGrid::new(2, 2, 1.0).execute(&mut store).unwrap();
        assert_eq!(LoopExtension::probe(&store).backend_name(), "accelerated");
        assert_eq!(LoopExtension::reference().backend_name(), "reference");
    }

    #[test]
    fn stale_snapshot_falls_back_for_good() {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(6, 6, 1.0).execute(&mut store).unwrap();
        let mut extension = LoopExtension::probe(&store);
        store.add_vertex(Point3::new(10.0, 10.0, 0.0));

        let seed = [
            grid.face_at(1, 1).unwrap(),
            grid.face_at(2, 1).unwrap(),
            grid.face_at(1, 2).unwrap(),
        ];
        let grown = extension.extend(&store, &seed, false).unwrap();
        assert_eq!(grown.len(), 4);
        assert_eq!(extension.backend_name(), "reference");

        let again = extension.extend(&store, &seed, false).unwrap();
        assert_eq!(grown, again);
    }

    #[test]
    fn missing_faces_still_surface() {
        let mut store = MeshStore::new();
        MakeGrid::new(2, 2, 1.0).execute(&mut store).unwrap();
        let mut other = MeshStore::new();
        let foreign = MakeGrid::new(4, 4, 1.0).execute(&mut other).unwrap();

        let mut extension = LoopExtension::reference();
        assert!(extension.extend(&store, &foreign.faces[10..11], false).is_err());
    }
}
