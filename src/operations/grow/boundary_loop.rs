use tracing::{debug, warn};

use crate::error::Result;
use crate::operations::loops::{EdgeLoop, RegionToLoop};
use crate::topology::{EdgeId, FaceId, MeshStore, VisitedSet};

/// Grows a face region to the closed edge loops around it.
///
/// Outward growth annexes a neighbouring face when it hugs the current
/// boundary: one of its sides is a boundary edge and either the following
/// side is a boundary edge too, or the side two steps ahead lies on one of
/// the edge loops through the original boundary. Each annexed face adds its
/// new sides to the boundary and to a LIFO frontier; growth ends when the
/// frontier is empty.
///
/// Inward growth peels the faces touching the region boundary, then regrows
/// what is left outward without leaving the original region.
///
/// Faces of non-manifold edges are all considered, so growth may spread
/// through a pinch.
pub struct GrowToBoundaryLoop<'a> {
    faces: &'a [FaceId],
    inner: bool,
}

impl<'a> GrowToBoundaryLoop<'a> {
    /// Creates a new outward `GrowToBoundaryLoop` operation.
    #[must_use]
    pub fn new(faces: &'a [FaceId]) -> Self {
        Self {
            faces,
            inner: false,
        }
    }

    /// Grows inward instead of outward.
    #[must_use]
    pub fn inner(mut self, inner: bool) -> Self {
        self.inner = inner;
        self
    }

    /// Executes the operation.
    ///
    /// Returns the resulting faces: for outward growth the input faces
    /// first, then annexed faces in the order they were annexed.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing from the store.
    pub fn execute(&self, store: &MeshStore) -> Result<Vec<FaceId>> {
        if self.inner {
            grow_inward(store, self.faces)
        } else {
            grow_outward(store, self.faces, None)
        }
    }
}

fn grow_outward(
    store: &MeshStore,
    seed: &[FaceId],
    allowed: Option<&VisitedSet<FaceId>>,
) -> Result<Vec<FaceId>> {
    let mut selected = VisitedSet::new();
    let mut result = Vec::with_capacity(seed.len());
    for &face in seed {
        if selected.insert(face) {
            result.push(face);
        }
    }

    let boundary = RegionToLoop::new(&result).execute(store)?;
    let loop_edges: VisitedSet<EdgeId> = EdgeLoop::new(&boundary).execute(store)?.into_iter().collect();

    let mut boundary_edges = VisitedSet::new();
    let mut frontier = Vec::with_capacity(boundary.len());
    for edge in boundary {
        boundary_edges.insert(edge);
        frontier.push(edge);
    }

    while let Some(edge) = frontier.pop() {
        let faces: Vec<FaceId> = store.faces_of_edge(edge)?.collect();
        if faces.is_empty() {
            warn!(?edge, "boundary edge has no faces; growth stops here");
            continue;
        }

        for face in faces {
            if selected.contains(face) || allowed.is_some_and(|a| !a.contains(face)) {
                continue;
            }
            if !hugs_boundary(store, face, &boundary_edges, &loop_edges)? {
                continue;
            }

            selected.insert(face);
            result.push(face);
            for side in store.edges_of_face(face)? {
                if boundary_edges.insert(side) {
                    frontier.push(side);
                }
            }
        }
    }

    debug!(
        seed = seed.len(),
        grown = result.len(),
        loop_edges = loop_edges.len(),
        "grew region to boundary loop"
    );
    Ok(result)
}

/// Whether `face` follows the boundary along a side pair.
fn hugs_boundary(
    store: &MeshStore,
    face: FaceId,
    boundary_edges: &VisitedSet<EdgeId>,
    loop_edges: &VisitedSet<EdgeId>,
) -> Result<bool> {
    for &corner in store.face(face)?.corners() {
        let corner = store.corner(corner)?;
        if !boundary_edges.contains(corner.edge) {
            continue;
        }
        let next = store.corner(corner.next)?;
        let next_next = store.corner(next.next)?;
        if boundary_edges.contains(next.edge) || loop_edges.contains(next_next.edge) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn grow_inward(store: &MeshStore, region: &[FaceId]) -> Result<Vec<FaceId>> {
    let boundary: VisitedSet<EdgeId> = RegionToLoop::new(region).execute(store)?.into_iter().collect();

    let mut interior = Vec::new();
    for &face in region {
        let mut edges = store.edges_of_face(face)?;
        if !edges.any(|e| boundary.contains(e)) {
            interior.push(face);
        }
    }

    if interior.is_empty() {
        debug!(region = region.len(), "inward growth peeled the whole region");
        return Ok(interior);
    }

    let allowed: VisitedSet<FaceId> = region.iter().copied().collect();
    grow_outward(store, &interior, Some(&allowed))
}
