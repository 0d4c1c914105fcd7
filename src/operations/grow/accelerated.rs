use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{OperationError, Result, SelectError};
use crate::operations::loops::EdgeLoop;
use crate::topology::{EdgeId, FaceId, MeshStore};

use super::extender::LoopExtender;

/// Loop extender working on a dense index snapshot of the mesh.
///
/// The snapshot maps faces and edges to contiguous `u32` indices once, so
/// growth runs on flat arrays and bitmaps instead of hash sets. Results are
/// identical to [`super::ReferenceLoopExtender`], including their order.
///
/// A snapshot is tied to the store revision it was built from; calls on a
/// store that has been structurally edited since fail with
/// [`OperationError::BackendUnavailable`].
#[derive(Debug, Clone)]
pub struct AcceleratedLoopExtender {
    revision: u64,
    face_ids: Vec<FaceId>,
    edge_ids: Vec<EdgeId>,
    face_index: HashMap<FaceId, u32>,
    edge_index: HashMap<EdgeId, u32>,
    /// Sides of each face in winding order.
    face_edges: Vec<Vec<u32>>,
    /// Faces of each edge in radial order.
    edge_faces: Vec<Vec<u32>>,
}

impl AcceleratedLoopExtender {
    /// Builds the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::BackendUnavailable`] if the mesh is too large
    /// for 32-bit indices.
    pub fn build(store: &MeshStore) -> Result<Self> {
        let face_ids: Vec<FaceId> = store.face_ids().collect();
        let edge_ids: Vec<EdgeId> = store.edge_ids().collect();
        let too_large = || OperationError::BackendUnavailable("mesh exceeds u32 indices".into());

        let mut face_index = HashMap::with_capacity(face_ids.len());
        for (i, &f) in face_ids.iter().enumerate() {
            face_index.insert(f, u32::try_from(i).map_err(|_| too_large())?);
        }
        let mut edge_index = HashMap::with_capacity(edge_ids.len());
        for (i, &e) in edge_ids.iter().enumerate() {
            edge_index.insert(e, u32::try_from(i).map_err(|_| too_large())?);
        }

        let lookup_edge = |e: EdgeId| -> Result<u32> {
            edge_index
                .get(&e)
                .copied()
                .ok_or_else(|| OperationError::BackendUnavailable("edge missing from snapshot".into()).into())
        };
        let lookup_face = |f: FaceId| -> Result<u32> {
            face_index
                .get(&f)
                .copied()
                .ok_or_else(|| OperationError::BackendUnavailable("face missing from snapshot".into()).into())
        };

        let mut face_edges = Vec::with_capacity(face_ids.len());
        for &f in &face_ids {
            face_edges.push(
                store
                    .edges_of_face(f)?
                    .map(lookup_edge)
                    .collect::<Result<Vec<u32>>>()?,
            );
        }
        let mut edge_faces = Vec::with_capacity(edge_ids.len());
        for &e in &edge_ids {
            edge_faces.push(
                store
                    .faces_of_edge(e)?
                    .map(lookup_face)
                    .collect::<Result<Vec<u32>>>()?,
            );
        }

        debug!(
            faces = face_ids.len(),
            edges = edge_ids.len(),
            revision = store.revision(),
            "built dense loop snapshot"
        );

        Ok(Self {
            revision: store.revision(),
            face_ids,
            edge_ids,
            face_index,
            edge_index,
            face_edges,
            edge_faces,
        })
    }

    /// Store revision the snapshot was built from.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn check_fresh(&self, store: &MeshStore) -> Result<()> {
        if store.revision() == self.revision {
            Ok(())
        } else {
            Err(OperationError::BackendUnavailable(format!(
                "snapshot revision {} is stale (store at {})",
                self.revision,
                store.revision()
            ))
            .into())
        }
    }

    fn dense_faces(&self, faces: &[FaceId]) -> Result<Vec<u32>> {
        faces
            .iter()
            .map(|f| {
                self.face_index.get(f).copied().ok_or_else(|| {
                    SelectError::from(OperationError::BackendUnavailable(
                        "face missing from snapshot".into(),
                    ))
                })
            })
            .collect()
    }

    /// Boundary sides of a region, in region then winding order.
    fn region_boundary(&self, region: &[u32], member: &[bool]) -> Vec<u32> {
        let mut seen = vec![false; self.edge_ids.len()];
        let mut boundary = Vec::new();
        for &f in region {
            for &e in &self.face_edges[f as usize] {
                if std::mem::replace(&mut seen[e as usize], true) {
                    continue;
                }
                let faces = &self.edge_faces[e as usize];
                if faces.len() == 1 || faces.iter().any(|&g| !member[g as usize]) {
                    boundary.push(e);
                }
            }
        }
        boundary
    }

    fn grow_outward(
        &self,
        store: &MeshStore,
        seed: &[u32],
        allowed: Option<&[bool]>,
    ) -> Result<Vec<u32>> {
        let mut selected = vec![false; self.face_ids.len()];
        let mut result = Vec::with_capacity(seed.len());
        for &f in seed {
            if !std::mem::replace(&mut selected[f as usize], true) {
                result.push(f);
            }
        }

        let boundary = self.region_boundary(&result, &selected);

        let seeds: Vec<EdgeId> = boundary.iter().map(|&e| self.edge_ids[e as usize]).collect();
        let mut in_loop = vec![false; self.edge_ids.len()];
        for e in EdgeLoop::new(&seeds).execute(store)? {
            if let Some(&i) = self.edge_index.get(&e) {
                in_loop[i as usize] = true;
            }
        }

        let mut in_boundary = vec![false; self.edge_ids.len()];
        let mut frontier = Vec::with_capacity(boundary.len());
        for e in boundary {
            in_boundary[e as usize] = true;
            frontier.push(e);
        }

        while let Some(e) = frontier.pop() {
            let faces = &self.edge_faces[e as usize];
            if faces.is_empty() {
                warn!(edge = ?self.edge_ids[e as usize], "boundary edge has no faces; growth stops here");
                continue;
            }

            for &f in faces {
                let fi = f as usize;
                if selected[fi] || allowed.is_some_and(|a| !a[fi]) {
                    continue;
                }

                let sides = &self.face_edges[fi];
                let n = sides.len();
                let hugs = (0..n).any(|k| {
                    in_boundary[sides[k] as usize]
                        && (in_boundary[sides[(k + 1) % n] as usize]
                            || in_loop[sides[(k + 2) % n] as usize])
                });
                if !hugs {
                    continue;
                }

                selected[fi] = true;
                result.push(f);
                for &side in sides {
                    if !std::mem::replace(&mut in_boundary[side as usize], true) {
                        frontier.push(side);
                    }
                }
            }
        }

        Ok(result)
    }

    fn grow_inward(&self, store: &MeshStore, region: &[u32]) -> Result<Vec<u32>> {
        let mut member = vec![false; self.face_ids.len()];
        for &f in region {
            member[f as usize] = true;
        }
        let mut on_boundary = vec![false; self.edge_ids.len()];
        for e in self.region_boundary(region, &member) {
            on_boundary[e as usize] = true;
        }

        let interior: Vec<u32> = region
            .iter()
            .copied()
            .filter(|&f| !self.face_edges[f as usize].iter().any(|&e| on_boundary[e as usize]))
            .collect();
        if interior.is_empty() {
            return Ok(interior);
        }
        self.grow_outward(store, &interior, Some(member.as_slice()))
    }
}

impl LoopExtender for AcceleratedLoopExtender {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn extend(&self, store: &MeshStore, faces: &[FaceId], inner: bool) -> Result<Vec<FaceId>> {
        self.check_fresh(store)?;
        let seed = self.dense_faces(faces)?;
        let grown = if inner {
            self.grow_inward(store, &seed)?
        } else {
            self.grow_outward(store, &seed, None)?
        };
        Ok(grown.into_iter().map(|f| self.face_ids[f as usize]).collect())
    }
}
