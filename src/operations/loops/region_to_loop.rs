use crate::error::Result;
use crate::topology::{EdgeId, FaceId, MeshStore, VisitedSet};

/// Finds the edges separating a face region from the rest of the mesh.
///
/// An edge is on the boundary when at least one of its faces is in the
/// region and either another face is not, or it is the edge's only face.
pub struct RegionToLoop<'a> {
    faces: &'a [FaceId],
}

impl<'a> RegionToLoop<'a> {
    /// Creates a new `RegionToLoop` operation over the given region.
    #[must_use]
    pub fn new(faces: &'a [FaceId]) -> Self {
        Self { faces }
    }

    /// Executes the operation.
    ///
    /// Returns distinct boundary edges in discovery order (region order,
    /// then winding order within each face).
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing from the store.
    pub fn execute(&self, store: &MeshStore) -> Result<Vec<EdgeId>> {
        let region: VisitedSet<FaceId> = self.faces.iter().copied().collect();
        let mut seen = VisitedSet::new();
        let mut boundary = Vec::new();

        for &face in self.faces {
            for edge in store.edges_of_face(face)? {
                if !seen.insert(edge) {
                    continue;
                }
                let outside = store.faces_of_edge(edge)?.any(|f| !region.contains(f));
                if outside || store.edge(edge)?.face_count() == 1 {
                    boundary.push(edge);
                }
            }
        }

        Ok(boundary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::operations::creation::{Grid, MakeCylinder, MakeGrid};

    #[test]
    fn empty_region_has_no_boundary() {
        let mut store = MeshStore::new();
        MakeGrid::new(3, 3, 1.0).execute(&mut store).unwrap();
        assert!(RegionToLoop::new(&[]).execute(&store).unwrap().is_empty());
    }

    /// Grid edges around the block of columns `i0..i1` and rows `j0..j1`.
    fn perimeter(
        store: &MeshStore,
        grid: &Grid,
        (i0, i1): (usize, usize),
        (j0, j1): (usize, usize),
    ) -> Vec<EdgeId> {
        let edge = |a: (usize, usize), b: (usize, usize)| {
            let a = grid.vertex_at(a.0, a.1).unwrap();
            let b = grid.vertex_at(b.0, b.1).unwrap();
            store.edge_between(a, b).unwrap()
        };
        let mut edges = Vec::new();
        for i in i0..i1 {
            edges.push(edge((i, j0), (i + 1, j0)));
            edges.push(edge((i, j1), (i + 1, j1)));
        }
        for j in j0..j1 {
            edges.push(edge((i0, j), (i0, j + 1)));
            edges.push(edge((i1, j), (i1, j + 1)));
        }
        edges
    }

    #[test]
    fn block_boundary_is_its_perimeter() {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(8, 8, 1.0).execute(&mut store).unwrap();
        for (w, h) in [(1, 1), (2, 3), (4, 2), (5, 5)] {
            let block = grid.block(1, 1 + w, 2, 2 + h);
            let boundary = RegionToLoop::new(&block).execute(&store).unwrap();
            assert_eq!(boundary.len(), 2 * (w + h), "block {w}x{h}");

            let distinct: HashSet<EdgeId> = boundary.iter().copied().collect();
            assert_eq!(distinct.len(), boundary.len(), "block {w}x{h} repeats an edge");
            let expected: HashSet<EdgeId> = perimeter(&store, &grid, (1, 1 + w), (2, 2 + h))
                .into_iter()
                .collect();
            assert_eq!(distinct, expected, "block {w}x{h}");
        }
    }

    #[test]
    fn boundary_starts_with_the_first_face() {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(4, 4, 1.0).execute(&mut store).unwrap();
        let first = grid.face_at(1, 1).unwrap();
        let region = [first, grid.face_at(2, 1).unwrap()];
        let boundary = RegionToLoop::new(&region).execute(&store).unwrap();

        // The shared edge is interior; the first face contributes its other three.
        let own: HashSet<EdgeId> = store.edges_of_face(first).unwrap().collect();
        assert_eq!(boundary.len(), 6);
        assert!(boundary[..3].iter().all(|e| own.contains(e)));
        assert!(boundary[3..].iter().all(|e| !own.contains(e)));
    }

    #[test]
    fn mesh_border_counts_as_boundary() {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(3, 3, 1.0).execute(&mut store).unwrap();
        let corner = [grid.face_at(0, 0).unwrap()];
        assert_eq!(RegionToLoop::new(&corner).execute(&store).unwrap().len(), 4);

        let boundary = RegionToLoop::new(&grid.faces).execute(&store).unwrap();
        assert_eq!(boundary.len(), 12);
    }

    #[test]
    fn closed_region_has_no_boundary() {
        let mut store = MeshStore::new();
        let mesh = MakeCylinder::new(6, 2, 1.0, 1.0)
            .with_caps(true)
            .execute(&mut store)
            .unwrap();
        assert!(RegionToLoop::new(&mesh.faces).execute(&store).unwrap().is_empty());
    }

    #[test]
    fn missing_face_is_an_error() {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(1, 1, 1.0).execute(&mut store).unwrap();
        let mut other = MeshStore::new();
        let foreign = MakeGrid::new(2, 2, 1.0).execute(&mut other).unwrap();
        let faces = [grid.faces[0], foreign.faces[3]];
        assert!(RegionToLoop::new(&faces).execute(&store).is_err());
    }
}
