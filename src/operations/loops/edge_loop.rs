use crate::error::Result;
use crate::topology::{EdgeId, MeshStore, VertexId, VisitedSet};

/// Expands seed edges to the edge loops running through them.
///
/// Each seed is walked in both directions until the walk closes on itself
/// or reaches a vertex where the loop cannot continue:
///
/// - a manifold edge continues through a vertex with exactly four manifold
///   edges, into the one edge sharing no face with it;
/// - a boundary edge continues into the other boundary edge of a vertex
///   that has exactly two;
/// - a wire edge continues through a vertex of valence two;
/// - a non-manifold edge never continues.
pub struct EdgeLoop<'a> {
    seeds: &'a [EdgeId],
}

impl<'a> EdgeLoop<'a> {
    /// Creates a new `EdgeLoop` operation.
    #[must_use]
    pub fn new(seeds: &'a [EdgeId]) -> Self {
        Self { seeds }
    }

    /// Executes the operation.
    ///
    /// Returns the union of all walks as distinct edges in discovery order.
    ///
    /// # Errors
    ///
    /// Returns an error if a seed edge is missing from the store.
    pub fn execute(&self, store: &MeshStore) -> Result<Vec<EdgeId>> {
        let mut seen = VisitedSet::new();
        let mut result = Vec::new();

        for &seed in self.seeds {
            if seen.contains(seed) {
                continue;
            }
            let [a, b] = store.verts_of_edge(seed)?;
            seen.insert(seed);
            result.push(seed);
            for start in [b, a] {
                walk(store, seed, start, &mut seen, &mut result)?;
            }
        }

        Ok(result)
    }
}

fn walk(
    store: &MeshStore,
    seed: EdgeId,
    start: VertexId,
    seen: &mut VisitedSet<EdgeId>,
    out: &mut Vec<EdgeId>,
) -> Result<()> {
    let mut edge = seed;
    let mut vertex = start;

    while let Some(next) = continue_through(store, edge, vertex)? {
        if next == seed || !seen.insert(next) {
            break;
        }
        out.push(next);
        vertex = store.other_vertex(next, vertex)?;
        edge = next;
    }
    Ok(())
}

/// The edge continuing the loop of `edge` through `vertex`, if any.
fn continue_through(store: &MeshStore, edge: EdgeId, vertex: VertexId) -> Result<Option<EdgeId>> {
    let incident = store.edges_of_vertex(vertex)?;

    let next = match store.edge(edge)?.face_count() {
        0 => {
            if incident.len() == 2 {
                incident.iter().copied().find(|&e| e != edge)
            } else {
                None
            }
        }
        1 => {
            let mut boundary = Vec::with_capacity(2);
            for &e in incident {
                if store.edge(e)?.face_count() == 1 {
                    boundary.push(e);
                }
            }
            if boundary.len() == 2 {
                boundary.into_iter().find(|&e| e != edge)
            } else {
                None
            }
        }
        2 => {
            if incident.len() != 4 {
                return Ok(None);
            }
            for &e in incident {
                if store.edge(e)?.face_count() != 2 {
                    return Ok(None);
                }
            }
            let mut opposite = incident
                .iter()
                .copied()
                .filter(|&e| e != edge && !store.edges_share_face(edge, e));
            match (opposite.next(), opposite.next()) {
                (Some(e), None) => Some(e),
                _ => None,
            }
        }
        _ => None,
    };
    Ok(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeCylinder, MakeGrid, MakeMesh};

    #[test]
    fn cylinder_ring_is_closed_loop() {
        let mut store = MeshStore::new();
        let mesh = MakeCylinder::new(8, 2, 1.0, 2.0).execute(&mut store).unwrap();
        // Edge on the middle ring between segment 0 and 1.
        let seed = store
            .edge_between(mesh.vertices[8], mesh.vertices[9])
            .unwrap();
        let ring = EdgeLoop::new(&[seed]).execute(&store).unwrap();
        assert_eq!(ring.len(), 8);
    }

    #[test]
    fn closed_loop_is_idempotent() {
        let mut store = MeshStore::new();
        let mesh = MakeCylinder::new(6, 3, 1.0, 3.0).execute(&mut store).unwrap();
        let seed = store
            .edge_between(mesh.vertices[6], mesh.vertices[7])
            .unwrap();
        let first = EdgeLoop::new(&[seed]).execute(&store).unwrap();
        let second = EdgeLoop::new(&first).execute(&store).unwrap();
        let a: VisitedSet<EdgeId> = first.into_iter().collect();
        let b: VisitedSet<EdgeId> = second.into_iter().collect();
        assert_eq!(a.len(), b.len());
        assert!(a.iter().all(|e| b.contains(e)));
    }

    #[test]
    fn grid_line_stops_at_mesh_border() {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(5, 4, 1.0).execute(&mut store).unwrap();
        // Interior horizontal edge on row line 2.
        let seed = store
            .edge_between(grid.vertex_at(2, 2).unwrap(), grid.vertex_at(3, 2).unwrap())
            .unwrap();
        let line = EdgeLoop::new(&[seed]).execute(&store).unwrap();
        assert_eq!(line.len(), 5);
        for e in line {
            let [a, b] = store.verts_of_edge(e).unwrap();
            let ya = store.vertex(a).unwrap().point.y;
            let yb = store.vertex(b).unwrap().point.y;
            assert!((ya - yb).abs() < 1e-12);
        }
    }

    #[test]
    fn open_boundary_walks_whole_border() {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(3, 2, 1.0).execute(&mut store).unwrap();
        let seed = store
            .edge_between(grid.vertex_at(0, 0).unwrap(), grid.vertex_at(1, 0).unwrap())
            .unwrap();
        let border = EdgeLoop::new(&[seed]).execute(&store).unwrap();
        assert_eq!(border.len(), 10);
    }

    #[test]
    fn wire_chain_is_followed() {
        let mut store = MeshStore::new();
        let v: Vec<VertexId> = (0..4_i32)
            .map(|i| store.add_vertex(Point3::new(f64::from(i), 0.0, 0.0)))
            .collect();
        let e0 = store.add_edge(v[0], v[1]).unwrap();
        store.add_edge(v[1], v[2]).unwrap();
        store.add_edge(v[2], v[3]).unwrap();
        assert_eq!(EdgeLoop::new(&[e0]).execute(&store).unwrap().len(), 3);
    }

    #[test]
    fn non_manifold_edge_does_not_continue() {
        let mut store = MeshStore::new();
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let polygons = vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]];
        MakeMesh::new(points, polygons).execute(&mut store).unwrap();
        let fin = store.edges().find(|(_, e)| e.face_count() == 3).unwrap().0;
        assert_eq!(EdgeLoop::new(&[fin]).execute(&store).unwrap(), vec![fin]);
    }
}
