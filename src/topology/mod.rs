pub mod corner;
pub mod edge;
pub mod face;
pub mod selection;
pub mod vertex;
pub mod visited;

pub use corner::{CornerData, CornerId};
pub use edge::{EdgeData, EdgeId};
pub use face::{FaceData, FaceId};
pub use selection::{ElementMode, ElementSet, MirrorAxes};
pub use vertex::{VertexData, VertexId};
pub use visited::VisitedSet;

use slotmap::SlotMap;

use crate::error::{Result, TopologyError};
use crate::math::polygon_3d::{centroid, newell_normal};
use crate::math::{transform_direction, transform_point, Matrix4, Point3, Vector3};

/// Central arena that owns a polygon mesh and its adjacency.
///
/// Entities reference each other via typed IDs (generational indices).
/// Adjacency is kept symmetric by construction: every face side is a corner
/// that is registered both on its face and in its edge's radial list.
#[derive(Debug, Clone)]
pub struct MeshStore {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    faces: SlotMap<FaceId, FaceData>,
    corners: SlotMap<CornerId, CornerData>,
    revision: u64,
    transform: Matrix4,
    select_mode: ElementMode,
    mirror_axes: MirrorAxes,
}

impl Default for MeshStore {
    fn default() -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            corners: SlotMap::with_key(),
            revision: 0,
            transform: Matrix4::identity(),
            select_mode: ElementMode::FACE,
            mirror_axes: MirrorAxes::empty(),
        }
    }
}

impl MeshStore {
    /// Creates a new, empty mesh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Settings ---

    /// Counter bumped by every structural change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Object-to-world transform.
    #[must_use]
    pub fn transform(&self) -> &Matrix4 {
        &self.transform
    }

    /// Sets the object-to-world transform.
    pub fn set_transform(&mut self, transform: Matrix4) {
        self.transform = transform;
    }

    /// Element kinds the user is currently selecting.
    #[must_use]
    pub fn select_mode(&self) -> ElementMode {
        self.select_mode
    }

    /// Sets the element select mode. An empty mode falls back to faces.
    pub fn set_select_mode(&mut self, mode: ElementMode) {
        self.select_mode = if mode.is_empty() {
            ElementMode::FACE
        } else {
            mode
        };
    }

    /// Axes the mesh is mirrored across for symmetric selection.
    #[must_use]
    pub fn mirror_axes(&self) -> MirrorAxes {
        self.mirror_axes
    }

    /// Sets the mirror axes.
    pub fn set_mirror_axes(&mut self, axes: MirrorAxes) {
        self.mirror_axes = axes;
    }

    // --- Construction ---

    /// Inserts an unconnected vertex and returns its ID.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.revision += 1;
        self.vertices.insert(VertexData::new(point))
    }

    /// Returns the edge joining `a` and `b`, creating a wire edge if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if either vertex is missing or `a == b`.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> Result<EdgeId> {
        self.vertex(a)?;
        self.vertex(b)?;
        if a == b {
            return Err(TopologyError::InvalidTopology("edge endpoints coincide".into()).into());
        }
        if let Some(existing) = self.edge_between(a, b) {
            return Ok(existing);
        }

        self.revision += 1;
        let edge = self.edges.insert(EdgeData::new(a, b));
        self.vertex_mut(a)?.edges.push(edge);
        self.vertex_mut(b)?.edges.push(edge);
        Ok(edge)
    }

    /// Inserts a polygon face through the given vertices (in winding order),
    /// creating any missing edges.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex is missing, fewer than three vertices are
    /// given, or a vertex repeats.
    pub fn add_face(&mut self, vertices: &[VertexId]) -> Result<FaceId> {
        let n = vertices.len();
        if n < 3 {
            return Err(TopologyError::InvalidTopology(format!(
                "face needs at least 3 vertices, got {n}"
            ))
            .into());
        }
        for (i, &v) in vertices.iter().enumerate() {
            self.vertex(v)?;
            if vertices[..i].contains(&v) {
                return Err(TopologyError::InvalidTopology("face repeats a vertex".into()).into());
            }
        }

        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            edges.push(self.add_edge(vertices[i], vertices[(i + 1) % n])?);
        }

        self.revision += 1;
        let face = self.faces.insert(FaceData {
            corners: Vec::with_capacity(n),
            select: false,
        });

        let corners: Vec<CornerId> = (0..n)
            .map(|i| {
                self.corners.insert(CornerData {
                    face,
                    vertex: vertices[i],
                    edge: edges[i],
                    next: CornerId::default(),
                    prev: CornerId::default(),
                })
            })
            .collect();

        for i in 0..n {
            let corner = self.corner_mut(corners[i])?;
            corner.next = corners[(i + 1) % n];
            corner.prev = corners[(i + n - 1) % n];
            self.edge_mut(edges[i])?.corners.push(corners[i]);
        }
        self.face_mut(face)?.corners = corners;

        Ok(face)
    }

    // --- Lookup ---

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex").into())
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex").into())
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge").into())
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge").into())
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face(&self, id: FaceId) -> Result<&FaceData> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face").into())
    }

    /// Returns a mutable reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face").into())
    }

    /// Returns a copy of the corner data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn corner(&self, id: CornerId) -> Result<CornerData> {
        self.corners
            .get(id)
            .copied()
            .ok_or_else(|| TopologyError::EntityNotFound("corner").into())
    }

    fn corner_mut(&mut self, id: CornerId) -> Result<&mut CornerData> {
        self.corners
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("corner").into())
    }

    /// Returns `true` if the vertex exists.
    #[must_use]
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    /// Returns `true` if the edge exists.
    #[must_use]
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// Returns `true` if the face exists.
    #[must_use]
    pub fn contains_face(&self, id: FaceId) -> bool {
        self.faces.contains_key(id)
    }

    // --- Enumeration (arena order, stable between structural edits) ---

    /// Iterates vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    /// Iterates edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys()
    }

    /// Iterates face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys()
    }

    /// Iterates vertices with their data.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> + '_ {
        self.vertices.iter()
    }

    /// Iterates edges with their data.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> + '_ {
        self.edges.iter()
    }

    /// Iterates faces with their data.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> + '_ {
        self.faces.iter()
    }

    /// Number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    // --- Adjacency ---

    /// Edges of a face in winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn edges_of_face(&self, face: FaceId) -> Result<impl Iterator<Item = EdgeId> + '_> {
        let corners = &self.face(face)?.corners;
        Ok(corners
            .iter()
            .filter_map(|&c| self.corners.get(c).map(|c| c.edge)))
    }

    /// Vertices of a face in winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn verts_of_face(&self, face: FaceId) -> Result<impl Iterator<Item = VertexId> + '_> {
        let corners = &self.face(face)?.corners;
        Ok(corners
            .iter()
            .filter_map(|&c| self.corners.get(c).map(|c| c.vertex)))
    }

    /// Faces using an edge, one entry per face side.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    pub fn faces_of_edge(&self, edge: EdgeId) -> Result<impl Iterator<Item = FaceId> + '_> {
        let corners = &self.edge(edge)?.corners;
        Ok(corners
            .iter()
            .filter_map(|&c| self.corners.get(c).map(|c| c.face)))
    }

    /// End vertices of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    pub fn verts_of_edge(&self, edge: EdgeId) -> Result<[VertexId; 2]> {
        Ok(self.edge(edge)?.vertices)
    }

    /// Edges incident to a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing.
    pub fn edges_of_vertex(&self, vertex: VertexId) -> Result<&[EdgeId]> {
        Ok(&self.vertex(vertex)?.edges)
    }

    /// Distinct faces around a vertex, in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing.
    pub fn faces_of_vertex(&self, vertex: VertexId) -> Result<Vec<FaceId>> {
        let mut faces = Vec::new();
        for &edge in &self.vertex(vertex)?.edges {
            for face in self.faces_of_edge(edge)? {
                if !faces.contains(&face) {
                    faces.push(face);
                }
            }
        }
        Ok(faces)
    }

    /// The vertex at the other end of `edge` from `vertex`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing or does not touch `vertex`.
    pub fn other_vertex(&self, edge: EdgeId, vertex: VertexId) -> Result<VertexId> {
        let [a, b] = self.edge(edge)?.vertices;
        if a == vertex {
            Ok(b)
        } else if b == vertex {
            Ok(a)
        } else {
            Err(TopologyError::InvalidTopology("vertex is not on edge".into()).into())
        }
    }

    /// The edge joining `a` and `b`, if any.
    #[must_use]
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let data = self.vertices.get(a)?;
        data.edges.iter().copied().find(|&e| {
            self.edges
                .get(e)
                .is_some_and(|edge| edge.has_vertex(b) && a != b)
        })
    }

    /// Returns `true` if the two edges share at least one face.
    #[must_use]
    pub fn edges_share_face(&self, a: EdgeId, b: EdgeId) -> bool {
        let (Ok(fa), Ok(fb)) = (self.faces_of_edge(a), self.faces_of_edge(b)) else {
            return false;
        };
        let fb: Vec<FaceId> = fb.collect();
        fa.into_iter().any(|f| fb.contains(&f))
    }

    /// The corner of `face` whose side is `edge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing or not a side of `face`.
    pub fn corner_of(&self, face: FaceId, edge: EdgeId) -> Result<CornerData> {
        self.edge(edge)?
            .corners
            .iter()
            .filter_map(|&c| self.corners.get(c))
            .find(|c| c.face == face)
            .copied()
            .ok_or_else(|| TopologyError::EntityNotFound("corner").into())
    }

    /// The edge following `edge` around `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if `edge` is not a side of `face`.
    pub fn loop_next(&self, face: FaceId, edge: EdgeId) -> Result<EdgeId> {
        let corner = self.corner_of(face, edge)?;
        Ok(self.corner(corner.next)?.edge)
    }

    /// The edge two steps after `edge` around `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if `edge` is not a side of `face`.
    pub fn loop_next_next(&self, face: FaceId, edge: EdgeId) -> Result<EdgeId> {
        let corner = self.corner_of(face, edge)?;
        let next = self.corner(corner.next)?;
        Ok(self.corner(next.next)?.edge)
    }

    // --- Geometry ---

    /// Object-space positions of a face's vertices in winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its vertices is missing.
    pub fn face_points(&self, face: FaceId) -> Result<Vec<Point3>> {
        self.verts_of_face(face)?
            .map(|v| self.vertex(v).map(|d| d.point))
            .collect()
    }

    /// Unit normal of a face (zero for degenerate faces).
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn face_normal(&self, face: FaceId) -> Result<Vector3> {
        Ok(newell_normal(&self.face_points(face)?).unwrap_or_else(Vector3::zeros))
    }

    /// Centroid of a face's vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn face_center(&self, face: FaceId) -> Result<Point3> {
        Ok(centroid(&self.face_points(face)?))
    }

    /// Unit vertex normal: mean of the incident face normals (zero when the
    /// vertex has no faces).
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing.
    pub fn vertex_normal(&self, vertex: VertexId) -> Result<Vector3> {
        let mut sum = Vector3::zeros();
        for face in self.faces_of_vertex(vertex)? {
            sum += self.face_normal(face)?;
        }
        Ok(sum.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros))
    }

    /// World-space position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing.
    pub fn world_point(&self, vertex: VertexId) -> Result<Point3> {
        Ok(transform_point(&self.transform, &self.vertex(vertex)?.point))
    }

    /// World-space position of an arbitrary object-space point.
    #[must_use]
    pub fn to_world(&self, point: &Point3) -> Point3 {
        transform_point(&self.transform, point)
    }

    /// World-space unit vertex normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing.
    pub fn world_vertex_normal(&self, vertex: VertexId) -> Result<Vector3> {
        let n = transform_direction(&self.transform, &self.vertex_normal(vertex)?);
        Ok(n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros))
    }

    /// World-space unit face normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn world_face_normal(&self, face: FaceId) -> Result<Vector3> {
        let n = transform_direction(&self.transform, &self.face_normal(face)?);
        Ok(n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros))
    }

    /// World-space end points of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or its vertices are missing.
    pub fn world_edge(&self, edge: EdgeId) -> Result<(Point3, Point3)> {
        let [a, b] = self.verts_of_edge(edge)?;
        Ok((self.world_point(a)?, self.world_point(b)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Two quads sharing the edge x = 1.
    fn two_quads(store: &mut MeshStore) -> (FaceId, FaceId, [VertexId; 6]) {
        let v = [
            store.add_vertex(p(0.0, 0.0, 0.0)),
            store.add_vertex(p(1.0, 0.0, 0.0)),
            store.add_vertex(p(2.0, 0.0, 0.0)),
            store.add_vertex(p(0.0, 1.0, 0.0)),
            store.add_vertex(p(1.0, 1.0, 0.0)),
            store.add_vertex(p(2.0, 1.0, 0.0)),
        ];
        let a = store.add_face(&[v[0], v[1], v[4], v[3]]).unwrap();
        let b = store.add_face(&[v[1], v[2], v[5], v[4]]).unwrap();
        (a, b, v)
    }

    #[test]
    fn shared_edge_is_created_once() {
        let mut store = MeshStore::new();
        let (a, b, v) = two_quads(&mut store);
        assert_eq!(store.num_edges(), 7);

        let shared = store.edge_between(v[1], v[4]).unwrap();
        let faces: Vec<FaceId> = store.faces_of_edge(shared).unwrap().collect();
        assert_eq!(faces, vec![a, b]);
    }

    #[test]
    fn adjacency_is_symmetric() {
        let mut store = MeshStore::new();
        two_quads(&mut store);
        for (face, _) in store.faces() {
            for edge in store.edges_of_face(face).unwrap() {
                assert!(store.faces_of_edge(edge).unwrap().any(|f| f == face));
            }
        }
    }

    #[test]
    fn loop_next_walks_winding_order() {
        let mut store = MeshStore::new();
        let (a, _, v) = two_quads(&mut store);
        let bottom = store.edge_between(v[0], v[1]).unwrap();
        let right = store.edge_between(v[1], v[4]).unwrap();
        let top = store.edge_between(v[4], v[3]).unwrap();
        assert_eq!(store.loop_next(a, bottom).unwrap(), right);
        assert_eq!(store.loop_next_next(a, bottom).unwrap(), top);
    }

    #[test]
    fn loop_next_rejects_foreign_edge() {
        let mut store = MeshStore::new();
        let (a, _, v) = two_quads(&mut store);
        let far = store.edge_between(v[2], v[5]).unwrap();
        assert!(store.loop_next(a, far).is_err());
    }

    #[test]
    fn invalid_faces_are_rejected() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(p(0.0, 0.0, 0.0));
        let b = store.add_vertex(p(1.0, 0.0, 0.0));
        assert!(store.add_face(&[a, b]).is_err());
        assert!(store.add_face(&[a, b, a]).is_err());
        assert!(store.add_edge(a, a).is_err());
    }

    #[test]
    fn revision_tracks_structural_edits() {
        let mut store = MeshStore::new();
        let before = store.revision();
        two_quads(&mut store);
        assert!(store.revision() > before);

        let after = store.revision();
        store.set_transform(Matrix4::new_scaling(2.0));
        assert_eq!(store.revision(), after);
    }

    #[test]
    fn normals_and_world_points() {
        let mut store = MeshStore::new();
        let (a, _, v) = two_quads(&mut store);
        assert_relative_eq!(store.face_normal(a).unwrap(), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(store.vertex_normal(v[1]).unwrap(), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(store.face_center(a).unwrap(), p(0.5, 0.5, 0.0), epsilon = 1e-12);

        store.set_transform(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 3.0)));
        assert_relative_eq!(store.world_point(v[2]).unwrap(), p(2.0, 0.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn faces_of_vertex_are_distinct() {
        let mut store = MeshStore::new();
        let (a, b, v) = two_quads(&mut store);
        assert_eq!(store.faces_of_vertex(v[4]).unwrap(), vec![a, b]);
        assert_eq!(store.faces_of_vertex(v[0]).unwrap(), vec![a]);
    }
}
