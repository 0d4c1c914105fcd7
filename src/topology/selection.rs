use std::collections::HashSet;

use bitflags::bitflags;

use crate::error::Result;

use super::{EdgeId, FaceId, MeshStore, VertexId};

bitflags! {
    /// Element kinds the user is selecting; decides how flags flush.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementMode: u32 {
        const VERTEX = 0b001;
        const EDGE = 0b010;
        const FACE = 0b100;
    }
}

bitflags! {
    /// Object-space axes the mesh is mirrored across.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MirrorAxes: u32 {
        const X = 0b001;
        const Y = 0b010;
        const Z = 0b100;
    }
}

impl MeshStore {
    /// Sets the selection flag of a single vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing.
    pub fn set_vertex_select(&mut self, vertex: VertexId, select: bool) -> Result<()> {
        self.vertex_mut(vertex)?.select = select;
        Ok(())
    }

    /// Sets the selection flag of a single edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing.
    pub fn set_edge_select(&mut self, edge: EdgeId, select: bool) -> Result<()> {
        self.edge_mut(edge)?.select = select;
        Ok(())
    }

    /// Sets the selection flag of a single face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn set_face_select(&mut self, face: FaceId, select: bool) -> Result<()> {
        self.face_mut(face)?.select = select;
        Ok(())
    }

    /// Selects or deselects a face together with its boundary.
    ///
    /// Selecting marks the face, its edges and its vertices. Deselecting
    /// clears the face and every edge or vertex no other selected face uses.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn face_select_set(&mut self, face: FaceId, select: bool) -> Result<()> {
        self.set_face_select(face, select)?;
        let edges: Vec<EdgeId> = self.edges_of_face(face)?.collect();
        let verts: Vec<VertexId> = self.verts_of_face(face)?.collect();

        if select {
            for e in edges {
                self.set_edge_select(e, true)?;
            }
            for v in verts {
                self.set_vertex_select(v, true)?;
            }
            return Ok(());
        }

        for e in edges {
            let used = self.faces_of_edge(e)?.any(|f| self.face_selected(f));
            if !used {
                self.set_edge_select(e, false)?;
            }
        }
        for v in verts {
            let used = self
                .faces_of_vertex(v)?
                .into_iter()
                .any(|f| self.face_selected(f));
            if !used {
                self.set_vertex_select(v, false)?;
            }
        }
        Ok(())
    }

    fn face_selected(&self, face: FaceId) -> bool {
        self.face(face).is_ok_and(|f| f.select)
    }

    fn vertex_selected(&self, vertex: VertexId) -> bool {
        self.vertex(vertex).is_ok_and(|v| v.select)
    }

    fn edge_selected(&self, edge: EdgeId) -> bool {
        self.edge(edge).is_ok_and(|e| e.select)
    }

    /// Clears every selection flag.
    pub fn deselect_all(&mut self) {
        for (_, v) in &mut self.vertices {
            v.select = false;
        }
        for (_, e) in &mut self.edges {
            e.select = false;
        }
        for (_, f) in &mut self.faces {
            f.select = false;
        }
    }

    /// Selected vertices in arena order.
    #[must_use]
    pub fn selected_vertices(&self) -> Vec<VertexId> {
        self.vertices()
            .filter(|(_, v)| v.select)
            .map(|(id, _)| id)
            .collect()
    }

    /// Selected edges in arena order.
    #[must_use]
    pub fn selected_edges(&self) -> Vec<EdgeId> {
        self.edges()
            .filter(|(_, e)| e.select)
            .map(|(id, _)| id)
            .collect()
    }

    /// Selected faces in arena order.
    #[must_use]
    pub fn selected_faces(&self) -> Vec<FaceId> {
        self.faces()
            .filter(|(_, f)| f.select)
            .map(|(id, _)| id)
            .collect()
    }

    /// Makes the flags of all three element kinds consistent with the
    /// store's element mode.
    ///
    /// - VERTEX: edges and faces follow their vertices.
    /// - EDGE: vertices follow selected edges, faces need all their edges.
    /// - FACE: vertices and edges follow the selected faces.
    ///
    /// When several modes are active the finest one drives the flush.
    pub fn select_flush_mode(&mut self) {
        let mode = self.select_mode();
        if mode.contains(ElementMode::VERTEX) {
            self.flush_from_vertices();
        } else if mode.contains(ElementMode::EDGE) {
            self.flush_from_edges();
        } else {
            self.flush_from_faces();
        }
    }

    fn flush_from_vertices(&mut self) {
        let edge_flags: Vec<(EdgeId, bool)> = self
            .edges()
            .map(|(id, e)| {
                let [a, b] = e.vertices();
                (id, self.vertex_selected(a) && self.vertex_selected(b))
            })
            .collect();
        for (id, select) in edge_flags {
            if let Some(e) = self.edges.get_mut(id) {
                e.select = select;
            }
        }
        self.flush_faces_from(|store, face| store.all_face_verts_selected(face));
    }

    fn flush_from_edges(&mut self) {
        let mut touched = HashSet::new();
        for (_, e) in self.edges().filter(|(_, e)| e.select) {
            touched.extend(e.vertices());
        }
        for (id, v) in &mut self.vertices {
            v.select = touched.contains(&id);
        }
        self.flush_faces_from(|store, face| {
            store
                .edges_of_face(face)
                .is_ok_and(|mut edges| edges.all(|e| store.edge_selected(e)))
        });
    }

    fn flush_from_faces(&mut self) {
        let mut verts = HashSet::new();
        let mut edges = HashSet::new();
        for face in self.selected_faces() {
            if let Ok(it) = self.verts_of_face(face) {
                verts.extend(it);
            }
            if let Ok(it) = self.edges_of_face(face) {
                edges.extend(it);
            }
        }
        for (id, v) in &mut self.vertices {
            v.select = verts.contains(&id);
        }
        for (id, e) in &mut self.edges {
            e.select = edges.contains(&id);
        }
    }

    fn flush_faces_from(&mut self, rule: impl Fn(&Self, FaceId) -> bool) {
        let face_flags: Vec<(FaceId, bool)> =
            self.face_ids().map(|id| (id, rule(self, id))).collect();
        for (id, select) in face_flags {
            if let Some(f) = self.faces.get_mut(id) {
                f.select = select;
            }
        }
    }

    fn all_face_verts_selected(&self, face: FaceId) -> bool {
        self.verts_of_face(face)
            .is_ok_and(|mut verts| verts.all(|v| self.vertex_selected(v)))
    }

    fn any_face_vert_deselected(&self, face: FaceId) -> bool {
        self.verts_of_face(face)
            .is_ok_and(|mut verts| verts.any(|v| !self.vertex_selected(v)))
    }

    /// Propagates vertex flags upward.
    ///
    /// With `select = true`, edges whose two vertices are selected and faces
    /// whose vertices are all selected become selected. With `select = false`,
    /// edges and faces touching a deselected vertex are deselected. Flags are
    /// never changed in the other direction.
    pub fn select_flush(&mut self, select: bool) {
        let edge_updates: Vec<EdgeId> = self
            .edges()
            .filter(|(_, e)| {
                let [a, b] = e.vertices();
                if select {
                    self.vertex_selected(a) && self.vertex_selected(b)
                } else {
                    !self.vertex_selected(a) || !self.vertex_selected(b)
                }
            })
            .map(|(id, _)| id)
            .collect();
        for id in edge_updates {
            if let Some(e) = self.edges.get_mut(id) {
                e.select = select;
            }
        }

        let face_updates: Vec<FaceId> = self
            .face_ids()
            .filter(|&f| {
                if select {
                    self.all_face_verts_selected(f)
                } else {
                    self.any_face_vert_deselected(f)
                }
            })
            .collect();
        for id in face_updates {
            if let Some(f) = self.faces.get_mut(id) {
                f.select = select;
            }
        }
    }
}

/// A set of mesh elements, detached from the store's flags.
///
/// Used for the original and persistent selections of a stroke.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSet {
    pub vertices: HashSet<VertexId>,
    pub edges: HashSet<EdgeId>,
    pub faces: HashSet<FaceId>,
}

impl ElementSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the store's currently selected elements.
    #[must_use]
    pub fn from_selection(store: &MeshStore) -> Self {
        Self {
            vertices: store.selected_vertices().into_iter().collect(),
            edges: store.selected_edges().into_iter().collect(),
            faces: store.selected_faces().into_iter().collect(),
        }
    }

    /// The faces together with their edges and vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing.
    pub fn from_faces(store: &MeshStore, faces: impl IntoIterator<Item = FaceId>) -> Result<Self> {
        let mut set = Self::new();
        for face in faces {
            set.vertices.extend(store.verts_of_face(face)?);
            set.edges.extend(store.edges_of_face(face)?);
            set.faces.insert(face);
        }
        Ok(set)
    }

    /// Returns `true` if no element is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }

    /// Drops every element.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
    }

    /// Adds every element of `other`.
    pub fn extend(&mut self, other: &Self) {
        self.vertices.extend(other.vertices.iter().copied());
        self.edges.extend(other.edges.iter().copied());
        self.faces.extend(other.faces.iter().copied());
    }

    /// Elements of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            vertices: self.vertices.difference(&other.vertices).copied().collect(),
            edges: self.edges.difference(&other.edges).copied().collect(),
            faces: self.faces.difference(&other.faces).copied().collect(),
        }
    }

    /// Returns `true` if every held element still exists in the store.
    #[must_use]
    pub fn is_valid(&self, store: &MeshStore) -> bool {
        self.vertices.iter().all(|&v| store.contains_vertex(v))
            && self.edges.iter().all(|&e| store.contains_edge(e))
            && self.faces.iter().all(|&f| store.contains_face(f))
    }

    /// Sets the flag of every held element that still exists.
    pub fn select_in(&self, store: &mut MeshStore) {
        self.write_flags(store, true);
    }

    /// Replaces the store's selection with exactly this set.
    pub fn restore(&self, store: &mut MeshStore) {
        store.deselect_all();
        self.select_in(store);
    }

    fn write_flags(&self, store: &mut MeshStore, select: bool) {
        for &v in &self.vertices {
            if let Some(data) = store.vertices.get_mut(v) {
                data.select = select;
            }
        }
        for &e in &self.edges {
            if let Some(data) = store.edges.get_mut(e) {
                data.select = select;
            }
        }
        for &f in &self.faces {
            if let Some(data) = store.faces.get_mut(f) {
                data.select = select;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeGrid;

    /// 3x1 strip of quads, faces returned left to right.
    fn strip() -> (MeshStore, Vec<FaceId>) {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(3, 1, 1.0).execute(&mut store).unwrap();
        let faces = grid.faces.clone();
        (store, faces)
    }

    #[test]
    fn face_select_set_selects_boundary() {
        let (mut store, faces) = strip();
        store.face_select_set(faces[0], true).unwrap();
        assert_eq!(store.selected_faces(), vec![faces[0]]);
        assert_eq!(store.selected_edges().len(), 4);
        assert_eq!(store.selected_vertices().len(), 4);
    }

    #[test]
    fn face_deselect_keeps_shared_elements() {
        let (mut store, faces) = strip();
        store.face_select_set(faces[0], true).unwrap();
        store.face_select_set(faces[1], true).unwrap();
        store.face_select_set(faces[1], false).unwrap();
        assert_eq!(store.selected_faces(), vec![faces[0]]);
        assert_eq!(store.selected_edges().len(), 4);
        assert_eq!(store.selected_vertices().len(), 4);
    }

    #[test]
    fn vertex_mode_flush_derives_edges_and_faces() {
        let (mut store, faces) = strip();
        store.set_select_mode(ElementMode::VERTEX);
        for v in store.verts_of_face(faces[1]).unwrap().collect::<Vec<_>>() {
            store.set_vertex_select(v, true).unwrap();
        }
        store.select_flush_mode();
        assert_eq!(store.selected_faces(), vec![faces[1]]);
        assert_eq!(store.selected_edges().len(), 4);
    }

    #[test]
    fn edge_mode_flush_needs_every_edge() {
        let (mut store, faces) = strip();
        store.set_select_mode(ElementMode::EDGE);
        let edges: Vec<EdgeId> = store.edges_of_face(faces[2]).unwrap().collect();
        for &e in &edges[..3] {
            store.set_edge_select(e, true).unwrap();
        }
        store.select_flush_mode();
        assert!(store.selected_faces().is_empty());
        assert_eq!(store.selected_vertices().len(), 4);

        store.set_edge_select(edges[3], true).unwrap();
        store.select_flush_mode();
        assert_eq!(store.selected_faces(), vec![faces[2]]);
    }

    #[test]
    fn face_mode_flush_drops_stray_vertices() {
        let (mut store, faces) = strip();
        store.face_select_set(faces[0], true).unwrap();
        let stray = store.verts_of_face(faces[2]).unwrap().next().unwrap();
        store.set_vertex_select(stray, true).unwrap();
        store.select_flush_mode();
        assert!(!store.vertex(stray).unwrap().select);
        assert_eq!(store.selected_vertices().len(), 4);
    }

    #[test]
    fn deselect_flush_clears_touching_elements() {
        let (mut store, faces) = strip();
        for &f in &faces {
            store.face_select_set(f, true).unwrap();
        }
        let corner = store.verts_of_face(faces[0]).unwrap().next().unwrap();
        store.set_vertex_select(corner, false).unwrap();
        store.select_flush(false);
        assert_eq!(store.selected_faces(), vec![faces[1], faces[2]]);
        assert_eq!(store.selected_edges().len(), 10 - 2);
    }

    #[test]
    fn element_set_restore_round_trip() {
        let (mut store, faces) = strip();
        store.face_select_set(faces[0], true).unwrap();
        let snapshot = ElementSet::from_selection(&store);

        store.deselect_all();
        store.face_select_set(faces[2], true).unwrap();
        snapshot.restore(&mut store);
        assert_eq!(ElementSet::from_selection(&store), snapshot);
    }

    #[test]
    fn difference_removes_shared_boundary() {
        let (store, faces) = strip();
        let all = ElementSet::from_faces(&store, faces.iter().copied()).unwrap();
        let middle = ElementSet::from_faces(&store, [faces[1]]).unwrap();
        let rest = all.difference(&middle);
        assert_eq!(rest.faces.len(), 2);
        assert!(!rest.faces.contains(&faces[1]));
        assert_eq!(rest.vertices.len(), 4);
        assert_eq!(rest.edges.len(), 6);
    }

    #[test]
    fn empty_mode_falls_back_to_faces() {
        let mut store = MeshStore::new();
        store.set_select_mode(ElementMode::empty());
        assert_eq!(store.select_mode(), ElementMode::FACE);
    }
}
