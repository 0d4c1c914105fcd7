use tracing::debug;

use crate::error::Result;
use crate::math::Point2;
use crate::operations::transform::MirrorSelect;
use crate::projection::Viewport;
use crate::topology::{EdgeId, ElementMode, FaceId, MeshStore, MirrorAxes, VertexId};

use super::pattern::PatternMask;
use super::state::SelectMode;

/// Footprint of the raw brush pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushShape {
    Circle,
    /// Axis-aligned square of side `2 * radius`.
    Box,
}

impl BrushShape {
    /// Returns `true` if `point` lies inside the brush.
    #[must_use]
    pub fn contains(self, center: &Point2, radius: f64, point: &Point2) -> bool {
        match self {
            Self::Circle => (point - center).norm_squared() <= radius * radius,
            Self::Box => (point.x - center.x).abs() <= radius && (point.y - center.y).abs() <= radius,
        }
    }
}

/// Services the compositor needs from the editor hosting it.
pub trait SelectionHost {
    /// Camera used to project the mesh.
    fn viewport(&self) -> &Viewport;

    /// Selects the elements under the brush, in the store's element mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the pick cannot be carried out.
    fn brush_pick(
        &mut self,
        store: &mut MeshStore,
        center: &Point2,
        radius: f64,
        shape: BrushShape,
        mode: SelectMode,
    ) -> Result<()>;

    fn deselect_all(&mut self, store: &mut MeshStore) {
        store.deselect_all();
    }

    /// Adds the mirror image of the selection across `axes`.
    ///
    /// # Errors
    ///
    /// Returns an error if mirroring fails.
    fn select_mirror(&mut self, store: &mut MeshStore, axes: MirrorAxes) -> Result<()> {
        MirrorSelect::new(axes).execute(store).map(|_| ())
    }

    /// Mask for object or image pattern sources, at `resolution` per side.
    fn pattern_mask(&self, _resolution: usize) -> Option<PatternMask> {
        None
    }
}

/// Host that picks by projecting the mesh through a [`Viewport`].
///
/// Vertices count as inside when their projection is, edges when both end
/// points are, faces when their centre is.
#[derive(Debug, Clone)]
pub struct ViewportHost {
    viewport: Viewport,
    mask: Option<PatternMask>,
}

impl ViewportHost {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            mask: None,
        }
    }

    /// Serves `mask` to strokes using an object or image pattern source.
    #[must_use]
    pub fn with_pattern_mask(mut self, mask: PatternMask) -> Self {
        self.mask = Some(mask);
        self
    }

    fn hits(
        &self,
        store: &MeshStore,
        center: &Point2,
        radius: f64,
        shape: BrushShape,
    ) -> Result<(Vec<VertexId>, Vec<EdgeId>, Vec<FaceId>)> {
        let inside = |p: Option<Point2>| p.is_some_and(|p| shape.contains(center, radius, &p));
        let mode = store.select_mode();

        let mut vertices = Vec::new();
        if mode.contains(ElementMode::VERTEX) {
            for (id, v) in store.vertices() {
                if inside(self.viewport.project(&store.to_world(&v.point))) {
                    vertices.push(id);
                }
            }
        }

        let mut edges = Vec::new();
        if mode.contains(ElementMode::EDGE) {
            for id in store.edge_ids() {
                let (a, b) = store.world_edge(id)?;
                if inside(self.viewport.project(&a)) && inside(self.viewport.project(&b)) {
                    edges.push(id);
                }
            }
        }

        let mut faces = Vec::new();
        if mode.contains(ElementMode::FACE) {
            for id in store.face_ids() {
                let centre = store.to_world(&store.face_center(id)?);
                if inside(self.viewport.project(&centre)) {
                    faces.push(id);
                }
            }
        }
        Ok((vertices, edges, faces))
    }
}

impl SelectionHost for ViewportHost {
    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn brush_pick(
        &mut self,
        store: &mut MeshStore,
        center: &Point2,
        radius: f64,
        shape: BrushShape,
        mode: SelectMode,
    ) -> Result<()> {
        let (vertices, edges, faces) = self.hits(store, center, radius, shape)?;
        debug!(
            vertices = vertices.len(),
            edges = edges.len(),
            faces = faces.len(),
            ?mode,
            "brush pick"
        );

        if mode == SelectMode::Set {
            store.deselect_all();
        }
        let select = mode != SelectMode::Sub;
        for v in vertices {
            store.set_vertex_select(v, select)?;
        }
        for e in edges {
            store.set_edge_select(e, select)?;
        }
        for f in faces {
            store.set_face_select(f, select)?;
        }
        store.select_flush_mode();
        Ok(())
    }

    fn pattern_mask(&self, resolution: usize) -> Option<PatternMask> {
        self.mask
            .as_ref()
            .filter(|mask| mask.resolution() == resolution)
            .cloned()
    }
}
