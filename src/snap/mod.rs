//! Screen-space snapping of the brush centre to mesh features.
//!
//! Candidates are gathered around one anchor vertex: the vertex itself and
//! the nearest of its edges (closest point, midpoint, nearer endpoint). The
//! candidate closest to the pointer wins. With edge slide, the search is
//! confined to the edge loop through the last snapped edge, so dragging
//! slides the brush along that loop.

use bitflags::bitflags;
use tracing::debug;

use crate::error::Result;
use crate::math::distance_2d::{closest_point_on_segment, nearer_endpoint, segment_midpoint};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};
use crate::operations::loops::EdgeLoop;
use crate::projection::Viewport;
use crate::topology::{EdgeId, MeshStore, VertexId};

bitflags! {
    /// Features the brush centre may snap to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SnapElements: u32 {
        const VERTEX = 0b0001;
        /// Closest point on the nearest edge.
        const EDGE = 0b0010;
        const EDGE_MIDPOINT = 0b0100;
        /// Endpoint of the nearest edge closest to the pointer.
        const EDGE_PERPENDICULAR = 0b1000;
        const ANY_EDGE = Self::EDGE.bits() | Self::EDGE_MIDPOINT.bits() | Self::EDGE_PERPENDICULAR.bits();
    }
}

/// Snapping options.
#[derive(Debug, Clone, Copy)]
pub struct SnapSettings {
    pub enabled: bool,
    pub elements: SnapElements,
    /// Restrict edge candidates to the loop of the last snapped edge.
    pub edge_slide: bool,
    /// Drop loop edges facing away from the camera.
    pub backface_culling: bool,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            elements: SnapElements::VERTEX,
            edge_slide: false,
            backface_culling: false,
        }
    }
}

/// Snap state carried across the picks of one stroke.
#[derive(Debug, Clone, Default)]
pub struct SnapState {
    snap_point: Option<Point2>,
    snap_edge: Option<EdgeId>,
    snap_edge_co: Option<(Point3, Point3)>,
    slide_loop: Option<SlideLoop>,
}

#[derive(Debug, Clone)]
struct SlideLoop {
    edges: Vec<EdgeId>,
    edges_2d: Vec<(Point2, Point2)>,
}

impl SnapState {
    /// Last snapped pixel position.
    #[must_use]
    pub fn snap_point(&self) -> Option<Point2> {
        self.snap_point
    }

    /// Edge chosen by the last edge-slide snap.
    #[must_use]
    pub fn snap_edge(&self) -> Option<EdgeId> {
        self.snap_edge
    }

    /// World-space end points of [`SnapState::snap_edge`].
    #[must_use]
    pub fn snap_edge_co(&self) -> Option<(Point3, Point3)> {
        self.snap_edge_co
    }

    /// Edges of the cached slide loop, if computed.
    #[must_use]
    pub fn slide_loop(&self) -> Option<&[EdgeId]> {
        self.slide_loop.as_ref().map(|l| l.edges.as_slice())
    }

    /// Forgets the snapped point only.
    pub fn clear_point(&mut self) {
        self.snap_point = None;
    }

    /// Forgets everything, including the cached loop.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Result of one snap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOutcome {
    /// Winning candidate, or `None` when no element produced one.
    pub point: Option<Point2>,
    /// World-space normal of the snapped feature.
    pub normal: Option<Vector3>,
    /// World-space location of the snapped feature.
    pub view_anchor: Option<Point3>,
}

/// Snaps `pick` to the features around `vertex`.
///
/// `vertex_2d` is the vertex's projected position. Nearest-edge ties go to
/// the edge enumerated first.
///
/// # Errors
///
/// Returns an error if the vertex or one of its edges is missing.
pub fn snap_to_vertex_or_edge(
    store: &MeshStore,
    viewport: &Viewport,
    pick: &Point2,
    vertex: VertexId,
    vertex_2d: &Point2,
    settings: &SnapSettings,
    state: &mut SnapState,
) -> Result<SnapOutcome> {
    let mut points = Vec::with_capacity(4);
    let mut outcome = SnapOutcome {
        point: None,
        normal: None,
        view_anchor: None,
    };

    if settings.elements.contains(SnapElements::VERTEX) {
        points.push(*vertex_2d);
        outcome.normal = Some(store.world_vertex_normal(vertex)?);
        outcome.view_anchor = Some(store.world_point(vertex)?);
    }

    if settings.elements.intersects(SnapElements::ANY_EDGE) {
        let (edges, edges_2d) = candidate_edges(store, viewport, vertex, settings, state)?;

        if let Some((index, closest)) = nearest_edge(pick, &edges_2d) {
            let edge = edges[index];
            let (a, b) = store.world_edge(edge)?;
            if settings.edge_slide {
                state.snap_edge = Some(edge);
                state.snap_edge_co = Some((a, b));
            }

            let [va, vb] = store.verts_of_edge(edge)?;
            let n = store.world_vertex_normal(va)? + store.world_vertex_normal(vb)?;
            outcome.normal = Some(n.try_normalize(TOLERANCE).unwrap_or(n));
            outcome.view_anchor = Some(nalgebra::center(&a, &b));

            let (a2, b2) = edges_2d[index];
            if settings.elements.contains(SnapElements::EDGE) {
                points.push(closest);
            }
            if settings.elements.contains(SnapElements::EDGE_MIDPOINT) {
                points.push(segment_midpoint(&a2, &b2));
            }
            if settings.elements.contains(SnapElements::EDGE_PERPENDICULAR) {
                points.push(nearer_endpoint(pick, &a2, &b2));
            }
        }
    }

    if let Some(best) = nearest_point(pick, &points) {
        state.snap_point = Some(best);
        outcome.point = Some(best);
    }
    Ok(outcome)
}

/// Edges to search, paired with their projections.
fn candidate_edges(
    store: &MeshStore,
    viewport: &Viewport,
    vertex: VertexId,
    settings: &SnapSettings,
    state: &mut SnapState,
) -> Result<(Vec<EdgeId>, Vec<(Point2, Point2)>)> {
    let incident = store.edges_of_vertex(vertex)?;

    if settings.edge_slide {
        if let Some(seed) = state.snap_edge {
            if state.slide_loop.is_none() {
                state.slide_loop = Some(build_slide_loop(store, viewport, seed, settings.backface_culling)?);
            }
            if let Some(slide) = &state.slide_loop {
                let in_loop: Vec<EdgeId> = incident
                    .iter()
                    .copied()
                    .filter(|e| slide.edges.contains(e))
                    .collect();
                // In-loop edges that all project behind the camera count as
                // no in-loop edge at all.
                let projected = project_edges(store, viewport, &in_loop)?;
                if projected.0.is_empty() {
                    return Ok((slide.edges.clone(), slide.edges_2d.clone()));
                }
                return Ok(projected);
            }
        }
    }

    project_edges(store, viewport, incident)
}

/// Projects edges, skipping any with an endpoint behind the camera.
fn project_edges(
    store: &MeshStore,
    viewport: &Viewport,
    edges: &[EdgeId],
) -> Result<(Vec<EdgeId>, Vec<(Point2, Point2)>)> {
    let mut kept = Vec::with_capacity(edges.len());
    let mut projected = Vec::with_capacity(edges.len());
    for &edge in edges {
        let (a, b) = store.world_edge(edge)?;
        if let (Some(a2), Some(b2)) = (viewport.project(&a), viewport.project(&b)) {
            kept.push(edge);
            projected.push((a2, b2));
        }
    }
    Ok((kept, projected))
}

fn build_slide_loop(
    store: &MeshStore,
    viewport: &Viewport,
    seed: EdgeId,
    backface_culling: bool,
) -> Result<SlideLoop> {
    let mut edges = EdgeLoop::new(&[seed]).execute(store)?;
    if backface_culling {
        let mut facing = Vec::with_capacity(edges.len());
        for edge in edges {
            let [first, _] = store.verts_of_edge(edge)?;
            let normal = store.world_vertex_normal(first)?;
            if viewport.faces_camera(&store.world_point(first)?, &normal) {
                facing.push(edge);
            }
        }
        edges = facing;
    }

    let (edges, edges_2d) = project_edges(store, viewport, &edges)?;
    debug!(edges = edges.len(), backface_culling, "cached edge slide loop");
    Ok(SlideLoop { edges, edges_2d })
}

/// Index of the segment nearest to `pick` and the closest point on it.
fn nearest_edge(pick: &Point2, edges_2d: &[(Point2, Point2)]) -> Option<(usize, Point2)> {
    let mut best: Option<(usize, Point2, f64)> = None;
    for (i, (a, b)) in edges_2d.iter().enumerate() {
        let (closest, _) = closest_point_on_segment(pick, a, b);
        let dist = (closest - pick).norm();
        if best.is_none_or(|(_, _, d)| dist < d) {
            best = Some((i, closest, dist));
        }
    }
    best.map(|(i, p, _)| (i, p))
}

fn nearest_point(pick: &Point2, points: &[Point2]) -> Option<Point2> {
    let mut best: Option<(Point2, f64)> = None;
    for p in points {
        let dist = (p - pick).norm();
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((*p, dist));
        }
    }
    best.map(|(p, _)| p)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{Grid, MakeCylinder, MakeGrid};
    use approx::assert_relative_eq;

    fn top_view() -> Viewport {
        Viewport::orthographic(
            Point3::new(0.0, 0.0, 10.0),
            Point3::origin(),
            Vector3::y(),
            5.0,
            100.0,
            100.0,
        )
        .unwrap()
    }

    /// 4x4 unit grid centred on the origin; vertex (i, j) sits at pixel
    /// (30 + 10i, 30 + 10j).
    fn scene() -> (MeshStore, Grid, Viewport) {
        let mut store = MeshStore::new();
        let grid = MakeGrid::new(4, 4, 1.0).execute(&mut store).unwrap();
        (store, grid, top_view())
    }

    fn settings(elements: SnapElements) -> SnapSettings {
        SnapSettings {
            enabled: true,
            elements,
            ..SnapSettings::default()
        }
    }

    fn px(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn vertex_only() {
        let (store, grid, vp) = scene();
        let v = grid.vertex_at(2, 2).unwrap();
        let mut state = SnapState::default();
        let out = snap_to_vertex_or_edge(
            &store,
            &vp,
            &px(53.0, 51.0),
            v,
            &px(50.0, 50.0),
            &settings(SnapElements::VERTEX),
            &mut state,
        )
        .unwrap();
        assert_eq!(out.point, Some(px(50.0, 50.0)));
        assert_relative_eq!(out.normal.unwrap(), Vector3::z(), epsilon = 1e-9);
        assert_relative_eq!(out.view_anchor.unwrap(), Point3::origin(), epsilon = 1e-9);
        assert_eq!(state.snap_point(), out.point);
    }

    #[test]
    fn closest_candidate_wins() {
        let (store, grid, vp) = scene();
        let v = grid.vertex_at(2, 2).unwrap();
        let mut state = SnapState::default();
        let all = SnapElements::VERTEX | SnapElements::ANY_EDGE;
        let out = snap_to_vertex_or_edge(
            &store,
            &vp,
            &px(53.0, 51.0),
            v,
            &px(50.0, 50.0),
            &settings(all),
            &mut state,
        )
        .unwrap();
        let p = out.point.unwrap();
        assert_relative_eq!(p, px(53.0, 50.0), epsilon = 1e-9);
        assert_relative_eq!(out.view_anchor.unwrap(), Point3::new(0.5, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn midpoint_and_perpendicular() {
        let (store, grid, vp) = scene();
        let v = grid.vertex_at(2, 2).unwrap();
        let mut state = SnapState::default();

        let mid = snap_to_vertex_or_edge(
            &store,
            &vp,
            &px(53.0, 51.0),
            v,
            &px(50.0, 50.0),
            &settings(SnapElements::EDGE_MIDPOINT),
            &mut state,
        )
        .unwrap();
        assert_relative_eq!(mid.point.unwrap(), px(55.0, 50.0), epsilon = 1e-9);

        let perp = snap_to_vertex_or_edge(
            &store,
            &vp,
            &px(58.0, 51.0),
            v,
            &px(50.0, 50.0),
            &settings(SnapElements::EDGE_PERPENDICULAR),
            &mut state,
        )
        .unwrap();
        assert_relative_eq!(perp.point.unwrap(), px(60.0, 50.0), epsilon = 1e-9);
    }

    #[test]
    fn nearest_edge_tie_goes_to_first_enumerated() {
        let horizontal = (px(0.0, 0.0), px(10.0, 0.0));
        let vertical = (px(0.0, 0.0), px(0.0, 10.0));
        let pick = px(3.0, 3.0);

        let (index, closest) = nearest_edge(&pick, &[horizontal, vertical]).unwrap();
        assert_eq!(index, 0);
        assert_relative_eq!(closest, px(3.0, 0.0), epsilon = 1e-12);

        let (index, closest) = nearest_edge(&pick, &[vertical, horizontal]).unwrap();
        assert_eq!(index, 0);
        assert_relative_eq!(closest, px(0.0, 3.0), epsilon = 1e-12);

        assert!(nearest_edge(&pick, &[]).is_none());
    }

    #[test]
    fn edge_slide_follows_cached_loop() {
        let (store, grid, vp) = scene();
        let centre = grid.vertex_at(2, 2).unwrap();
        let s = SnapSettings {
            edge_slide: true,
            ..settings(SnapElements::EDGE)
        };
        let mut state = SnapState::default();

        // First pick locks onto the horizontal edge right of the centre.
        snap_to_vertex_or_edge(&store, &vp, &px(55.0, 51.0), centre, &px(50.0, 50.0), &s, &mut state)
            .unwrap();
        let locked = state.snap_edge().unwrap();
        assert_eq!(locked, store.edge_between(centre, grid.vertex_at(3, 2).unwrap()).unwrap());

        // Next vertex along the line: the vertical edge is closer, but the
        // loop keeps the brush on the horizontal line.
        let next = grid.vertex_at(3, 2).unwrap();
        let out = snap_to_vertex_or_edge(&store, &vp, &px(62.0, 58.0), next, &px(60.0, 50.0), &s, &mut state)
            .unwrap();
        assert_relative_eq!(out.point.unwrap(), px(62.0, 50.0), epsilon = 1e-9);
        assert_eq!(state.slide_loop().unwrap().len(), 4);
        assert!(state.snap_edge_co().is_some());
    }

    #[test]
    fn edge_slide_falls_back_to_whole_loop() {
        let (store, grid, vp) = scene();
        let centre = grid.vertex_at(2, 2).unwrap();
        let s = SnapSettings {
            edge_slide: true,
            ..settings(SnapElements::EDGE)
        };
        let mut state = SnapState::default();
        snap_to_vertex_or_edge(&store, &vp, &px(55.0, 51.0), centre, &px(50.0, 50.0), &s, &mut state)
            .unwrap();

        // A vertex off the loop: the nearest loop edge is used instead.
        let off = grid.vertex_at(1, 3).unwrap();
        let out = snap_to_vertex_or_edge(&store, &vp, &px(44.0, 57.0), off, &px(40.0, 60.0), &s, &mut state)
            .unwrap();
        assert_relative_eq!(out.point.unwrap(), px(44.0, 50.0), epsilon = 1e-9);
    }

    #[test]
    fn clear_forgets_loop() {
        let mut state = SnapState {
            snap_point: Some(px(1.0, 1.0)),
            ..SnapState::default()
        };
        state.clear_point();
        assert!(state.snap_point().is_none());
        state.clear();
        assert!(state.slide_loop().is_none() && state.snap_edge().is_none());
    }

    /// Orthographic view of a tube from the side, slightly off the -Y axis.
    fn side_view() -> Viewport {
        Viewport::orthographic(
            Point3::new(3.0, -10.0, 0.5),
            Point3::new(0.0, 0.0, 0.5),
            Vector3::z(),
            3.0,
            100.0,
            100.0,
        )
        .unwrap()
    }

    #[test]
    fn backface_culling_trims_slide_loop() {
        let mut store = MeshStore::new();
        let tube = MakeCylinder::new(8, 1, 1.0, 1.0).execute(&mut store).unwrap();
        let vp = side_view();
        let seed = store.edge_between(tube.vertices[6], tube.vertices[7]).unwrap();

        let whole = build_slide_loop(&store, &vp, seed, false).unwrap();
        assert_eq!(whole.edges.len(), 8);

        // Ring vertices 0, 5, 6 and 7 face the camera; each keeps the ring
        // edge it starts.
        let facing = build_slide_loop(&store, &vp, seed, true).unwrap();
        assert_eq!(facing.edges.len(), 4);
        assert!(facing.edges.contains(&seed));
        assert_eq!(facing.edges_2d.len(), 4);
    }

    #[test]
    fn edge_slide_with_culling_caches_front_of_ring() {
        let mut store = MeshStore::new();
        let tube = MakeCylinder::new(8, 1, 1.0, 1.0).execute(&mut store).unwrap();
        let vp = side_view();
        let s = SnapSettings {
            edge_slide: true,
            backface_culling: true,
            ..settings(SnapElements::EDGE)
        };
        let vertex = tube.vertices[6];
        let vertex_2d = vp.project(&store.world_point(vertex).unwrap()).unwrap();
        let (a, b) = store
            .world_edge(store.edge_between(tube.vertices[6], tube.vertices[7]).unwrap())
            .unwrap();
        let pick = vp.project(&nalgebra::center(&a, &b)).unwrap() + nalgebra::Vector2::new(0.0, 0.5);

        let mut state = SnapState::default();
        snap_to_vertex_or_edge(&store, &vp, &pick, vertex, &vertex_2d, &s, &mut state).unwrap();
        assert!(state.slide_loop().is_none());
        let out = snap_to_vertex_or_edge(&store, &vp, &pick, vertex, &vertex_2d, &s, &mut state)
            .unwrap();
        assert!(out.point.is_some());
        assert_eq!(state.slide_loop().unwrap().len(), 4);
    }

    #[test]
    fn edge_slide_falls_back_when_in_loop_edges_are_behind_camera() {
        let (store, grid, top) = scene();
        let s = SnapSettings {
            edge_slide: true,
            ..settings(SnapElements::EDGE)
        };
        let seed = store
            .edge_between(grid.vertex_at(1, 2).unwrap(), grid.vertex_at(2, 2).unwrap())
            .unwrap();
        let mut state = SnapState {
            snap_edge: Some(seed),
            ..SnapState::default()
        };

        // The loop along y = 0 is cached while seen from above.
        let centre = grid.vertex_at(2, 2).unwrap();
        snap_to_vertex_or_edge(&store, &top, &px(55.0, 51.0), centre, &px(50.0, 50.0), &s, &mut state)
            .unwrap();
        assert_eq!(state.slide_loop().unwrap().len(), 4);

        // Then the view moves to x = 1.5 looking down -X, putting vertex
        // (4, 2) and its only loop edge behind the eye.
        let moved = Viewport::perspective(
            Point3::new(1.5, 0.0, 0.2),
            Point3::new(-5.0, 0.0, 0.2),
            Vector3::z(),
            1.0,
            100.0,
            100.0,
        )
        .unwrap();
        let behind = grid.vertex_at(4, 2).unwrap();
        assert!(moved.project(&store.world_point(behind).unwrap()).is_none());

        let out = snap_to_vertex_or_edge(&store, &moved, &px(45.0, 52.0), behind, &px(45.0, 52.0), &s, &mut state)
            .unwrap();
        assert_relative_eq!(out.point.unwrap(), px(45.0, 50.0), epsilon = 1e-9);
    }
}
