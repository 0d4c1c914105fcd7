//! Brush stroke compositing.
//!
//! A stroke is a sequence of picks. Each pick asks the host for the raw
//! brush selection, optionally snaps and filters it, and folds it into the
//! elements picked so far in the stroke. The result is then combined with the
//! selection the stroke started from according to the stroke's
//! [`SelectMode`].
//!
//! [`Compositor::transition`] drives one event at a time and hands the
//! [`SessionState`] back to the caller.

mod host;
mod pattern;
mod settings;
mod state;

pub use host::{BrushShape, SelectionHost, ViewportHost};
pub use pattern::PatternMask;
pub use settings::{
    PatternSource, SelectSettings, DEFAULT_PATTERN_RESOLUTION, DEFAULT_RADIUS,
    MAX_PATTERN_RESOLUTION, MIN_PATTERN_RESOLUTION, MIN_RADIUS, RADIUS_STEP,
};
pub use state::{
    Event, PickOutcome, SelectMode, SessionState, StepStatus, StrokeState, WheelDirection,
};

use tracing::{debug, warn};

use crate::error::Result;
use crate::math::nearest_2d::nearest_feature;
use crate::math::{Point2, Vector3};
use crate::operations::grow::LoopExtension;
use crate::projection::Viewport;
use crate::snap::{snap_to_vertex_or_edge, SnapState};
use crate::topology::{ElementSet, FaceId, MeshStore, VertexId};

/// Result of feeding one event to the compositor.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SessionState,
    pub status: StepStatus,
    /// Set when the event ran a pick that succeeded.
    pub outcome: Option<PickOutcome>,
}

impl Transition {
    fn new(state: SessionState, status: StepStatus) -> Self {
        Self {
            state,
            status,
            outcome: None,
        }
    }
}

/// Brush selection state machine.
#[derive(Debug, Clone)]
pub struct Compositor {
    settings: SelectSettings,
}

impl Compositor {
    /// Creates a compositor with validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are out of range.
    pub fn new(settings: SelectSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    #[must_use]
    pub fn settings(&self) -> &SelectSettings {
        &self.settings
    }

    /// Applies `event` to `state`.
    ///
    /// Failures inside a pick never escape: the selection is put back the
    /// way it was before the pick, a warning is logged and the stroke keeps
    /// running.
    pub fn transition<H: SelectionHost + ?Sized>(
        &self,
        state: SessionState,
        event: Event,
        store: &mut MeshStore,
        host: &mut H,
    ) -> Transition {
        match state {
            SessionState::Idle => self.begin(event, store, host),
            SessionState::StrokeActive(stroke) => self.step(stroke, event, store, host),
        }
    }

    fn begin<H: SelectionHost + ?Sized>(
        &self,
        event: Event,
        store: &mut MeshStore,
        host: &mut H,
    ) -> Transition {
        let Event::Begin {
            mode,
            point,
            wait_for_input,
        } = event
        else {
            return Transition::new(SessionState::Idle, StepStatus::PassThrough);
        };

        let mut stroke = Box::new(StrokeState::new(
            mode,
            point,
            self.settings.radius,
            wait_for_input,
        ));
        debug!(?mode, wait_for_input, "stroke started");

        let mut outcome = None;
        if !wait_for_input {
            if self.settings.pattern_source.uses_mask() {
                stroke.pattern = host.pattern_mask(self.settings.pattern_resolution);
                if stroke.pattern.is_none() {
                    debug!(source = ?self.settings.pattern_source, "host has no pattern mask");
                }
            }
            outcome = self.pick(&mut stroke, store, host);
        }

        Transition {
            state: SessionState::StrokeActive(stroke),
            status: StepStatus::Running,
            outcome,
        }
    }

    fn step<H: SelectionHost + ?Sized>(
        &self,
        mut stroke: Box<StrokeState>,
        event: Event,
        store: &mut MeshStore,
        host: &mut H,
    ) -> Transition {
        let mut outcome = None;
        match event {
            Event::Begin { .. } => {
                return Transition::new(SessionState::StrokeActive(stroke), StepStatus::PassThrough);
            }
            Event::Move { point } => {
                stroke.center = point;
                if stroke.picks_on_move() {
                    outcome = self.pick(&mut stroke, store, host);
                }
            }
            Event::Wheel { point, direction } => {
                stroke.center = point;
                if stroke.picks_on_move() {
                    outcome = self.pick(&mut stroke, store, host);
                }
                stroke.radius = match direction {
                    WheelDirection::Down => stroke.radius + self.settings.radius_step,
                    WheelDirection::Up => {
                        (stroke.radius - self.settings.radius_step).max(self.settings.min_radius)
                    }
                };
            }
            Event::ExtendToLoop(enabled) => {
                if !stroke.wait_for_input {
                    stroke.extend_to_loop = enabled;
                }
                if stroke.picks_on_move() {
                    outcome = self.pick(&mut stroke, store, host);
                }
            }
            Event::Press { point, subtract } => {
                stroke.center = point;
                stroke.button_held = true;
                if subtract && stroke.wait_for_input {
                    stroke.mode = SelectMode::Sub;
                }
                outcome = self.pick(&mut stroke, store, host);
            }
            Event::Release => {
                if !stroke.wait_for_input {
                    return Self::finish(&stroke, StepStatus::Finished);
                }
                stroke.button_held = false;
                stroke.mode = SelectMode::Add;
                stroke.snap.clear();
            }
            Event::Confirm => return Self::finish(&stroke, StepStatus::Finished),
            Event::Cancel => return Self::finish(&stroke, StepStatus::Cancelled),
        }

        Transition {
            state: SessionState::StrokeActive(stroke),
            status: StepStatus::Running,
            outcome,
        }
    }

    /// Ends the stroke. The stroke's persistent elements go with it.
    fn finish(stroke: &StrokeState, status: StepStatus) -> Transition {
        debug!(
            ?status,
            persistent_faces = stroke.persistent.faces.len(),
            "stroke ended"
        );
        Transition::new(SessionState::Idle, status)
    }

    fn pick<H: SelectionHost + ?Sized>(
        &self,
        stroke: &mut StrokeState,
        store: &mut MeshStore,
        host: &mut H,
    ) -> Option<PickOutcome> {
        let snapshot = ElementSet::from_selection(store);
        let checkpoint = stroke.checkpoint();
        match self.try_pick(stroke, store, host) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "brush pick failed, selection restored");
                snapshot.restore(store);
                stroke.rollback(checkpoint);
                None
            }
        }
    }

    fn try_pick<H: SelectionHost + ?Sized>(
        &self,
        stroke: &mut StrokeState,
        store: &mut MeshStore,
        host: &mut H,
    ) -> Result<PickOutcome> {
        if stroke.mode == SelectMode::Set && !stroke.set_continue {
            host.deselect_all(store);
        }

        if stroke.original.as_ref().is_some_and(|o| !o.is_valid(store)) {
            debug!("original selection lost elements, taking it again");
            stroke.original = None;
        }
        if stroke.original.is_none() {
            stroke.original = Some(ElementSet::from_selection(store));
        }

        let shape = self.brush_shape(stroke);
        host.brush_pick(store, &stroke.center, stroke.radius, shape, SelectMode::Set)?;

        let mut outcome = PickOutcome {
            center: stroke.center,
            snapped: false,
            normal: None,
            view_anchor: None,
        };
        stroke.snap.clear_point();
        if self.settings.snap.enabled || self.settings.align_to_normal {
            self.snap_and_align(stroke, store, host.viewport(), &mut outcome)?;
            if let Some(point) = stroke.snap.snap_point() {
                host.brush_pick(store, &point, stroke.radius, shape, SelectMode::Set)?;
                outcome.center = point;
                outcome.snapped = true;
            }
        }

        if let Some(mask) = &stroke.pattern {
            filter_by_pattern(store, host.viewport(), mask, &outcome.center, stroke.radius)?;
        }

        let axes = store.mirror_axes();
        if !axes.is_empty() {
            host.select_mirror(store, axes)?;
            store.select_flush_mode();
        }

        if self.settings.preselect && !stroke.wait_for_input {
            stroke.persistent.clear();
        }
        stroke.persistent.extend(&ElementSet::from_selection(store));

        let extended = if stroke.extend_to_loop {
            extend_to_loop(stroke, store)?
        } else {
            stroke.persistent.clone()
        };
        let original = stroke.original.clone().unwrap_or_default();
        let result = match stroke.mode {
            SelectMode::Set => extended,
            SelectMode::Add => {
                let mut all = extended;
                all.extend(&original);
                all
            }
            SelectMode::Sub => original.difference(&extended),
        };
        result.restore(store);
        store.select_flush_mode();
        stroke.set_continue = true;

        if stroke.wait_for_input {
            stroke.original = Some(ElementSet::from_selection(store));
            stroke.persistent.clear();
        }
        Ok(outcome)
    }

    fn brush_shape(&self, stroke: &StrokeState) -> BrushShape {
        if stroke.wait_for_input || self.settings.pattern_source == PatternSource::Circle {
            BrushShape::Circle
        } else {
            BrushShape::Box
        }
    }

    fn snap_and_align(
        &self,
        stroke: &mut StrokeState,
        store: &MeshStore,
        viewport: &Viewport,
        outcome: &mut PickOutcome,
    ) -> Result<()> {
        let Some((vertex, vertex_2d)) = anchor_vertex(store, viewport, &stroke.center, &stroke.snap)?
        else {
            return Ok(());
        };

        if self.settings.snap.enabled {
            let snapped = snap_to_vertex_or_edge(
                store,
                viewport,
                &stroke.center,
                vertex,
                &vertex_2d,
                &self.settings.snap,
                &mut stroke.snap,
            )?;
            outcome.normal = snapped.normal;
            outcome.view_anchor = snapped.view_anchor;
        } else {
            outcome.normal = mean_face_normal(store, vertex)?;
            outcome.view_anchor = Some(store.world_point(vertex)?);
        }
        Ok(())
    }
}

/// Selected vertex nearest the pointer on screen. Without one, falls back to
/// the end of the last snapped edge nearer the pointer.
fn anchor_vertex(
    store: &MeshStore,
    viewport: &Viewport,
    pointer: &Point2,
    snap: &SnapState,
) -> Result<Option<(VertexId, Point2)>> {
    let selected = store.selected_vertices();
    let mut ids = Vec::with_capacity(selected.len());
    let mut points = Vec::with_capacity(selected.len());
    for v in selected {
        if let Some(p) = viewport.project(&store.world_point(v)?) {
            ids.push(v);
            points.push(p);
        }
    }
    if let Some(found) = nearest_feature(pointer, &points) {
        return Ok(Some((ids[found.index], found.point)));
    }

    let Some(edge) = snap.snap_edge().filter(|&e| store.contains_edge(e)) else {
        return Ok(None);
    };
    let (a, b) = match snap.snap_edge_co() {
        Some(co) => co,
        None => store.world_edge(edge)?,
    };
    let Some(pointer_3d) = viewport.unproject(pointer, &a) else {
        return Ok(None);
    };
    let [va, vb] = store.verts_of_edge(edge)?;
    let vertex = if (a - pointer_3d).norm() > (b - pointer_3d).norm() {
        vb
    } else {
        va
    };
    Ok(viewport
        .project(&store.world_point(vertex)?)
        .map(|p| (vertex, p)))
}

#[allow(clippy::cast_precision_loss)]
fn mean_face_normal(store: &MeshStore, vertex: VertexId) -> Result<Option<Vector3>> {
    let faces = store.faces_of_vertex(vertex)?;
    if faces.is_empty() {
        return Ok(None);
    }
    let mut sum = Vector3::zeros();
    for &face in &faces {
        sum += store.world_face_normal(face)?;
    }
    Ok(Some(sum / faces.len() as f64))
}

/// Drops selected vertices on masked-out cells, then everything touching
/// them.
fn filter_by_pattern(
    store: &mut MeshStore,
    viewport: &Viewport,
    mask: &PatternMask,
    center: &Point2,
    radius: f64,
) -> Result<()> {
    let mut dropped = 0usize;
    for v in store.selected_vertices() {
        let keep = viewport
            .project(&store.world_point(v)?)
            .is_some_and(|p| mask.allows(&p, center, radius));
        if !keep {
            store.set_vertex_select(v, false)?;
            dropped += 1;
        }
    }
    store.select_flush(false);
    store.select_flush_mode();
    debug!(dropped, "pattern filter applied");
    Ok(())
}

/// Persistent elements plus the faces their boundary loops enclose.
fn extend_to_loop(stroke: &mut StrokeState, store: &MeshStore) -> Result<ElementSet> {
    let mut extended = stroke.persistent.clone();
    let faces: Vec<FaceId> = store
        .face_ids()
        .filter(|f| stroke.persistent.faces.contains(f))
        .collect();
    if faces.is_empty() {
        return Ok(extended);
    }

    let extension = stroke
        .extension
        .get_or_insert_with(|| LoopExtension::probe(store));
    let grown = extension.extend(store, &faces, false)?;
    extended.extend(&ElementSet::from_faces(store, grown)?);
    Ok(extended)
}
