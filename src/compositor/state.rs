use crate::math::{Point2, Point3, Vector3};
use crate::operations::grow::LoopExtension;
use crate::snap::SnapState;
use crate::topology::ElementSet;

use super::pattern::PatternMask;

/// How a stroke combines with the selection it started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// Replace the selection with what the stroke covers.
    #[default]
    Set,
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    /// Shrinks the brush.
    Up,
    /// Grows the brush.
    Down,
}

/// Input delivered to [`super::Compositor::transition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Starts a stroke. Without `wait_for_input` the first pick runs at once.
    Begin {
        mode: SelectMode,
        point: Point2,
        wait_for_input: bool,
    },
    Move { point: Point2 },
    Wheel {
        point: Point2,
        direction: WheelDirection,
    },
    /// Loop-extension modifier pressed or released.
    ExtendToLoop(bool),
    /// Button down; `subtract` switches a waiting stroke to [`SelectMode::Sub`].
    Press { point: Point2, subtract: bool },
    Release,
    Confirm,
    Cancel,
}

/// What the host should do with the event after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Running,
    Finished,
    Cancelled,
    /// The event was not consumed.
    PassThrough,
}

/// Brush position and alignment data from one pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickOutcome {
    /// Where the brush was applied, after snapping.
    pub center: Point2,
    pub snapped: bool,
    /// World-space normal for aligning the view, when requested.
    pub normal: Option<Vector3>,
    pub view_anchor: Option<Point3>,
}

/// Compositor state between events.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    StrokeActive(Box<StrokeState>),
}

impl SessionState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The running stroke, if any.
    #[must_use]
    pub fn stroke(&self) -> Option<&StrokeState> {
        match self {
            Self::Idle => None,
            Self::StrokeActive(stroke) => Some(stroke),
        }
    }
}

/// Stroke fields a pick may change.
#[derive(Debug)]
pub(super) struct Checkpoint {
    set_continue: bool,
    original: Option<ElementSet>,
    persistent: ElementSet,
    snap: SnapState,
    had_extension: bool,
}

/// Everything a stroke carries from one pick to the next.
#[derive(Debug, Clone)]
pub struct StrokeState {
    pub(super) mode: SelectMode,
    pub(super) center: Point2,
    pub(super) radius: f64,
    pub(super) wait_for_input: bool,
    pub(super) button_held: bool,
    pub(super) extend_to_loop: bool,
    pub(super) set_continue: bool,
    pub(super) original: Option<ElementSet>,
    pub(super) persistent: ElementSet,
    pub(super) snap: SnapState,
    pub(super) pattern: Option<PatternMask>,
    pub(super) extension: Option<LoopExtension>,
}

impl StrokeState {
    pub(super) fn new(mode: SelectMode, center: Point2, radius: f64, wait_for_input: bool) -> Self {
        Self {
            mode,
            center,
            radius,
            wait_for_input,
            button_held: false,
            extend_to_loop: false,
            set_continue: false,
            original: None,
            persistent: ElementSet::new(),
            snap: SnapState::default(),
            pattern: None,
            extension: None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    /// Pointer position of the last event.
    #[must_use]
    pub fn center(&self) -> Point2 {
        self.center
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn wait_for_input(&self) -> bool {
        self.wait_for_input
    }

    #[must_use]
    pub fn button_held(&self) -> bool {
        self.button_held
    }

    #[must_use]
    pub fn extend_to_loop(&self) -> bool {
        self.extend_to_loop
    }

    /// Selection the stroke composites against.
    #[must_use]
    pub fn original(&self) -> Option<&ElementSet> {
        self.original.as_ref()
    }

    /// Elements picked so far in this stroke.
    #[must_use]
    pub fn persistent(&self) -> &ElementSet {
        &self.persistent
    }

    #[must_use]
    pub fn snap(&self) -> &SnapState {
        &self.snap
    }

    /// Captures what a pick may change, leaving the pattern mask and the
    /// loop extension's adjacency snapshot alone.
    pub(super) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            set_continue: self.set_continue,
            original: self.original.clone(),
            persistent: self.persistent.clone(),
            snap: self.snap.clone(),
            had_extension: self.extension.is_some(),
        }
    }

    /// Puts back a [`Checkpoint`]. An extension created since the checkpoint is
    /// dropped; one that already existed is kept.
    pub(super) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.set_continue = checkpoint.set_continue;
        self.original = checkpoint.original;
        self.persistent = checkpoint.persistent;
        self.snap = checkpoint.snap;
        if !checkpoint.had_extension {
            self.extension = None;
        }
    }

    /// Picks happen on movement only while not waiting, or while the button
    /// is down.
    pub(super) fn picks_on_move(&self) -> bool {
        !self.wait_for_input || self.button_held
    }
}
