//! Drag interaction state machine.
//!
//! The renderer feeds raw pointer events in and gets pan effects out.
//! A drag locks to one axis once the pointer travels far enough from the
//! press point; a horizontal release is what ultimately re-anchors the
//! timeline (via [`TimelineEvent::Drag`]).
//!
//! [`TimelineEvent::Drag`]: timelane_protocol::TimelineEvent::Drag

/// Pixels of travel before the drag axis locks.
pub const AXIS_LOCK_PX: f64 = 10.0;

/// Current interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No button held.
    #[default]
    Idle,
    /// Button down, axis not yet determined.
    AxisUndetermined { origin: (f64, f64) },
    /// Locked to horizontal panning.
    DraggingHorizontal { origin: (f64, f64) },
    /// Locked to vertical scrolling.
    DraggingVertical { origin: (f64, f64) },
}

/// What the renderer should do in response to a pointer motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEffect {
    None,
    /// Shift the timeline strip by `dx` from the press point.
    PanHorizontal { dx: f64 },
    /// Shift the content scroll by `dy` from the press point.
    PanVertical { dy: f64 },
}

/// Tracks one pointer through press → motion → release.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragTracker {
    state: DragState,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Button pressed at (x, y).
    pub fn press(&mut self, x: f64, y: f64) {
        self.state = DragState::AxisUndetermined { origin: (x, y) };
    }

    /// Pointer moved to (x, y). Locks the axis on first sufficient
    /// travel; horizontal wins when both thresholds are crossed in one
    /// motion, matching the original widget.
    pub fn motion(&mut self, x: f64, y: f64) -> DragEffect {
        match self.state {
            DragState::Idle => DragEffect::None,
            DragState::AxisUndetermined { origin } => {
                if (x - origin.0).abs() > AXIS_LOCK_PX {
                    self.state = DragState::DraggingHorizontal { origin };
                    DragEffect::PanHorizontal { dx: x - origin.0 }
                } else if (y - origin.1).abs() > AXIS_LOCK_PX {
                    self.state = DragState::DraggingVertical { origin };
                    DragEffect::PanVertical { dy: y - origin.1 }
                } else {
                    DragEffect::None
                }
            }
            DragState::DraggingHorizontal { origin } => {
                DragEffect::PanHorizontal { dx: x - origin.0 }
            }
            DragState::DraggingVertical { origin } => DragEffect::PanVertical { dy: y - origin.1 },
        }
    }

    /// Button released at (x, y). Returns the total pan of the locked
    /// axis, or `None` if no axis ever locked (a click, not a drag).
    pub fn release(&mut self, x: f64, y: f64) -> Option<DragEffect> {
        let outcome = match self.state {
            DragState::Idle | DragState::AxisUndetermined { .. } => None,
            DragState::DraggingHorizontal { origin } => {
                Some(DragEffect::PanHorizontal { dx: x - origin.0 })
            }
            DragState::DraggingVertical { origin } => {
                Some(DragEffect::PanVertical { dy: y - origin.1 })
            }
        };
        self.state = DragState::Idle;
        outcome
    }
}
