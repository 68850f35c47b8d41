//! Timelane Protocol
//!
//! Shared types for engine-renderer communication over line-delimited JSON.
//!
//! The rendering collaborator (a browser shim, a TUI, the headless CLI)
//! sends one [`TimelineEvent`] per line and receives one [`EngineOutput`]
//! per line. The engine never pushes unsolicited frames.

use serde::{Deserialize, Serialize};
use timelane_core_layout::{
    DateValue, ModePreset, Placement, ProjectRecord, TimeWindow, ViewPreset,
};

/// Events a renderer sends to the engine. Each one triggers a full
/// layout pass over the updated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEvent {
    /// Replace the project set. Dates may be unix seconds or calendar
    /// strings; parse failures produce an [`EngineOutput::Error`].
    SetProjects { projects: Vec<ProjectRecord> },

    /// Jump the anchor to a date.
    NavigateTo { date: DateValue },

    /// Switch the view preset. Unknown names are rejected when the event
    /// itself is deserialized.
    ChangeView { view: ViewPreset },

    /// Toggle between the regular and collapsed modes.
    ToggleCollapse,

    /// A completed drag, in pixels. Horizontal deltas re-anchor the
    /// timeline by whole days; vertical deltas move the content scroll.
    Drag { dx: f64, dy: f64 },

    /// The container was resized.
    Resize { width: f64, height: f64 },

    /// Re-emit a frame for the current state.
    Query,
}

/// One rendered layout pass, everything the collaborator needs to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutFrame {
    /// Placements for the active projects, in start order.
    pub placements: Vec<Placement>,
    /// Highest row used; sizes the scrollable content area.
    pub max_row: u32,
    /// Scrollable content height in pixels, floored to the viewport.
    pub content_height: f64,
    /// Current vertical scroll offset (non-positive margin-top).
    pub scroll_top: f64,
    /// The window the placements were computed against.
    pub window: TimeWindow,
    /// Full strip width: three container widths.
    pub timeline_width_px: f64,
    /// Left margin placing the anchor one container-width in.
    pub timeline_offset_px: f64,
    /// Playhead band position and width.
    pub playhead_left_px: f64,
    pub playhead_width_px: f64,
    /// Grid cell dimensions of the active view.
    pub cell_width_px: f64,
    pub cell_height_px: f64,
    pub grid_color: String,
    /// Active mode preset; collapsed bars carry no icon/name/ticks.
    pub mode: ModePreset,
    pub show_content: bool,
}

/// Responses from the engine to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EngineOutput {
    /// A complete layout frame.
    Frame(LayoutFrame),
    /// The event could not be applied; prior state is unchanged.
    Error {
        /// Error message describing what went wrong.
        message: String,
    },
}

impl EngineOutput {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
