//! Timelane Core Layout Engine
//!
//! Platform-agnostic row-packing layout engine for horizontal timeline
//! (Gantt) widgets.
//!
//! This crate implements the "infinite horizontal strip of days" paradigm:
//! - Projects are bars on an infinite horizontal day grid
//! - The container acts as a viewport/camera sliding over this strip
//! - Overlapping projects are stacked into non-colliding display rows
//!
//! A layout pass is select → pack → map: filter the store down to the
//! projects near the visible window, assign each a row with a first-fit
//! scan over earlier-starting projects, then convert (dates, row) into
//! pixel rectangles for the renderer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a project, supplied by the embedding application.
pub type ProjectId = u64;

/// Seconds in a nominal day; used for padding and preload margins.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Errors raised at the ingestion boundary. The packer and the geometry
/// mapper are total over valid inputs and never fail.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("date {0:?} is not unix seconds or a parseable calendar date")]
    InvalidDate(String),

    #[error("project {id} ends before it starts ({end} < {start})")]
    InvalidInterval { id: ProjectId, start: i64, end: i64 },

    #[error("unknown view preset {0:?} (expected week, month or year)")]
    UnknownView(String),

    #[error("unknown mode preset {0:?} (expected regular or collapsed)")]
    UnknownMode(String),
}

// ============================================================================
// Interval math
// ============================================================================

/// True iff `lo <= x <= hi`. Degenerate ranges (`lo > hi`) are empty and
/// always return false.
pub fn is_between(lo: i64, x: i64, hi: i64) -> bool {
    lo <= x && x <= hi
}

/// Closed-interval intersection test. A shared endpoint counts as overlap.
///
/// Built as the four-way `is_between` check: either endpoint of one
/// interval inside the other, or full containment in either direction.
pub fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    is_between(b_start, a_start, b_end)
        || is_between(b_start, a_end, b_end)
        || is_between(a_start, b_start, a_end)
        || is_between(a_start, b_end, a_end)
}

fn utc_date(instant: i64) -> NaiveDate {
    DateTime::<Utc>::from_timestamp(instant, 0)
        .unwrap_or_default()
        .date_naive()
}

/// Whole-day difference between two instants, counted in UTC calendar days.
///
/// Day boundaries are UTC midnights, so local daylight-saving transitions
/// never shift bar edges. This deviates from a widget using a local-time
/// date library and is pinned down by `tests::day_diff_crosses_utc_midnight`.
pub fn days_between(from: i64, to: i64) -> i64 {
    (utc_date(to) - utc_date(from)).num_days()
}

/// Fractional day difference, for sub-day task tick placement.
pub fn fractional_days(from: i64, to: i64) -> f64 {
    (to - from) as f64 / SECONDS_PER_DAY as f64
}

// ============================================================================
// Dates and raw records
// ============================================================================

/// A date as supplied by the embedding application: either unix seconds
/// or a calendar string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Unix(i64),
    Calendar(String),
}

impl DateValue {
    /// Normalize to unix seconds. Calendar strings that do not parse are
    /// an error, never silently defaulted: a defaulted date would corrupt
    /// the sort order and with it the packing.
    pub fn to_unix(&self) -> Result<i64, LayoutError> {
        match self {
            DateValue::Unix(secs) => Ok(*secs),
            DateValue::Calendar(text) => {
                parse_calendar(text).ok_or_else(|| LayoutError::InvalidDate(text.clone()))
            }
        }
    }
}

/// Parse a calendar string to unix seconds: RFC 3339 first, then common
/// date-only formats taken as UTC midnight.
fn parse_calendar(text: &str) -> Option<i64> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.timestamp());
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
        }
    }
    None
}

/// A task entry on a raw project record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTask {
    pub date: DateValue,
}

/// A raw project record as supplied by the embedding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub start_date: DateValue,
    pub end_date: DateValue,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub tasks: Vec<RawTask>,
}

// ============================================================================
// Store types
// ============================================================================

/// A point-in-time marker rendered as a tick inside its project's bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMarker {
    pub offset_instant: i64,
}

/// A time-ranged project. Invariant: `start_instant <= end_instant`,
/// enforced at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub start_instant: i64,
    pub end_instant: i64,
    /// Display row assigned by the packer. Pass-scoped output, rewritten
    /// from scratch on every layout pass.
    pub assigned_row: u32,
    pub tasks: Vec<TaskMarker>,
    pub display_name: String,
    pub color_token: String,
    pub icon_ref: String,
}

// ============================================================================
// View and mode presets
// ============================================================================

/// Which day cells carry a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelGranularity {
    /// Every day cell is labeled.
    Day,
    /// Only the first day of each month is labeled.
    Month,
}

/// Fixed grid parameters for one view preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConfig {
    pub cell_width_px: f64,
    pub cell_height_px: f64,
    pub label_granularity: LabelGranularity,
    /// strftime pattern for day labels.
    pub label_format: &'static str,
    pub grid_color: &'static str,
    /// Extra days loaded on either side of the window so small pans do
    /// not change the active set.
    pub preload_days: i64,
    /// Playhead position in day cells from the viewport's left edge.
    pub day_offset: i64,
    /// Width of the highlighted "current" band in day cells.
    pub highlight_days: i64,
}

const WEEK_VIEW: ViewConfig = ViewConfig {
    cell_width_px: 150.0,
    cell_height_px: 10.0,
    label_granularity: LabelGranularity::Day,
    label_format: "%b %d",
    grid_color: "#DDD",
    preload_days: 200,
    day_offset: 1,
    highlight_days: 7,
};

const MONTH_VIEW: ViewConfig = ViewConfig {
    cell_width_px: 42.0,
    cell_height_px: 10.0,
    label_granularity: LabelGranularity::Day,
    label_format: "%b %d",
    grid_color: "#DDD",
    preload_days: 150,
    day_offset: 3,
    highlight_days: 10,
};

const YEAR_VIEW: ViewConfig = ViewConfig {
    cell_width_px: 13.0,
    cell_height_px: 10.0,
    label_granularity: LabelGranularity::Month,
    label_format: "%b",
    grid_color: "#DDD",
    preload_days: 100,
    day_offset: 5,
    highlight_days: 10,
};

/// Named view preset selecting the grid density of the timeline.
///
/// A closed set: unknown names are rejected at construction, both here
/// and during serde deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewPreset {
    Week,
    Month,
    #[default]
    Year,
}

impl ViewPreset {
    pub fn parse(name: &str) -> Result<Self, LayoutError> {
        match name {
            "week" => Ok(ViewPreset::Week),
            "month" => Ok(ViewPreset::Month),
            "year" => Ok(ViewPreset::Year),
            other => Err(LayoutError::UnknownView(other.to_string())),
        }
    }

    pub fn config(self) -> &'static ViewConfig {
        match self {
            ViewPreset::Week => &WEEK_VIEW,
            ViewPreset::Month => &MONTH_VIEW,
            ViewPreset::Year => &YEAR_VIEW,
        }
    }
}

/// Fixed parameters for one mode preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeConfig {
    /// Bar height as a multiple of the cell height.
    pub scale_factor: f64,
    /// Collision padding around each project, in days.
    pub padding_x_days: f64,
    /// Vertical gap between rows, in cell heights.
    pub padding_y_cells: f64,
    /// Whether bars carry icon, name and task ticks.
    pub show_content: bool,
}

const REGULAR_MODE: ModeConfig = ModeConfig {
    scale_factor: 2.0,
    padding_x_days: 2.0,
    padding_y_cells: 1.0,
    show_content: true,
};

const COLLAPSED_MODE: ModeConfig = ModeConfig {
    scale_factor: 0.3,
    padding_x_days: 0.0,
    padding_y_cells: 0.3,
    show_content: false,
};

/// Named mode preset: full bars or a collapsed overview strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModePreset {
    #[default]
    Regular,
    Collapsed,
}

impl ModePreset {
    pub fn parse(name: &str) -> Result<Self, LayoutError> {
        match name {
            "regular" => Ok(ModePreset::Regular),
            "collapsed" => Ok(ModePreset::Collapsed),
            other => Err(LayoutError::UnknownMode(other.to_string())),
        }
    }

    pub fn config(self) -> &'static ModeConfig {
        match self {
            ModePreset::Regular => &REGULAR_MODE,
            ModePreset::Collapsed => &COLLAPSED_MODE,
        }
    }

    /// Collision padding in seconds, applied on both sides of a project's
    /// own interval before the conflict test.
    pub fn padding_seconds(self) -> i64 {
        (self.config().padding_x_days * SECONDS_PER_DAY as f64) as i64
    }

    pub fn toggled(self) -> Self {
        match self {
            ModePreset::Regular => ModePreset::Collapsed,
            ModePreset::Collapsed => ModePreset::Regular,
        }
    }
}

// ============================================================================
// Time window
// ============================================================================

/// The date range currently rendered, plus the preload margin used for
/// active-set selection. All fields are unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub visible_start: i64,
    pub visible_end: i64,
    pub preload_margin: i64,
}

impl TimeWindow {
    /// Derive the window for an anchor instant and container width.
    ///
    /// The timeline strip is three container-widths wide and the anchor
    /// sits one container-width in, so a full-screen pan in either
    /// direction stays inside the strip.
    pub fn derive(anchor: i64, container_width_px: f64, view: ViewPreset) -> Self {
        let config = view.config();
        let days_until_current = (container_width_px / config.cell_width_px).floor() as i64;
        let days_in_grid = (container_width_px * 3.0 / config.cell_width_px).floor() as i64;
        let visible_start = anchor - days_until_current * SECONDS_PER_DAY;

        Self {
            visible_start,
            visible_end: visible_start + days_in_grid * SECONDS_PER_DAY,
            preload_margin: config.preload_days * SECONDS_PER_DAY,
        }
    }
}

// ============================================================================
// Geometry output
// ============================================================================

/// A rectangle in content coordinates (pixels, origin at the strip's
/// top-left). Fractional values are intentional: the collapsed mode
/// scales bar heights below one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Check if this rectangle intersects with another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.left + other.width
            && self.left + self.width > other.left
            && self.top < other.top + other.height
            && self.top + self.height > other.top
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Computed placement for one active project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub project_id: ProjectId,
    pub rect: Rect,
    pub row: u32,
    /// Pixel offset of each task tick from the bar's left edge. Sub-day
    /// precision, not truncated to whole cells.
    pub task_offsets: Vec<f64>,
}

/// Output of one full layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Placements for the active projects, in store order.
    pub placements: Vec<Placement>,
    /// Highest row assigned in this pass; 0 for an empty active set.
    pub max_row: u32,
}

/// Scrollable content height for a packed layout. Two spare rows keep
/// drag room below the lowest bar.
pub fn content_height(max_row: u32, view: ViewPreset, mode: ModePreset) -> f64 {
    let cell_h = view.config().cell_height_px;
    let bar_height = cell_h * mode.config().scale_factor - 1.0;
    let rows = (max_row + 2) as f64;
    rows * cell_h + rows * bar_height + cell_h
}

// ============================================================================
// The timeline store
// ============================================================================

/// The project store plus the layout pass over it.
///
/// Built once from raw records and kept for the widget's lifetime; the
/// active set, row assignments and geometry are recomputed on every pass.
/// `layout` takes `&mut self`, so the borrow checker enforces the
/// no-mutation-during-a-pass contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    /// Projects sorted ascending by start instant, ties in input order.
    projects: Vec<Project>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw records, normalizing all dates to unix
    /// seconds. Fails fast on unparseable dates and inverted intervals.
    pub fn from_records(records: &[ProjectRecord]) -> Result<Self, LayoutError> {
        let mut projects = Vec::with_capacity(records.len());

        for record in records {
            let start_instant = record.start_date.to_unix()?;
            let end_instant = record.end_date.to_unix()?;
            if end_instant < start_instant {
                return Err(LayoutError::InvalidInterval {
                    id: record.id,
                    start: start_instant,
                    end: end_instant,
                });
            }

            let tasks = record
                .tasks
                .iter()
                .map(|task| {
                    Ok(TaskMarker {
                        offset_instant: task.date.to_unix()?,
                    })
                })
                .collect::<Result<Vec<_>, LayoutError>>()?;

            projects.push(Project {
                id: record.id,
                start_instant,
                end_instant,
                assigned_row: 0,
                tasks,
                display_name: record.name.clone(),
                color_token: record.color.clone(),
                icon_ref: record.icon_url.clone(),
            });
        }

        // Stable sort: records sharing a start instant keep their input
        // order, which fixes the packing order.
        projects.sort_by_key(|p| p.start_instant);

        Ok(Self { projects })
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Get the number of projects.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Read access to the sorted project sequence.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Indices of projects whose interval intersects the window extended
    /// by its preload margin, in store order.
    ///
    /// Bounding the packer's input to this slice is what keeps the O(n²)
    /// packing affordable on large project sets.
    pub fn active_indices(&self, window: &TimeWindow) -> Vec<usize> {
        let lo = window.visible_start - window.preload_margin;
        let hi = window.visible_end + window.preload_margin;

        self.projects
            .iter()
            .enumerate()
            .filter(|(_, p)| overlaps(p.start_instant, p.end_instant, lo, hi))
            .map(|(index, _)| index)
            .collect()
    }

    /// First-fit row assignment over the active slice, in ascending start
    /// order. Returns the highest row used (0 for an empty set).
    ///
    /// Each project's own interval is padded by `padding_seconds` on both
    /// sides before the conflict test against every earlier active
    /// project; the compared project's interval is not padded. The four
    /// checks stay symmetric so containment in either direction counts.
    /// Greedy and deterministic, not row-minimal.
    pub fn pack_rows(&mut self, active: &[usize], padding_seconds: i64) -> u32 {
        let mut max_row = 0u32;

        for (position, &index) in active.iter().enumerate() {
            let subject = &self.projects[index];
            let padded_start = subject.start_instant - padding_seconds;
            let padded_end = subject.end_instant + padding_seconds;

            let mut used_rows = Vec::new();
            for &earlier in &active[..position] {
                let other = &self.projects[earlier];
                let conflicts = is_between(other.start_instant, padded_start, other.end_instant)
                    || is_between(padded_start, other.end_instant, padded_end)
                    || is_between(other.start_instant, padded_end, other.end_instant)
                    || is_between(padded_start, other.start_instant, padded_end);
                if conflicts {
                    used_rows.push(other.assigned_row);
                }
            }

            // First free row: scan upward past each occupied row. Gaps
            // left by non-conflicting projects stay reusable.
            used_rows.sort_unstable();
            used_rows.dedup();
            let mut row = 0u32;
            for used in used_rows {
                if row == used {
                    row += 1;
                }
            }

            max_row = max_row.max(row);
            self.projects[index].assigned_row = row;
        }

        max_row
    }

    /// Pixel geometry for one project against a window start.
    ///
    /// The -1 px on width and height and the +1 px in the row stride
    /// reproduce the original widget's grid-line gap, kept for pixel
    /// parity.
    pub fn placement_for(
        &self,
        index: usize,
        window_start: i64,
        view: ViewPreset,
        mode: ModePreset,
    ) -> Placement {
        let project = &self.projects[index];
        let view_config = view.config();
        let mode_config = mode.config();
        let cell_w = view_config.cell_width_px;
        let cell_h = view_config.cell_height_px;

        let height = cell_h * mode_config.scale_factor - 1.0;
        let pad_y = cell_h * mode_config.padding_y_cells;

        let left = days_between(window_start, project.start_instant) as f64 * cell_w;
        let width =
            (days_between(project.start_instant, project.end_instant) + 1) as f64 * cell_w - 1.0;
        let top = pad_y + project.assigned_row as f64 * (height + pad_y + 1.0);

        let task_offsets = project
            .tasks
            .iter()
            .map(|task| fractional_days(project.start_instant, task.offset_instant) * cell_w)
            .collect();

        Placement {
            project_id: project.id,
            rect: Rect::new(left, top, width, height),
            row: project.assigned_row,
            task_offsets,
        }
    }

    /// One full layout pass: select the active slice, pack rows, map
    /// geometry. Runs to completion; there is no incremental path.
    pub fn layout(
        &mut self,
        window: &TimeWindow,
        view: ViewPreset,
        mode: ModePreset,
    ) -> LayoutResult {
        let active = self.active_indices(window);
        let max_row = self.pack_rows(&active, mode.padding_seconds());

        let placements = active
            .iter()
            .map(|&index| self.placement_for(index, window.visible_start, view, mode))
            .collect();

        LayoutResult {
            placements,
            max_row,
        }
    }
}
