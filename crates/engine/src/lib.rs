//! Timelane Engine
//!
//! Owns the project store and the current view state, and turns renderer
//! events into full layout passes.
//!
//! Responsibilities:
//! - Maintain timeline state (store, view, mode, anchor, viewport)
//! - Process events from the rendering collaborator
//! - Run the synchronous select → pack → map pass
//! - Emit complete layout frames
//!
//! One pass runs to completion before the next event is processed; the
//! engine is single-threaded by construction and every render is a full
//! recomputation. Drag throttling (animation-frame cadence) is the
//! collaborator's job, not the engine's.

pub mod config;
pub mod drag;

use anyhow::Result;
use chrono::Utc;
use timelane_core_layout::{
    content_height, DateValue, LayoutError, ModePreset, TimeWindow, Timeline, ViewPreset,
    SECONDS_PER_DAY,
};
use timelane_protocol::{LayoutFrame, TimelineEvent};
use tracing::{debug, info};

pub use config::{config_paths, Config};

/// The stateful engine behind one timeline widget.
pub struct Engine {
    timeline: Timeline,
    view: ViewPreset,
    mode: ModePreset,
    /// Anchor instant; the viewport shows it one container-width in.
    anchor: i64,
    viewport_width: f64,
    viewport_height: f64,
    /// Vertical content offset, kept non-positive (a margin-top).
    scroll_top: f64,
}

impl Engine {
    /// Create an engine from configuration. The anchor defaults to now
    /// when no `anchor_date` is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let anchor = match &config.timeline.anchor_date {
            Some(text) => DateValue::Calendar(text.clone()).to_unix()?,
            None => Utc::now().timestamp(),
        };

        Ok(Self::with_state(
            config.timeline.view,
            config.timeline.mode,
            anchor,
            config.viewport.width,
            config.viewport.height,
        ))
    }

    /// Create an engine with explicit state.
    pub fn with_state(
        view: ViewPreset,
        mode: ModePreset,
        anchor: i64,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Self {
        Self {
            timeline: Timeline::new(),
            view,
            mode,
            anchor,
            viewport_width,
            viewport_height,
            scroll_top: 0.0,
        }
    }

    pub fn view(&self) -> ViewPreset {
        self.view
    }

    pub fn mode(&self) -> ModePreset {
        self.mode
    }

    pub fn anchor(&self) -> i64 {
        self.anchor
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Replace the project set.
    pub fn set_projects(
        &mut self,
        records: &[timelane_core_layout::ProjectRecord],
    ) -> Result<(), LayoutError> {
        self.timeline = Timeline::from_records(records)?;
        info!(projects = self.timeline.len(), "project set replaced");
        Ok(())
    }

    /// Apply one event and render the resulting frame. On error the
    /// prior state is left untouched.
    pub fn apply(&mut self, event: TimelineEvent) -> Result<LayoutFrame, LayoutError> {
        match event {
            TimelineEvent::SetProjects { projects } => {
                self.set_projects(&projects)?;
            }
            TimelineEvent::NavigateTo { date } => {
                self.anchor = date.to_unix()?;
                info!(anchor = self.anchor, "navigate");
            }
            TimelineEvent::ChangeView { view } => {
                self.view = view;
                info!(?view, "view changed");
            }
            TimelineEvent::ToggleCollapse => {
                self.mode = self.mode.toggled();
                info!(mode = ?self.mode, "mode toggled");
            }
            TimelineEvent::Drag { dx, dy } => {
                self.drag_by(dx, dy);
            }
            TimelineEvent::Resize { width, height } => {
                self.viewport_width = width.max(0.0);
                self.viewport_height = height.max(0.0);
            }
            TimelineEvent::Query => {}
        }

        Ok(self.render())
    }

    /// Apply a finished drag. Horizontal travel re-anchors by whole
    /// days (dragging the strip right shows earlier dates); vertical
    /// travel moves the content scroll, clamped to the content height.
    fn drag_by(&mut self, dx: f64, dy: f64) {
        let cell_w = self.view.config().cell_width_px;
        let day_delta = (dx / cell_w).round() as i64;
        self.anchor -= day_delta * SECONDS_PER_DAY;
        self.scroll_top += dy;
        debug!(day_delta, dy, "drag applied");
    }

    /// One full render pass: derive the window, lay out the active
    /// slice, wrap the result in a frame.
    pub fn render(&mut self) -> LayoutFrame {
        let window = TimeWindow::derive(self.anchor, self.viewport_width, self.view);
        let result = self.timeline.layout(&window, self.view, self.mode);
        debug!(
            active = result.placements.len(),
            max_row = result.max_row,
            "layout pass"
        );

        let view_config = self.view.config();
        let cell_w = view_config.cell_width_px;
        let days_until_current = (self.viewport_width / cell_w).floor();
        let day_offset_px = view_config.day_offset as f64 * cell_w;

        let content_height =
            content_height(result.max_row, self.view, self.mode).max(self.viewport_height);

        // Clamp scroll so the content bottom never detaches from the
        // viewport bottom.
        let max_margin = -(content_height - self.viewport_height);
        self.scroll_top = self.scroll_top.clamp(max_margin, 0.0);

        LayoutFrame {
            placements: result.placements,
            max_row: result.max_row,
            content_height,
            scroll_top: self.scroll_top,
            window,
            timeline_width_px: self.viewport_width * 3.0,
            timeline_offset_px: -(days_until_current * cell_w) + day_offset_px,
            playhead_left_px: day_offset_px,
            playhead_width_px: view_config.highlight_days as f64 * cell_w,
            cell_width_px: cell_w,
            cell_height_px: view_config.cell_height_px,
            grid_color: view_config.grid_color.to_string(),
            mode: self.mode,
            show_content: self.mode.config().show_content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timelane_core_layout::ProjectRecord;

    fn day(n: i64) -> i64 {
        n * SECONDS_PER_DAY
    }

    fn record(id: u64, start: i64, end: i64) -> ProjectRecord {
        ProjectRecord {
            id,
            start_date: DateValue::Unix(start),
            end_date: DateValue::Unix(end),
            name: format!("project {id}"),
            color: String::new(),
            icon_url: String::new(),
            tasks: Vec::new(),
        }
    }

    fn engine_at(anchor_days: i64) -> Engine {
        // Year view, 1300 px: 100 cells to the anchor.
        Engine::with_state(
            ViewPreset::Year,
            ModePreset::Regular,
            day(anchor_days),
            1300.0,
            600.0,
        )
    }

    #[test]
    fn test_render_empty_engine() {
        let mut engine = engine_at(200);
        let frame = engine.render();
        assert!(frame.placements.is_empty());
        assert_eq!(frame.max_row, 0);
        // Content height floors to the viewport.
        assert_eq!(frame.content_height, 600.0);
        assert_eq!(frame.timeline_width_px, 3_900.0);
    }

    #[test]
    fn test_render_places_active_projects() {
        let mut engine = engine_at(200);
        engine
            .set_projects(&[record(1, day(190), day(210)), record(2, day(900), day(910))])
            .unwrap();
        let frame = engine.render();

        // Project 2 is far outside the preloaded window.
        assert_eq!(frame.placements.len(), 1);
        assert_eq!(frame.placements[0].project_id, 1);
        assert_eq!(frame.window.visible_start, day(100));
    }

    #[test]
    fn test_viewport_anchoring_math() {
        let mut engine = engine_at(200);
        let frame = engine.render();
        let config = ViewPreset::Year.config();

        // 100 cells back, plus the view's day offset.
        let day_offset_px = config.day_offset as f64 * config.cell_width_px;
        assert_eq!(
            frame.timeline_offset_px,
            -(100.0 * config.cell_width_px) + day_offset_px
        );
        assert_eq!(frame.playhead_left_px, day_offset_px);
        assert_eq!(
            frame.playhead_width_px,
            config.highlight_days as f64 * config.cell_width_px
        );
    }

    #[test]
    fn test_drag_reanchors_whole_days() {
        let mut engine = engine_at(200);
        let cell_w = ViewPreset::Year.config().cell_width_px;

        // Drag three and a bit cells to the left: three days forward.
        engine
            .apply(TimelineEvent::Drag {
                dx: -(3.2 * cell_w),
                dy: 0.0,
            })
            .unwrap();
        assert_eq!(engine.anchor(), day(203));

        // Dragging right shows earlier dates.
        engine
            .apply(TimelineEvent::Drag {
                dx: 10.0 * cell_w,
                dy: 0.0,
            })
            .unwrap();
        assert_eq!(engine.anchor(), day(193));
    }

    #[test]
    fn test_vertical_drag_clamps_to_content() {
        let mut engine = engine_at(200);
        // Scrolling up past the top clamps to zero.
        let frame = engine
            .apply(TimelineEvent::Drag { dx: 0.0, dy: 50.0 })
            .unwrap();
        assert_eq!(frame.scroll_top, 0.0);

        // Scrolling down clamps to the content height.
        let frame = engine
            .apply(TimelineEvent::Drag {
                dx: 0.0,
                dy: -10_000.0,
            })
            .unwrap();
        assert_eq!(frame.scroll_top, -(frame.content_height - 600.0));
    }

    #[test]
    fn test_toggle_collapse_switches_mode() {
        let mut engine = engine_at(200);
        engine.set_projects(&[record(1, day(195), day(205))]).unwrap();

        let frame = engine.apply(TimelineEvent::ToggleCollapse).unwrap();
        assert_eq!(frame.mode, ModePreset::Collapsed);
        assert!(!frame.show_content);
        // 10 * 0.3 - 1
        assert!((frame.placements[0].rect.height - 2.0).abs() < 1e-9);

        let frame = engine.apply(TimelineEvent::ToggleCollapse).unwrap();
        assert_eq!(frame.mode, ModePreset::Regular);
        assert!(frame.show_content);
    }

    #[test]
    fn test_change_view_rescales_window() {
        let mut engine = engine_at(200);
        let frame = engine
            .apply(TimelineEvent::ChangeView {
                view: ViewPreset::Week,
            })
            .unwrap();

        // 150 px cells over 1300 px: 8 days to the anchor.
        assert_eq!(frame.window.visible_start, day(192));
        assert_eq!(frame.cell_width_px, 150.0);
    }

    #[test]
    fn test_navigate_with_calendar_string() {
        let mut engine = engine_at(0);
        let frame = engine
            .apply(TimelineEvent::NavigateTo {
                date: DateValue::Calendar("1970-07-20".to_string()),
            })
            .unwrap();
        assert_eq!(engine.anchor(), day(200));
        assert_eq!(frame.window.visible_start, day(100));
    }

    #[test]
    fn test_bad_navigate_leaves_state_untouched() {
        let mut engine = engine_at(200);
        let before = engine.anchor();
        let result = engine.apply(TimelineEvent::NavigateTo {
            date: DateValue::Calendar("someday".to_string()),
        });
        assert!(result.is_err());
        assert_eq!(engine.anchor(), before);
    }

    #[test]
    fn test_bad_project_set_is_rejected_whole() {
        let mut engine = engine_at(200);
        engine.set_projects(&[record(1, day(195), day(205))]).unwrap();

        let result = engine.apply(TimelineEvent::SetProjects {
            projects: vec![record(2, day(10), day(5))],
        });
        assert!(result.is_err());
        // The previous store is still in place.
        assert_eq!(engine.timeline().len(), 1);
    }
}
