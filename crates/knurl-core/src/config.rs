#![forbid(unsafe_code)]

//! Interaction tuning constants.
//!
//! Every threshold that governs gesture interpretation lives here instead
//! of being hard-coded at its use site. The defaults are UX tuning values:
//! their precise magnitudes are not load-bearing beyond "small distance" /
//! "mostly vertical", so embedders may adjust them freely.

use std::time::Duration;

/// Tuning knobs for widget interaction.
#[derive(Debug, Clone)]
pub struct InteractionConfig {
    /// Travel (Chebyshev cells) before a press latches into a drag
    /// (default: 3).
    pub drag_threshold_cells: u32,

    /// Maximum time between two presses for a double-click (default: 300ms).
    ///
    /// Also bounds how long a press may be held and still release as a
    /// click rather than a plain release.
    pub double_click_window: Duration,

    /// Maximum distance (Chebyshev cells) between two presses for a
    /// double-click (default: 3).
    pub double_click_radius: u32,

    /// Slow-down factor applied to drag motion while Shift is held
    /// (default: 0.05).
    pub precision_drag_factor: f64,

    /// Cap on how many cells of travel map onto a widget's full soft range
    /// (default: 1000).
    ///
    /// Bounds sensitivity when the soft range is very large; infinite soft
    /// ranges always fall back to click-step mapping.
    pub soft_range_map_cells_max: u32,

    /// Vertical travel before a drag gesture is judged for multi-widget
    /// selection (default: 2).
    pub vertical_gesture_cells: u32,

    /// Minimum |dy|/length ratio for a gesture to count as "mostly
    /// vertical" (default: 0.75, i.e. within ~41° of straight up/down).
    pub vertical_dominance: f32,

    /// Horizontal travel after multi-widget setup before lockstep editing
    /// engages (default: 2).
    pub multi_drag_lock_x_cells: u32,

    /// Hover dwell before a menu widget auto-opens (default: 200ms).
    pub auto_open_dwell: Duration,

    /// Duration of the post-click highlight flash (default: 100ms).
    pub flash_duration: Duration,

    /// Bound on the per-session text-edit undo substack (default: 32).
    pub text_undo_depth: usize,

    /// Snap steps per turn for hue values under Ctrl (default: 12).
    pub hue_snap_steps: u32,

    /// Snap steps per turn for hue values under Ctrl+Shift (default: 24).
    pub hue_snap_steps_fine: u32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_cells: 3,
            double_click_window: Duration::from_millis(300),
            double_click_radius: 3,
            precision_drag_factor: 0.05,
            soft_range_map_cells_max: 1000,
            vertical_gesture_cells: 2,
            vertical_dominance: 0.75,
            multi_drag_lock_x_cells: 2,
            auto_open_dwell: Duration::from_millis(200),
            flash_duration: Duration::from_millis(100),
            text_undo_depth: 32,
            hue_snap_steps: 12,
            hue_snap_steps_fine: 24,
        }
    }
}

impl InteractionConfig {
    /// Set the drag-lock threshold.
    #[must_use]
    pub fn with_drag_threshold(mut self, cells: u32) -> Self {
        self.drag_threshold_cells = cells;
        self
    }

    /// Set the double-click window.
    #[must_use]
    pub fn with_double_click_window(mut self, window: Duration) -> Self {
        self.double_click_window = window;
        self
    }

    /// Set the Shift precision-drag factor.
    #[must_use]
    pub fn with_precision_factor(mut self, factor: f64) -> Self {
        self.precision_drag_factor = factor;
        self
    }

    /// Set the vertical gesture threshold for multi-widget selection.
    #[must_use]
    pub fn with_vertical_gesture(mut self, cells: u32) -> Self {
        self.vertical_gesture_cells = cells;
        self
    }

    /// Set the menu auto-open dwell.
    #[must_use]
    pub fn with_auto_open_dwell(mut self, dwell: Duration) -> Self {
        self.auto_open_dwell = dwell;
        self
    }

    /// Set the text-edit undo depth.
    #[must_use]
    pub fn with_text_undo_depth(mut self, depth: usize) -> Self {
        self.text_undo_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = InteractionConfig::default();
        assert_eq!(cfg.drag_threshold_cells, 3);
        assert_eq!(cfg.double_click_window, Duration::from_millis(300));
        assert_eq!(cfg.double_click_radius, 3);
        assert_eq!(cfg.precision_drag_factor, 0.05);
        assert_eq!(cfg.soft_range_map_cells_max, 1000);
        assert_eq!(cfg.vertical_gesture_cells, 2);
        assert_eq!(cfg.vertical_dominance, 0.75);
        assert_eq!(cfg.text_undo_depth, 32);
        assert_eq!(cfg.hue_snap_steps, 12);
        assert_eq!(cfg.hue_snap_steps_fine, 24);
    }

    #[test]
    fn builder_chain() {
        let cfg = InteractionConfig::default()
            .with_drag_threshold(5)
            .with_double_click_window(Duration::from_millis(500))
            .with_precision_factor(0.1)
            .with_vertical_gesture(4)
            .with_auto_open_dwell(Duration::from_millis(50))
            .with_text_undo_depth(8);
        assert_eq!(cfg.drag_threshold_cells, 5);
        assert_eq!(cfg.double_click_window, Duration::from_millis(500));
        assert_eq!(cfg.precision_drag_factor, 0.1);
        assert_eq!(cfg.vertical_gesture_cells, 4);
        assert_eq!(cfg.auto_open_dwell, Duration::from_millis(50));
        assert_eq!(cfg.text_undo_depth, 8);
    }
}
