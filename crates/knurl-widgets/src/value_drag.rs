#![forbid(unsafe_code)]

//! Numeric drag editing.
//!
//! [`DragEdit`] turns horizontal pointer travel into value changes for a
//! number or color widget. It accumulates travel incrementally so that
//! modifier changes mid-drag affect only subsequent motion: holding Shift
//! halfway through a drag slows the remainder without rescaling what was
//! already applied.
//!
//! # Design Notes
//!
//! - Sensitivity is fixed at drag start from the field's soft range. A
//!   bounded field maps its soft span across a capped number of cells; an
//!   unbounded field moves one click-step per threshold's worth of cells.
//! - Logarithmic fields accumulate in ln space, so equal travel multiplies
//!   the value by equal factors. Values are floored above zero before the
//!   ln transform.
//! - Snapping (Ctrl) applies to the output value only; the accumulator
//!   keeps full precision, so releasing Ctrl restores the unsnapped value.

use knurl_core::config::InteractionConfig;
use knurl_core::event::Modifiers;
use knurl_core::geometry::Point;

use crate::widget::{LOG_MIN_FLOOR, NumberField, NumberScale};

/// Default ln-space change per cell for unbounded logarithmic fields.
const LOG_PER_CELL_DEFAULT: f64 = 0.05;

/// Lower bound on ln-space sensitivity for tightly bounded fields.
const LOG_PER_CELL_MIN: f64 = 0.01;

/// Sensitivity for one cell of horizontal travel, in drag space.
fn per_cell(field: &NumberField, cfg: &InteractionConfig) -> f64 {
    let threshold = f64::from(cfg.drag_threshold_cells.max(1));
    match field.scale {
        NumberScale::Linear => {
            let base = field.step.abs() / threshold;
            match field.finite_soft_span() {
                Some(span) => base.max(span / f64::from(cfg.soft_range_map_cells_max)),
                None => base,
            }
        }
        NumberScale::Logarithmic => {
            let lo = field.soft_min.max(LOG_MIN_FLOOR);
            let hi = field.soft_max.max(LOG_MIN_FLOOR);
            let span = (hi / lo).ln();
            if span.is_finite() && span > 0.0 {
                (span / f64::from(cfg.soft_range_map_cells_max)).max(LOG_PER_CELL_MIN)
            } else {
                LOG_PER_CELL_DEFAULT
            }
        }
    }
}

/// Snap to the nearest multiple of `increment`.
fn snap_to(value: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return value;
    }
    (value / increment).round() * increment
}

/// Snap a candidate value per the held modifiers.
///
/// Ctrl snaps to ten click-steps, Ctrl+Shift to one. Hue channels snap
/// per turn instead: twelfths, or twenty-fourths with Shift.
fn apply_snap(
    value: f64,
    field: &NumberField,
    hue: bool,
    mods: Modifiers,
    cfg: &InteractionConfig,
) -> f64 {
    if !mods.contains(Modifiers::CTRL) {
        return value;
    }
    if hue {
        let steps = if mods.contains(Modifiers::SHIFT) {
            cfg.hue_snap_steps_fine
        } else {
            cfg.hue_snap_steps
        };
        snap_to(value, 1.0 / f64::from(steps.max(1)))
    } else if mods.contains(Modifiers::SHIFT) {
        snap_to(value, field.step)
    } else {
        snap_to(value, field.step * 10.0)
    }
}

/// Apply discrete click-step increments (arrow keys, scroll wheel).
///
/// Shift scales the increment down by the precision factor. The result is
/// clamped to the hard range.
#[must_use]
pub fn step_value(
    field: &NumberField,
    steps: i32,
    mods: Modifiers,
    cfg: &InteractionConfig,
) -> f64 {
    let factor = if mods.contains(Modifiers::SHIFT) {
        cfg.precision_drag_factor
    } else {
        1.0
    };
    field.clamp_hard(field.value + f64::from(steps) * field.step * factor)
}

/// An in-progress numeric drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragEdit {
    start: Point,
    last: Point,
    start_value: f64,
    /// Accumulated travel in drag space (value units, or ln units).
    accum: f64,
    per_cell: f64,
    hue: bool,
}

impl DragEdit {
    /// Begin a drag at `start` over `field`.
    #[must_use]
    pub fn begin(start: Point, field: &NumberField, cfg: &InteractionConfig) -> Self {
        Self {
            start,
            last: start,
            start_value: field.value,
            accum: 0.0,
            per_cell: per_cell(field, cfg),
            hue: false,
        }
    }

    /// Begin a drag over a hue channel; Ctrl snaps per turn.
    #[must_use]
    pub fn begin_hue(start: Point, field: &NumberField, cfg: &InteractionConfig) -> Self {
        Self {
            hue: true,
            ..Self::begin(start, field, cfg)
        }
    }

    /// The value at drag start; restored on cancel.
    #[must_use]
    pub fn start_value(&self) -> f64 {
        self.start_value
    }

    /// Whether any horizontal travel has been applied.
    #[must_use]
    pub fn has_moved(&self) -> bool {
        self.accum != 0.0 || self.last != self.start
    }

    /// Feed a pointer position and compute the updated value.
    ///
    /// Only travel since the previous call is scaled by the current
    /// modifiers, so toggling Shift mid-drag changes pace without jumping.
    pub fn update(
        &mut self,
        cursor: Point,
        mods: Modifiers,
        field: &NumberField,
        cfg: &InteractionConfig,
    ) -> f64 {
        let dx = f64::from(cursor.x - self.last.x);
        self.last = cursor;

        let factor = if mods.contains(Modifiers::SHIFT) {
            cfg.precision_drag_factor
        } else {
            1.0
        };
        self.accum += dx * self.per_cell * factor;

        let raw = match field.scale {
            NumberScale::Linear => self.start_value + self.accum,
            NumberScale::Logarithmic => {
                let base = self.start_value.max(LOG_MIN_FLOOR);
                (base.ln() + self.accum).exp().max(LOG_MIN_FLOOR)
            }
        };
        field.clamp_hard(apply_snap(raw, field, self.hue, mods, cfg))
    }

    /// The delta applied so far, in value space.
    #[must_use]
    pub fn applied_delta(&self, field: &NumberField) -> f64 {
        match field.scale {
            NumberScale::Linear => self.accum,
            NumberScale::Logarithmic => {
                let base = self.start_value.max(LOG_MIN_FLOOR);
                (base.ln() + self.accum).exp() - base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::NumberField;

    fn cfg() -> InteractionConfig {
        InteractionConfig::default()
    }

    #[test]
    fn unbounded_field_moves_one_step_per_threshold() {
        let field = NumberField::new(10.0).with_step(1.0);
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        // Threshold is 3 cells; 3 cells of travel is one step.
        let v = drag.update(Point::new(3, 0), Modifiers::NONE, &field, &cfg);
        assert!((v - 11.0).abs() < 1e-9);
    }

    #[test]
    fn bounded_field_maps_soft_span() {
        // Span 1000 over a 1000-cell cap: one unit per cell, which beats
        // the step-based floor of 1/3.
        let field = NumberField::new(0.0)
            .with_soft_range(0.0, 1000.0)
            .with_hard_range(0.0, 1000.0)
            .with_step(1.0);
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        let v = drag.update(Point::new(10, 0), Modifiers::NONE, &field, &cfg);
        assert!((v - 10.0).abs() < 1e-9);
    }

    #[test]
    fn leftward_travel_decreases() {
        let field = NumberField::new(5.0).with_step(1.0);
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(10, 0), &field, &cfg);
        let v = drag.update(Point::new(4, 0), Modifiers::NONE, &field, &cfg);
        assert!(v < 5.0);
    }

    #[test]
    fn shift_mid_drag_scales_only_later_motion() {
        let field = NumberField::new(0.0).with_step(3.0);
        let cfg = cfg();
        // per_cell = 1.0 with step 3 and threshold 3.
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        let v1 = drag.update(Point::new(10, 0), Modifiers::NONE, &field, &cfg);
        assert!((v1 - 10.0).abs() < 1e-9);
        // Ten more cells under Shift add 10 * 0.05 = 0.5, not 10.
        let v2 = drag.update(Point::new(20, 0), Modifiers::SHIFT, &field, &cfg);
        assert!((v2 - 10.5).abs() < 1e-6);
    }

    #[test]
    fn ctrl_snaps_without_losing_precision() {
        let field = NumberField::new(0.0).with_step(1.0);
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        drag.update(Point::new(11, 0), Modifiers::NONE, &field, &cfg);
        // 11 cells / threshold 3 = 3.66..; Ctrl snaps to 10 * step.
        let snapped = drag.update(Point::new(11, 0), Modifiers::CTRL, &field, &cfg);
        assert!((snapped - 0.0).abs() < 1e-9);
        // Releasing Ctrl restores the unsnapped value.
        let free = drag.update(Point::new(11, 0), Modifiers::NONE, &field, &cfg);
        assert!((free - 11.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn ctrl_shift_snaps_to_single_step() {
        let field = NumberField::new(0.0).with_step(1.0);
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        drag.update(Point::new(10, 0), Modifiers::NONE, &field, &cfg);
        let v = drag.update(
            Point::new(10, 0),
            Modifiers::CTRL | Modifiers::SHIFT,
            &field,
            &cfg,
        );
        // 10/3 = 3.33.. snaps to 3.0.
        assert!((v - 3.0).abs() < 1e-9);
    }

    #[test]
    fn hue_snaps_per_turn() {
        let field = NumberField::new(0.0).with_range(0.0, 1.0).with_step(0.01);
        let cfg = cfg();
        let mut drag = DragEdit::begin_hue(Point::new(0, 0), &field, &cfg);
        // Step floor gives 0.01/3 per cell; 110 cells is 0.3667, which
        // Ctrl snaps to the nearest twelfth.
        let v = drag.update(Point::new(110, 0), Modifiers::CTRL, &field, &cfg);
        assert!((v - 4.0 / 12.0).abs() < 1e-9);
        let fine = drag.update(
            Point::new(110, 0),
            Modifiers::CTRL | Modifiers::SHIFT,
            &field,
            &cfg,
        );
        assert!((fine - 9.0 / 24.0).abs() < 1e-9);
    }

    #[test]
    fn output_clamps_to_hard_range() {
        let field = NumberField::new(0.9).with_range(0.0, 1.0).with_step(0.1);
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        let v = drag.update(Point::new(5000, 0), Modifiers::NONE, &field, &cfg);
        assert_eq!(v, 1.0);
        // The accumulator still tracks overshoot; dragging back works.
        let back = drag.update(Point::new(0, 0), Modifiers::NONE, &field, &cfg);
        assert!((back - 0.9).abs() < 1e-9);
    }

    #[test]
    fn log_drag_never_reaches_zero() {
        let field = NumberField::new(0.001)
            .with_hard_range(0.0, 100.0)
            .with_step(0.001)
            .logarithmic();
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        let v = drag.update(Point::new(-10_000, 0), Modifiers::NONE, &field, &cfg);
        assert!(v >= LOG_MIN_FLOOR);
        assert!(v > 0.0);
    }

    #[test]
    fn log_drag_multiplies_for_equal_travel() {
        let field = NumberField::new(1.0)
            .with_hard_range(0.0, 1e9)
            .logarithmic();
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        let a = drag.update(Point::new(20, 0), Modifiers::NONE, &field, &cfg);
        let b = drag.update(Point::new(40, 0), Modifiers::NONE, &field, &cfg);
        // Second 20 cells multiply by the same factor as the first.
        assert!((b / a - a / 1.0).abs() < 1e-9);
    }

    #[test]
    fn start_value_survives_for_cancel() {
        let field = NumberField::new(7.5);
        let cfg = cfg();
        let mut drag = DragEdit::begin(Point::new(0, 0), &field, &cfg);
        drag.update(Point::new(50, 0), Modifiers::NONE, &field, &cfg);
        assert_eq!(drag.start_value(), 7.5);
        assert!(drag.has_moved());
    }

    #[test]
    fn step_value_applies_increments() {
        let field = NumberField::new(5.0).with_range(0.0, 10.0).with_step(1.0);
        let cfg = cfg();
        assert_eq!(step_value(&field, 2, Modifiers::NONE, &cfg), 7.0);
        assert_eq!(step_value(&field, -1, Modifiers::NONE, &cfg), 4.0);
        assert_eq!(step_value(&field, 100, Modifiers::NONE, &cfg), 10.0);
        // Shift scales by the precision factor.
        let fine = step_value(&field, 1, Modifiers::SHIFT, &cfg);
        assert!((fine - 5.05).abs() < 1e-6);
    }
}
