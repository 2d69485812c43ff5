#![forbid(unsafe_code)]

//! Widget data model.
//!
//! A [`Widget`] is one interactive element: its screen rectangle, semantic
//! kind, interaction flags, and optional operator hook. Widgets are
//! exclusively owned by their containing region and rebuilt from scratch
//! every redraw cycle; [`WidgetId`] is the stable handle across rebuilds.
//!
//! # Design Notes
//!
//! - The kind is a closed tagged enum ([`WidgetKind`]) carrying only the
//!   fields each kind needs. Dispatch is a `match`, never a type tag plus
//!   cast.
//! - A numeric value is always clamped to its hard range; the soft range
//!   governs only drag sensitivity.

use std::rc::Rc;

use bitflags::bitflags;
use knurl_core::geometry::Rect;

use crate::binding::Operator;

/// Stable identifier for a widget across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u64);

bitflags! {
    /// Per-widget interaction capabilities.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WidgetFlags: u8 {
        /// Horizontal drag edits the value.
        const DRAG_VALUE = 0b0001;
        /// Participates in vertical-gesture lockstep editing.
        const MULTI_DRAG = 0b0010;
        /// Committed edits push an undo step.
        const UNDO       = 0b0100;
        /// Activation is refused outright.
        const DISABLED   = 0b1000;
    }
}

/// Scale applied when dragging a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberScale {
    /// Uniform cell-to-value mapping.
    #[default]
    Linear,
    /// Drag in log space; equal travel multiplies rather than adds.
    Logarithmic,
}

/// Floor applied to logarithmic values so `ln` never sees zero.
pub const LOG_MIN_FLOOR: f64 = 0.5e-8;

/// Rounding offset for automatic display precision.
///
/// Ten times this value (0.3) is where the digit count switches, rather
/// than exactly at powers of ten.
pub const PRECISION_OFFSET: f64 = 0.03;

const PRECISION_MAX: u32 = 6;

/// Decimal digits needed to display a value given its click-step.
///
/// The step picks a baseline (step 0.01 → 2 digits); magnitudes below
/// 0.3, 0.03, … earn one extra digit per decade so small values don't
/// display as `0.0`.
#[must_use]
pub fn auto_precision(step: f64, value: f64) -> u32 {
    let from_step = if step <= 0.0 {
        2
    } else if step >= 1.0 {
        0
    } else {
        (-step.log10()).ceil() as u32
    };

    let v = value.abs();
    if v == 0.0 || !v.is_finite() {
        return from_step.min(PRECISION_MAX);
    }

    let mut extra = 0u32;
    let mut bound = PRECISION_OFFSET * 10.0;
    while v < bound && (from_step + extra) < PRECISION_MAX {
        extra += 1;
        bound /= 10.0;
    }
    (from_step + extra).min(PRECISION_MAX)
}

/// Numeric slider/field payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberField {
    /// Current value, always within `[hard_min, hard_max]`.
    pub value: f64,
    /// Soft range: governs drag sensitivity only.
    pub soft_min: f64,
    /// See `soft_min`.
    pub soft_max: f64,
    /// Hard range: the true clamp.
    pub hard_min: f64,
    /// See `hard_min`.
    pub hard_max: f64,
    /// Click-step: value change for one discrete increment.
    pub step: f64,
    /// Fixed display precision; `None` derives it from step and magnitude.
    pub precision: Option<u32>,
    /// Drag-space mapping.
    pub scale: NumberScale,
}

impl NumberField {
    /// Create an unbounded linear field with step 1.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value,
            soft_min: f64::NEG_INFINITY,
            soft_max: f64::INFINITY,
            hard_min: f64::NEG_INFINITY,
            hard_max: f64::INFINITY,
            step: 1.0,
            precision: None,
            scale: NumberScale::Linear,
        }
    }

    /// Set the hard range and clamp the current value into it.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    #[must_use]
    pub fn with_hard_range(mut self, min: f64, max: f64) -> Self {
        assert!(min <= max, "hard range must be ordered");
        self.hard_min = min;
        self.hard_max = max;
        self.value = self.value.clamp(min, max);
        self
    }

    /// Set the soft range.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    #[must_use]
    pub fn with_soft_range(mut self, min: f64, max: f64) -> Self {
        assert!(min <= max, "soft range must be ordered");
        self.soft_min = min;
        self.soft_max = max;
        self
    }

    /// Set both ranges to the same bounds.
    #[must_use]
    pub fn with_range(self, min: f64, max: f64) -> Self {
        self.with_hard_range(min, max).with_soft_range(min, max)
    }

    /// Set the click-step.
    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Fix the display precision.
    #[must_use]
    pub fn with_precision(mut self, digits: u32) -> Self {
        self.precision = Some(digits);
        self
    }

    /// Use logarithmic drag mapping.
    #[must_use]
    pub fn logarithmic(mut self) -> Self {
        self.scale = NumberScale::Logarithmic;
        self
    }

    /// Clamp a candidate value to the hard range.
    #[must_use]
    pub fn clamp_hard(&self, value: f64) -> f64 {
        value.clamp(self.hard_min, self.hard_max)
    }

    /// Assign a value, clamping to the hard range.
    pub fn set_value(&mut self, value: f64) {
        self.value = self.clamp_hard(value);
    }

    /// Display precision: fixed if configured, derived otherwise.
    #[must_use]
    pub fn display_precision(&self) -> u32 {
        self.precision
            .unwrap_or_else(|| auto_precision(self.step, self.value))
    }

    /// The soft span, if finite and non-degenerate.
    #[must_use]
    pub fn finite_soft_span(&self) -> Option<f64> {
        let span = self.soft_max - self.soft_min;
        (span.is_finite() && span > 0.0).then_some(span)
    }
}

/// Which channel a color element edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChannel {
    /// Hue; snaps per-turn rather than by step fraction.
    Hue,
    /// Saturation.
    Saturation,
    /// Value/brightness.
    Value,
    /// Alpha.
    Alpha,
}

/// Color element payload: a single 0..=1 channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorField {
    /// The channel being edited.
    pub channel: ColorChannel,
    /// Channel value in 0..=1.
    pub value: f64,
}

impl ColorField {
    /// Create a channel element, clamping into 0..=1.
    #[must_use]
    pub fn new(channel: ColorChannel, value: f64) -> Self {
        Self {
            channel,
            value: value.clamp(0.0, 1.0),
        }
    }

    /// View this channel as a number field for the drag engine.
    #[must_use]
    pub fn as_number(&self) -> NumberField {
        NumberField::new(self.value)
            .with_range(0.0, 1.0)
            .with_step(0.01)
            .with_precision(3)
    }
}

/// Text field payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    /// Current text value.
    pub value: String,
    /// Maximum length in graphemes, if bounded.
    pub max_len: Option<usize>,
}

impl TextField {
    /// Create a text payload.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            max_len: None,
        }
    }

    /// Bound the length in graphemes.
    #[must_use]
    pub fn with_max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }
}

/// Menu/dropdown payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuField {
    /// Entry labels, in display order.
    pub entries: Vec<String>,
    /// Index of the current entry.
    pub selected: usize,
}

impl MenuField {
    /// Create a menu with the given entries, selecting the first.
    #[must_use]
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries,
            selected: 0,
        }
    }

    /// Select an entry, ignoring out-of-range indices.
    pub fn select(&mut self, index: usize) {
        if index < self.entries.len() {
            self.selected = index;
        }
    }
}

/// Semantic widget kind with per-kind payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    /// On/off toggle.
    Toggle {
        /// Current state.
        value: bool,
    },
    /// Numeric slider or field.
    Number(NumberField),
    /// One channel of a color element.
    Color(ColorField),
    /// Single-line text field.
    Text(TextField),
    /// Dropdown that opens a popup when activated.
    Menu(MenuField),
    /// Activatable row in a view (list/tree); carries no value.
    ViewItem,
}

/// One interactive UI element.
pub struct Widget {
    /// Stable identity.
    pub id: WidgetId,
    /// Screen rectangle.
    pub rect: Rect,
    /// Human-readable name; used as the undo description.
    pub label: String,
    /// Bound property name; `None` keeps the value widget-local.
    pub prop: Option<String>,
    /// Kind and per-kind payload.
    pub kind: WidgetKind,
    /// Interaction capabilities.
    pub flags: WidgetFlags,
    /// Alignment group for multi-widget drag; `None` opts out.
    pub align_group: Option<u32>,
    /// Operator fired when a committed edit flushes.
    pub op: Option<Rc<dyn Operator>>,
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("rect", &self.rect)
            .field("label", &self.label)
            .field("prop", &self.prop)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("align_group", &self.align_group)
            .field("op", &self.op.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Widget {
    /// Create a widget with empty flags and no alignment group.
    #[must_use]
    pub fn new(id: WidgetId, rect: Rect, kind: WidgetKind) -> Self {
        Self {
            id,
            rect,
            label: String::new(),
            prop: None,
            kind,
            flags: WidgetFlags::empty(),
            align_group: None,
            op: None,
        }
    }

    /// Set the label (builder).
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Bind to a named property (builder).
    #[must_use]
    pub fn with_prop(mut self, prop: impl Into<String>) -> Self {
        self.prop = Some(prop.into());
        self
    }

    /// Set interaction flags (builder).
    #[must_use]
    pub fn with_flags(mut self, flags: WidgetFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Join an alignment group (builder).
    #[must_use]
    pub fn with_align_group(mut self, group: u32) -> Self {
        self.align_group = Some(group);
        self
    }

    /// Attach an operator (builder).
    #[must_use]
    pub fn with_operator(mut self, op: Rc<dyn Operator>) -> Self {
        self.op = Some(op);
        self
    }

    /// Hit test in screen cells.
    #[must_use]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        self.rect.contains(x, y)
    }

    /// Top row of the widget; alignment-group membership compares rows.
    #[must_use]
    pub fn row(&self) -> u16 {
        self.rect.y
    }

    /// Whether activation must be refused outright.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.flags.contains(WidgetFlags::DISABLED)
    }

    /// Whether horizontal drag edits the value.
    #[must_use]
    pub fn supports_drag(&self) -> bool {
        self.flags.contains(WidgetFlags::DRAG_VALUE)
            && matches!(self.kind, WidgetKind::Number(_) | WidgetKind::Color(_))
    }

    /// The numeric payload, for number and color widgets.
    #[must_use]
    pub fn number_view(&self) -> Option<NumberField> {
        match &self.kind {
            WidgetKind::Number(n) => Some(n.clone()),
            WidgetKind::Color(c) => Some(c.as_number()),
            _ => None,
        }
    }

    /// The current numeric value, for number and color widgets.
    #[must_use]
    pub fn numeric_value(&self) -> Option<f64> {
        match &self.kind {
            WidgetKind::Number(n) => Some(n.value),
            WidgetKind::Color(c) => Some(c.value),
            _ => None,
        }
    }

    /// Assign a numeric value, clamped per kind. No-op for other kinds.
    pub fn set_numeric_value(&mut self, value: f64) {
        match &mut self.kind {
            WidgetKind::Number(n) => n.set_value(value),
            WidgetKind::Color(c) => c.value = value.clamp(0.0, 1.0),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_from_step() {
        assert_eq!(auto_precision(1.0, 5.0), 0);
        assert_eq!(auto_precision(0.1, 5.0), 1);
        assert_eq!(auto_precision(0.01, 5.0), 2);
        assert_eq!(auto_precision(0.001, 5.0), 3);
    }

    #[test]
    fn precision_switch_lands_at_point_three() {
        // Just above the bound: no extra digit.
        assert_eq!(auto_precision(0.1, 0.31), 1);
        // Just below: one extra digit.
        assert_eq!(auto_precision(0.1, 0.29), 2);
        // Next decade down.
        assert_eq!(auto_precision(0.1, 0.029), 3);
    }

    #[test]
    fn precision_is_bounded() {
        assert_eq!(auto_precision(0.1, 1e-12), 6);
        assert_eq!(auto_precision(0.0, 5.0), 2); // degenerate step
    }

    #[test]
    fn precision_ignores_sign_and_zero() {
        assert_eq!(auto_precision(0.1, -0.29), 2);
        assert_eq!(auto_precision(0.1, 0.0), 1);
    }

    #[test]
    fn number_field_clamps_on_set() {
        let mut n = NumberField::new(0.5).with_range(0.0, 1.0);
        n.set_value(2.0);
        assert_eq!(n.value, 1.0);
        n.set_value(-3.0);
        assert_eq!(n.value, 0.0);
    }

    #[test]
    fn number_field_builder_clamps_initial() {
        let n = NumberField::new(10.0).with_hard_range(0.0, 1.0);
        assert_eq!(n.value, 1.0);
    }

    #[test]
    #[should_panic(expected = "hard range must be ordered")]
    fn inverted_hard_range_panics() {
        let _ = NumberField::new(0.0).with_hard_range(1.0, 0.0);
    }

    #[test]
    fn soft_span_detection() {
        let bounded = NumberField::new(0.0).with_soft_range(0.0, 10.0);
        assert_eq!(bounded.finite_soft_span(), Some(10.0));

        let unbounded = NumberField::new(0.0);
        assert!(unbounded.finite_soft_span().is_none());

        let degenerate = NumberField::new(0.0).with_soft_range(5.0, 5.0);
        assert!(degenerate.finite_soft_span().is_none());
    }

    #[test]
    fn display_precision_prefers_fixed() {
        let n = NumberField::new(0.001).with_step(0.1).with_precision(4);
        assert_eq!(n.display_precision(), 4);
    }

    #[test]
    fn color_field_clamps_and_views() {
        let c = ColorField::new(ColorChannel::Hue, 1.5);
        assert_eq!(c.value, 1.0);
        let n = c.as_number();
        assert_eq!((n.hard_min, n.hard_max), (0.0, 1.0));
        assert_eq!(n.step, 0.01);
    }

    #[test]
    fn menu_select_ignores_out_of_range() {
        let mut m = MenuField::new(vec!["a".into(), "b".into()]);
        m.select(1);
        assert_eq!(m.selected, 1);
        m.select(9);
        assert_eq!(m.selected, 1);
    }

    #[test]
    fn widget_hit_test_and_rows() {
        let w = Widget::new(
            WidgetId(1),
            Rect::new(2, 4, 10, 1),
            WidgetKind::Toggle { value: false },
        );
        assert!(w.contains(2, 4));
        assert!(!w.contains(2, 5));
        assert_eq!(w.row(), 4);
    }

    #[test]
    fn drag_support_requires_flag_and_kind() {
        let num = WidgetKind::Number(NumberField::new(0.0));
        let id = WidgetId(1);
        let rect = Rect::new(0, 0, 10, 1);

        let w = Widget::new(id, rect, num.clone()).with_flags(WidgetFlags::DRAG_VALUE);
        assert!(w.supports_drag());

        let w = Widget::new(id, rect, num);
        assert!(!w.supports_drag());

        let w = Widget::new(id, rect, WidgetKind::Toggle { value: true })
            .with_flags(WidgetFlags::DRAG_VALUE);
        assert!(!w.supports_drag());
    }

    #[test]
    fn numeric_value_accessors() {
        let mut w = Widget::new(
            WidgetId(1),
            Rect::new(0, 0, 10, 1),
            WidgetKind::Number(NumberField::new(0.5).with_range(0.0, 1.0)),
        );
        assert_eq!(w.numeric_value(), Some(0.5));
        w.set_numeric_value(7.0);
        assert_eq!(w.numeric_value(), Some(1.0));

        let mut t = Widget::new(
            WidgetId(2),
            Rect::new(0, 0, 10, 1),
            WidgetKind::Text(TextField::new("hi")),
        );
        t.set_numeric_value(1.0); // no-op
        assert_eq!(t.numeric_value(), None);
    }

    #[test]
    fn widget_debug_elides_operator() {
        let w = Widget::new(
            WidgetId(3),
            Rect::new(0, 0, 1, 1),
            WidgetKind::ViewItem,
        )
        .with_label("row");
        let dbg = format!("{w:?}");
        assert!(dbg.contains("Widget"));
        assert!(dbg.contains("row"));
    }
}
