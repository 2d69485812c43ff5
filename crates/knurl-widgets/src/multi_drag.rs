#![forbid(unsafe_code)]

//! Multi-widget drag propagation.
//!
//! Dragging a numeric widget normally edits that widget alone. A clearly
//! vertical gesture at the start of the drag instead recruits the other
//! numeric widgets in the same alignment group, and the rest of the drag
//! edits all of them in lockstep.
//!
//! The decision is a small one-way state machine:
//!
//! ```text
//! Unset ──vertical gesture──► Setup ──horizontal resumes──► Enabled
//!   │                           │
//!   └──horizontal lock──────────┴──nothing flagged───────► Disabled
//! ```
//!
//! While in `Setup` the flagged set follows the cursor: every widget in
//! the group whose row lies between the press row and the current row is
//! a participant. Horizontal travel past the lock threshold freezes the
//! set and makes lockstep editing live.
//!
//! # Invariants
//!
//! - `Disabled` and `Enabled` are terminal for the session; a gesture is
//!   classified exactly once per press.
//! - Travel is measured from the press origin, not frame to frame, so a
//!   slow diagonal cannot flip the decision.

use knurl_core::config::InteractionConfig;
use knurl_core::geometry::{Point, vertical_dominance};

use crate::widget::{Widget, WidgetFlags, WidgetId};

/// Propagation decision for the current press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiDragInit {
    /// Gesture not yet classified.
    #[default]
    Unset,
    /// Vertical gesture seen; the flagged set follows the cursor row.
    Setup,
    /// Lockstep editing is live for the collected targets.
    Enabled,
    /// Single-widget drag for the rest of the session.
    Disabled,
}

/// A recruited widget and its value at recruitment time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiTarget {
    /// The recruited widget.
    pub id: WidgetId,
    /// Its value when it was flagged; deltas apply on top.
    pub start_value: f64,
}

/// Widgets eligible to be recruited alongside `primary`.
///
/// Eligibility: same alignment group, row within the `rows` span
/// (inclusive, either order), the lockstep flag, numeric, not disabled,
/// and not the primary itself.
pub fn collect_targets<'a>(
    primary: &Widget,
    rows: (i32, i32),
    all: impl Iterator<Item = &'a Widget>,
) -> Vec<MultiTarget> {
    let Some(group) = primary.align_group else {
        return Vec::new();
    };
    let span = rows.0.min(rows.1)..=rows.0.max(rows.1);
    all.filter(|w| {
        w.id != primary.id
            && w.align_group == Some(group)
            && span.contains(&i32::from(w.row()))
            && w.flags.contains(WidgetFlags::MULTI_DRAG)
            && !w.is_disabled()
    })
    .filter_map(|w| {
        w.numeric_value().map(|start_value| MultiTarget {
            id: w.id,
            start_value,
        })
    })
    .collect()
}

/// Per-press propagation state.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiDragState {
    init: MultiDragInit,
    origin: Point,
    targets: Vec<MultiTarget>,
}

impl MultiDragState {
    /// Start classifying a press that began at `origin`.
    #[must_use]
    pub fn new(origin: Point) -> Self {
        Self {
            init: MultiDragInit::Unset,
            origin,
            targets: Vec::new(),
        }
    }

    /// Current decision.
    #[must_use]
    pub fn init(&self) -> MultiDragInit {
        self.init
    }

    /// Whether lockstep editing is live.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.init == MultiDragInit::Enabled
    }

    /// Currently flagged targets.
    ///
    /// During `Setup` these track the cursor row; once `Enabled` the set
    /// is frozen for the rest of the session.
    #[must_use]
    pub fn targets(&self) -> &[MultiTarget] {
        &self.targets
    }

    /// Feed a pointer position while the decision is still open.
    ///
    /// Returns `true` while the machine is in (or just entered) `Setup`;
    /// the caller should then refresh the flagged set via [`Self::flag`].
    pub fn feed(&mut self, cursor: Point, cfg: &InteractionConfig) -> bool {
        let delta = cursor.delta(self.origin);
        let lock = i32::try_from(cfg.multi_drag_lock_x_cells).unwrap_or(i32::MAX);
        match self.init {
            MultiDragInit::Unset => {
                if delta.x.abs() > lock {
                    self.init = MultiDragInit::Disabled;
                    return false;
                }
                let vertical = i32::try_from(cfg.vertical_gesture_cells).unwrap_or(i32::MAX);
                if delta.y.abs() >= vertical
                    && vertical_dominance(delta) >= cfg.vertical_dominance
                {
                    self.init = MultiDragInit::Setup;
                    return true;
                }
                false
            }
            MultiDragInit::Setup => {
                if delta.x.abs() > lock {
                    // Horizontal travel resumes: the flagged set goes live.
                    self.init = if self.targets.is_empty() {
                        MultiDragInit::Disabled
                    } else {
                        MultiDragInit::Enabled
                    };
                    return false;
                }
                true
            }
            MultiDragInit::Enabled | MultiDragInit::Disabled => false,
        }
    }

    /// Replace the flagged set while in `Setup`; ignored otherwise.
    pub fn flag(&mut self, targets: Vec<MultiTarget>) {
        if self.init == MultiDragInit::Setup {
            self.targets = targets;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knurl_core::geometry::Rect;

    use crate::widget::{NumberField, WidgetKind};

    fn cfg() -> InteractionConfig {
        InteractionConfig::default()
    }

    fn numeric(id: u64, group: Option<u32>, value: f64) -> Widget {
        let mut w = Widget::new(
            WidgetId(id),
            Rect::new(0, id as u16, 10, 1),
            WidgetKind::Number(NumberField::new(value)),
        )
        .with_flags(WidgetFlags::MULTI_DRAG | WidgetFlags::DRAG_VALUE);
        w.align_group = group;
        w
    }

    fn target(id: u64) -> MultiTarget {
        MultiTarget {
            id: WidgetId(id),
            start_value: 1.0,
        }
    }

    #[test]
    fn vertical_gesture_reaches_setup() {
        let mut s = MultiDragState::new(Point::new(5, 5));
        assert!(!s.feed(Point::new(5, 6), &cfg())); // below gesture height
        assert!(s.feed(Point::new(5, 8), &cfg()));
        assert_eq!(s.init(), MultiDragInit::Setup);
        // Still collecting while the travel stays vertical.
        assert!(s.feed(Point::new(5, 10), &cfg()));
    }

    #[test]
    fn horizontal_travel_locks_out() {
        let mut s = MultiDragState::new(Point::new(5, 5));
        assert!(!s.feed(Point::new(9, 5), &cfg()));
        assert_eq!(s.init(), MultiDragInit::Disabled);
        // Terminal: a later vertical gesture changes nothing.
        assert!(!s.feed(Point::new(9, 20), &cfg()));
        assert_eq!(s.init(), MultiDragInit::Disabled);
    }

    #[test]
    fn shallow_diagonal_stays_unset() {
        let mut s = MultiDragState::new(Point::new(0, 0));
        // Two cells down, two across: dominance 2/sqrt(8) < 0.75, and x
        // is within the lock allowance.
        assert!(!s.feed(Point::new(2, 2), &cfg()));
        assert_eq!(s.init(), MultiDragInit::Unset);
    }

    #[test]
    fn travel_is_measured_from_origin() {
        let mut s = MultiDragState::new(Point::new(0, 0));
        // Creeping sideways one cell at a time still trips the lock.
        assert!(!s.feed(Point::new(1, 0), &cfg()));
        assert!(!s.feed(Point::new(2, 0), &cfg()));
        assert!(!s.feed(Point::new(3, 0), &cfg()));
        assert_eq!(s.init(), MultiDragInit::Disabled);
    }

    #[test]
    fn horizontal_resume_enables_flagged_set() {
        let mut s = MultiDragState::new(Point::new(0, 0));
        assert!(s.feed(Point::new(0, 4), &cfg()));
        s.flag(vec![target(2)]);
        assert!(!s.feed(Point::new(3, 4), &cfg()));
        assert!(s.is_enabled());
        assert_eq!(s.targets().len(), 1);
    }

    #[test]
    fn horizontal_resume_with_nothing_flagged_disables() {
        let mut s = MultiDragState::new(Point::new(0, 0));
        s.feed(Point::new(0, 4), &cfg());
        assert!(!s.feed(Point::new(3, 4), &cfg()));
        assert_eq!(s.init(), MultiDragInit::Disabled);
    }

    #[test]
    fn flag_requires_setup() {
        let mut s = MultiDragState::new(Point::new(0, 0));
        s.flag(vec![target(2)]);
        assert_eq!(s.init(), MultiDragInit::Unset);
        assert!(s.targets().is_empty());
    }

    #[test]
    fn flagged_set_is_frozen_once_enabled() {
        let mut s = MultiDragState::new(Point::new(0, 0));
        s.feed(Point::new(0, 4), &cfg());
        s.flag(vec![target(2)]);
        s.feed(Point::new(3, 4), &cfg());
        s.flag(vec![target(2), target(3)]);
        assert_eq!(s.targets().len(), 1);
    }

    #[test]
    fn collect_targets_filters_group_and_flags() {
        let primary = numeric(1, Some(7), 0.0);
        let same_group = numeric(2, Some(7), 1.5);
        let other_group = numeric(3, Some(8), 2.0);
        let ungrouped = numeric(4, None, 3.0);
        let mut disabled = numeric(5, Some(7), 4.0);
        disabled.flags |= WidgetFlags::DISABLED;
        let mut no_flag = numeric(6, Some(7), 5.0);
        no_flag.flags.remove(WidgetFlags::MULTI_DRAG);

        let all = [&primary, &same_group, &other_group, &ungrouped, &disabled, &no_flag];
        let targets = collect_targets(&primary, (0, 10), all.into_iter());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, WidgetId(2));
        assert_eq!(targets[0].start_value, 1.5);
    }

    #[test]
    fn rows_outside_the_span_are_skipped() {
        let primary = numeric(1, Some(7), 0.0);
        let near = numeric(2, Some(7), 1.0); // row 2
        let far = numeric(5, Some(7), 2.0); // row 5
        let all = [&primary, &near, &far];

        let targets = collect_targets(&primary, (1, 3), all.into_iter());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, WidgetId(2));

        // The span works in either drag direction.
        let targets = collect_targets(&primary, (5, 1), all.into_iter());
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn ungrouped_primary_recruits_nothing() {
        let primary = numeric(1, None, 0.0);
        let other = numeric(2, None, 1.0);
        assert!(collect_targets(&primary, (0, 10), [&other].into_iter()).is_empty());
    }

    #[test]
    fn non_numeric_widgets_are_skipped() {
        let primary = numeric(1, Some(7), 0.0);
        let mut toggle = Widget::new(
            WidgetId(2),
            Rect::new(0, 1, 10, 1),
            WidgetKind::Toggle { value: true },
        )
        .with_flags(WidgetFlags::MULTI_DRAG);
        toggle.align_group = Some(7);
        assert!(collect_targets(&primary, (0, 10), [&toggle].into_iter()).is_empty());
    }
}
