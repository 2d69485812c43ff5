#![forbid(unsafe_code)]

//! Semantic classification of raw mouse events.
//!
//! Maps press/release/motion sequences onto click, double-click, and
//! click-drag gestures. The classifier is purely a function of event
//! history plus the clock value passed in: it never touches widget state.
//!
//! # Rules
//!
//! - A press followed by a release within the drag-lock distance and inside
//!   the double-click window resolves as [`Semantic::Click`].
//! - Motion past the drag-lock distance latches the gesture as
//!   [`Semantic::ClickDrag`]; the eventual release is then a plain
//!   [`Semantic::Release`], never a click.
//! - Two presses of the same button within the double-click window and
//!   radius resolve as [`Semantic::DoubleClick`].
//! - Wheel events can't be held, so they are excluded from press/release
//!   semantics entirely.
//! - Keyboard events (including modifier-only transitions) are not fed to
//!   this type and can never produce click/drag.

use std::time::Instant;

use crate::config::InteractionConfig;
use crate::event::{MouseButton, MouseEvent, MouseEventKind};
use crate::geometry::{Point, vertical_dominance};

/// Semantic meaning assigned to one raw mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantic {
    /// Button went down; gesture not yet determined.
    Press(MouseButton),

    /// Second press of a double-click pair.
    DoubleClick(MouseButton),

    /// Button released after a drag or an expired hold.
    Release(MouseButton),

    /// Press and release within the drag-lock distance and click window.
    Click(MouseButton),

    /// Motion exceeded the drag-lock distance; emitted once, when the
    /// gesture latches.
    ClickDrag {
        /// The held button.
        button: MouseButton,
        /// Dominant axis of the travel at the moment of latching.
        direction: DragDirection,
    },

    /// Cursor motion (with or without a held button).
    Motion,

    /// Wheel scroll; never part of click/drag semantics.
    Wheel,
}

/// Dominant axis of a latched drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragDirection {
    /// Mostly sideways travel.
    Horizontal,
    /// Mostly up/down travel (within the configured dominance cone).
    Vertical,
}

#[derive(Debug, Clone, Copy)]
struct PressSnapshot {
    button: MouseButton,
    pos: Point,
    at: Instant,
}

/// Stateful gesture classifier.
///
/// Feed every mouse event through [`classify`](EventClassifier::classify);
/// the returned [`Semantic`] drives the activation controller.
#[derive(Debug)]
pub struct EventClassifier {
    config: InteractionConfig,

    /// The press currently held, if any.
    held: Option<PressSnapshot>,

    /// Most recent press, kept after release for double-click pairing.
    last_press: Option<PressSnapshot>,

    /// Set once the held press has travelled past the drag lock.
    drag_latched: bool,
}

impl EventClassifier {
    /// Create a classifier with the given tuning.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            held: None,
            last_press: None,
            drag_latched: false,
        }
    }

    /// Classify one raw mouse event.
    pub fn classify(&mut self, event: &MouseEvent, now: Instant) -> Semantic {
        if event.is_wheel() {
            return Semantic::Wheel;
        }

        let pos = event.point();
        match event.kind {
            MouseEventKind::Down(button) => self.on_down(button, pos, now),
            MouseEventKind::Up(button) => self.on_up(button, pos, now),
            MouseEventKind::Drag(button) => self.on_motion(Some(button), pos),
            MouseEventKind::Moved => self.on_motion(None, pos),
            // Wheel kinds handled above.
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => Semantic::Wheel,
        }
    }

    /// The press currently held, if any.
    #[must_use]
    pub fn held_button(&self) -> Option<MouseButton> {
        self.held.map(|p| p.button)
    }

    /// Whether the held press has latched into a drag.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag_latched
    }

    /// Drop all gesture history.
    pub fn reset(&mut self) {
        self.held = None;
        self.last_press = None;
        self.drag_latched = false;
    }

    fn on_down(&mut self, button: MouseButton, pos: Point, now: Instant) -> Semantic {
        let double = self.last_press.is_some_and(|prev| {
            prev.button == button
                && now.duration_since(prev.at) <= self.config.double_click_window
                && pos.chebyshev_distance(prev.pos) <= self.config.double_click_radius
        });

        let snapshot = PressSnapshot { button, pos, at: now };
        self.held = Some(snapshot);
        self.drag_latched = false;

        if double {
            // Consume the pair so a third press starts fresh.
            self.last_press = None;
            Semantic::DoubleClick(button)
        } else {
            self.last_press = Some(snapshot);
            Semantic::Press(button)
        }
    }

    fn on_up(&mut self, button: MouseButton, pos: Point, now: Instant) -> Semantic {
        let Some(press) = self.held else {
            // Release with no recorded press (e.g. press happened before
            // this classifier existed).
            return Semantic::Release(button);
        };
        if press.button != button {
            return Semantic::Release(button);
        }

        self.held = None;
        let was_drag = std::mem::replace(&mut self.drag_latched, false);

        let within_lock = pos.chebyshev_distance(press.pos) <= self.config.drag_threshold_cells;
        let within_window = now.duration_since(press.at) <= self.config.double_click_window;
        if !was_drag && within_lock && within_window {
            Semantic::Click(button)
        } else {
            Semantic::Release(button)
        }
    }

    fn on_motion(&mut self, button: Option<MouseButton>, pos: Point) -> Semantic {
        let Some(press) = self.held else {
            return Semantic::Motion;
        };
        if self.drag_latched {
            return Semantic::Motion;
        }

        let travelled = pos.chebyshev_distance(press.pos);
        if travelled > self.config.drag_threshold_cells {
            self.drag_latched = true;
            let delta = pos.delta(press.pos);
            let direction = if vertical_dominance(delta) >= self.config.vertical_dominance {
                DragDirection::Vertical
            } else {
                DragDirection::Horizontal
            };
            return Semantic::ClickDrag {
                button: button.unwrap_or(press.button),
                direction,
            };
        }
        Semantic::Motion
    }
}
