#![forbid(unsafe_code)]

//! Widget activation state machine.
//!
//! At most one widget per region is active at a time; this module holds
//! the per-activation state ([`InteractionSession`]) and the legal state
//! graph ([`ButtonState`]). The region drives transitions; the session
//! enforces that they follow the graph.
//!
//! ```text
//!          hover                 press
//!  Init ────────► Highlight ──────────► WaitRelease ──apply──► WaitFlash
//!                    │                      │                     │
//!                    │ press (number)       └──────cancel──────►  │
//!                    ├────────► WaitDrag ──latch──► NumEditing    │
//!                    │              │click             │type      │
//!                    │ press (text) ▼                  ▼          ▼
//!                    ├────────► TextEditing ◄──────────┘         Exit
//!                    │ press (menu)                               ▲
//!                    └────────► MenuOpen ──select──► WaitFlash ───┘
//! ```
//!
//! # Invariants
//!
//! - `Exit` is terminal: the session is dropped, and a fresh hover starts
//!   a new one from `Init`.
//! - The pre-activation value is captured exactly once, at session start;
//!   cancel paths restore it no matter how many previews were applied.

use std::time::Instant;

use knurl_core::event::TimerId;
use knurl_core::geometry::Point;
use knurl_widgets::binding::PropValue;
use knurl_widgets::multi_drag::MultiDragState;
use knurl_widgets::text_edit::TextEditState;
use knurl_widgets::value_drag::DragEdit;
use knurl_widgets::widget::WidgetId;

/// Activation state of the active widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    /// No widget active.
    #[default]
    Init,
    /// Hovered; shows focus, no press held.
    Highlight,
    /// Pressed; waiting for release to apply (toggles, view items).
    WaitRelease,
    /// Applied; brief visual flash before teardown.
    WaitFlash,
    /// Inline text editing (text fields, or numbers entered by typing).
    TextEditing,
    /// Pointer is editing a numeric value.
    NumEditing,
    /// Popup open; waiting for a selection or dismissal.
    MenuOpen,
    /// Pressed on a draggable number; drag not yet latched.
    WaitDrag,
    /// Torn down; terminal.
    Exit,
}

impl ButtonState {
    /// Whether the state graph permits `from` → `to`.
    #[must_use]
    pub fn allows(from: ButtonState, to: ButtonState) -> bool {
        use ButtonState::*;
        matches!(
            (from, to),
            (Init, Highlight)
                | (Highlight, Init)
                | (Highlight, WaitRelease)
                | (Highlight, WaitDrag)
                | (Highlight, TextEditing)
                | (Highlight, NumEditing)
                | (Highlight, MenuOpen)
                | (Highlight, WaitFlash)
                | (Highlight, Exit)
                | (WaitRelease, WaitFlash)
                | (WaitRelease, Exit)
                | (WaitDrag, NumEditing)
                | (WaitDrag, TextEditing)
                | (WaitDrag, Exit)
                | (NumEditing, TextEditing)
                | (NumEditing, Exit)
                | (TextEditing, Exit)
                | (MenuOpen, WaitFlash)
                | (MenuOpen, Exit)
                | (WaitFlash, Exit)
        )
    }

    /// Whether a press is currently held in this state.
    #[must_use]
    pub fn press_held(self) -> bool {
        matches!(self, Self::WaitRelease | Self::WaitDrag | Self::NumEditing)
    }

    /// Whether keyboard input routes to an inline editor.
    #[must_use]
    pub fn wants_text_input(self) -> bool {
        self == Self::TextEditing
    }
}

/// State for one activation, from first press (or hover) to teardown.
#[derive(Debug)]
pub struct InteractionSession {
    /// The active widget.
    pub widget: WidgetId,
    state: ButtonState,
    /// Value before any preview was applied; restored on cancel.
    pub origin: PropValue,
    /// Where the activating press landed.
    pub press_origin: Point,
    /// When the session began.
    pub started_at: Instant,
    /// Live numeric drag, in `WaitDrag`/`NumEditing`.
    pub drag: Option<DragEdit>,
    /// Lockstep recruitment state; survives the switch into text editing.
    pub multi: Option<MultiDragState>,
    /// Inline editor, in `TextEditing`.
    pub text: Option<TextEditState>,
    /// Flash timer, in `WaitFlash`.
    pub flash_timer: Option<TimerId>,
    /// Set once a commit has been applied; cancel becomes a no-op.
    pub applied: bool,
}

impl InteractionSession {
    /// Start a session in `Highlight` for a hovered widget.
    #[must_use]
    pub fn highlight(widget: WidgetId, origin: PropValue, at: Point, now: Instant) -> Self {
        Self {
            widget,
            state: ButtonState::Highlight,
            origin,
            press_origin: at,
            started_at: now,
            drag: None,
            multi: None,
            text: None,
            flash_timer: None,
            applied: false,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Transition to `next`.
    ///
    /// Illegal transitions are refused, leaving the state unchanged; the
    /// caller treats `false` as a logic error.
    pub fn set_state(&mut self, next: ButtonState) -> bool {
        if !ButtonState::allows(self.state, next) {
            return false;
        }
        self.state = next;
        true
    }

    /// Whether this session has been torn down.
    #[must_use]
    pub fn is_exited(&self) -> bool {
        self.state == ButtonState::Exit
    }
}
