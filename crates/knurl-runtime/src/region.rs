#![forbid(unsafe_code)]

//! Region: widget container and event dispatcher.
//!
//! A [`Region`] owns a flat list of widgets, the gesture classifier, the
//! single active [`InteractionSession`], the deferred action queue, and
//! the undo journal. The embedder feeds it events plus a clock value and
//! drains [`UiSignal`]s; timers come back to the region as
//! [`Event::Timer`] when they fire.
//!
//! # Design Notes
//!
//! - Value previews during a drag write the widget only. The binding is
//!   written once, at commit, and operators plus `notify_update` run even
//!   later, from [`Region::flush_deferred`].
//! - Popup contents are the embedder's to render and hit-test; the region
//!   tracks only that a menu is open and which widget owns it. Selection
//!   arrives via [`Region::close_menu`].
//!
//! # Failure Modes
//!
//! - Activation is refused as a silent no-op for disabled widgets,
//!   read-only bound properties, and operators that decline the poll;
//!   the widget stays highlighted.
//! - A binding write that fails (unknown property, type mismatch) cancels
//!   the commit; the widget is restored to its pre-activation value.
//! - Escape or a right mouse press cancels any in-flight interaction,
//!   mid-drag included, restoring every touched value.

use std::time::{Duration, Instant};

use knurl_core::classifier::{EventClassifier, Semantic};
use knurl_core::config::InteractionConfig;
use knurl_core::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind,
    TimerId,
};
use knurl_core::geometry::Point;
use knurl_widgets::binding::{OpContext, OpResult, PropValue, PropertyBinding};
use knurl_widgets::multi_drag::{MultiDragState, MultiTarget, collect_targets};
use knurl_widgets::text_edit::{EditOutcome, TextEditState};
use knurl_widgets::value_drag::{DragEdit, step_value};
use knurl_widgets::widget::{
    ColorChannel, NumberField, Widget, WidgetFlags, WidgetId, WidgetKind,
};

use crate::after_queue::{AfterAction, AfterQueue};
use crate::controller::{ButtonState, InteractionSession};
use crate::undo::UndoJournal;

/// Outward-facing effect of handling one event.
#[derive(Debug, Clone, PartialEq)]
pub enum UiSignal {
    /// Something visible changed.
    Redraw,
    /// A numeric preview or commit changed a widget's value.
    ValueChanged {
        /// The edited widget.
        id: WidgetId,
        /// Its new value.
        value: f64,
    },
    /// An edit was committed; deferred actions are queued.
    Committed {
        /// The committed widget.
        id: WidgetId,
    },
    /// An activation ended without applying anything.
    Cancelled {
        /// The cancelled widget.
        id: WidgetId,
    },
    /// A menu widget's popup should open.
    MenuOpened {
        /// The owning widget.
        id: WidgetId,
    },
    /// The open popup should close.
    MenuClosed {
        /// The owning widget.
        id: WidgetId,
        /// Chosen entry, if any.
        selected: Option<usize>,
    },
    /// The embedder should deliver [`Event::Timer`] after the delay.
    TimerRequest {
        /// Token to echo back.
        id: TimerId,
        /// Delay before delivery.
        after: Duration,
    },
    /// A previously requested timer is no longer wanted.
    TimerCancel {
        /// The stale token.
        id: TimerId,
    },
}

/// Widget container plus all per-region interaction state.
#[derive(Debug)]
pub struct Region<B: PropertyBinding> {
    cfg: InteractionConfig,
    widgets: Vec<Widget>,
    binding: B,
    classifier: EventClassifier,
    session: Option<InteractionSession>,
    queue: AfterQueue,
    undo: UndoJournal,
    next_timer: u64,
    /// Pending sibling-menu auto-open: (timer, menu widget to open).
    dwell: Option<(TimerId, WidgetId)>,
    pointer: Point,
    modifiers: Modifiers,
}

impl<B: PropertyBinding> Region<B> {
    /// Create an empty region over a binding.
    #[must_use]
    pub fn new(binding: B, cfg: InteractionConfig) -> Self {
        Self {
            classifier: EventClassifier::new(cfg.clone()),
            cfg,
            widgets: Vec::new(),
            binding,
            session: None,
            queue: AfterQueue::new(),
            undo: UndoJournal::default(),
            next_timer: 0,
            dwell: None,
            pointer: Point::new(0, 0),
            modifiers: Modifiers::NONE,
        }
    }

    /// Add a widget (builder).
    #[must_use]
    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self
    }

    /// Look up a widget.
    #[must_use]
    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    /// The binding.
    #[must_use]
    pub fn binding(&self) -> &B {
        &self.binding
    }

    /// The undo journal.
    #[must_use]
    pub fn undo(&self) -> &UndoJournal {
        &self.undo
    }

    /// State of the active widget, if any.
    #[must_use]
    pub fn active_state(&self) -> Option<ButtonState> {
        self.session.as_ref().map(InteractionSession::state)
    }

    /// The active widget, if any.
    #[must_use]
    pub fn active_widget(&self) -> Option<WidgetId> {
        self.session.as_ref().map(|s| s.widget)
    }

    /// Pending deferred actions.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.queue.len()
    }

    /// Feed one event.
    pub fn handle_event(&mut self, event: &Event, now: Instant) -> Vec<UiSignal> {
        let mut out = Vec::new();
        match event {
            Event::Mouse(m) => self.on_mouse(*m, now, &mut out),
            Event::Key(k) => self.on_key(*k, now, &mut out),
            Event::Timer(t) => self.on_timer(t.id, now, &mut out),
            Event::Resize { .. } | Event::Focus(_) | Event::Tick => {}
        }
        out
    }

    /// Run everything queued since the last flush.
    ///
    /// Returns the number of actions run. Call once per frame, after
    /// event dispatch has unwound.
    pub fn flush_deferred(&mut self) -> usize {
        let batch = self.queue.drain();
        let count = batch.len();
        for action in batch {
            let result = action.run();
            if result == OpResult::Finished
                && let Some(label) = action.undo
            {
                self.undo.push(label);
            }
            if let Some(prop) = action.notify {
                self.binding.notify_update(&prop);
            }
        }
        count
    }

    /// Close the open menu, applying `selected` if given.
    pub fn close_menu(&mut self, selected: Option<usize>) -> Vec<UiSignal> {
        let mut out = Vec::new();
        let Some(session) = self.session.as_mut() else {
            return out;
        };
        if session.state() != ButtonState::MenuOpen {
            return out;
        }
        let id = session.widget;
        self.cancel_dwell(&mut out);

        match selected {
            Some(index) => {
                let valid = self.update_widget(id, |w| {
                    if let WidgetKind::Menu(menu) = &mut w.kind {
                        if index < menu.entries.len() {
                            menu.select(index);
                            return true;
                        }
                    }
                    false
                });
                let stored = valid && self.write_binding(id, PropValue::Index(index));
                out.push(UiSignal::MenuClosed {
                    id,
                    selected: stored.then_some(index),
                });
                if stored {
                    self.enqueue_commit(id);
                    if let Some(session) = self.session.as_mut() {
                        session.applied = true;
                    }
                    self.begin_flash(&mut out);
                } else {
                    if valid {
                        // The selection was applied to the widget; undo it.
                        self.restore_origin();
                    }
                    self.teardown(&mut out, None);
                }
            }
            None => {
                out.push(UiSignal::MenuClosed { id, selected: None });
                self.teardown(&mut out, Some(id));
            }
        }
        out
    }

    // ---- internal: lookups and small helpers ----------------------------

    fn hit(&self, p: Point) -> Option<WidgetId> {
        let (x, y) = (u16::try_from(p.x).ok()?, u16::try_from(p.y).ok()?);
        self.widgets.iter().find(|w| w.contains(x, y)).map(|w| w.id)
    }

    /// Whether activating `id` is allowed right now.
    ///
    /// Refused for disabled widgets, read-only bound properties, and
    /// operators that decline the current context. Refusal is a silent
    /// no-op; the widget stays highlighted.
    fn activation_permitted(&self, id: WidgetId) -> bool {
        let Some(widget) = self.widget(id) else {
            return false;
        };
        if widget.is_disabled() {
            return false;
        }
        if let Some(prop) = widget.prop.as_deref()
            && !self.binding.editable(prop)
        {
            return false;
        }
        if let Some(op) = widget.op.as_ref()
            && !op.poll(&OpContext::new(self.pointer, self.modifiers))
        {
            return false;
        }
        true
    }

    fn update_widget<R>(&mut self, id: WidgetId, f: impl FnOnce(&mut Widget) -> R) -> R
    where
        R: Default,
    {
        self.widgets
            .iter_mut()
            .find(|w| w.id == id)
            .map(f)
            .unwrap_or_default()
    }

    fn prop_snapshot(&self, id: WidgetId) -> PropValue {
        match self.widget(id).map(|w| &w.kind) {
            Some(WidgetKind::Toggle { value }) => PropValue::Bool(*value),
            Some(WidgetKind::Number(n)) => PropValue::Float(n.value),
            Some(WidgetKind::Color(c)) => PropValue::Float(c.value),
            Some(WidgetKind::Text(t)) => PropValue::Text(t.value.clone()),
            Some(WidgetKind::Menu(m)) => PropValue::Index(m.selected),
            Some(WidgetKind::ViewItem) | None => PropValue::Bool(false),
        }
    }

    fn alloc_timer(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }

    fn write_binding(&mut self, id: WidgetId, value: PropValue) -> bool {
        let Some(prop) = self.widget(id).and_then(|w| w.prop.clone()) else {
            // Unbound widgets keep their value locally; nothing to write.
            return true;
        };
        match self.binding.set(&prop, value) {
            Ok(()) => true,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(?id, prop = %prop, error = %_err, "binding write refused");
                false
            }
        }
    }

    fn enqueue_commit(&mut self, id: WidgetId) {
        let Some(w) = self.widget(id) else { return };
        let undo = (w.flags.contains(WidgetFlags::UNDO) && !w.label.is_empty())
            .then(|| w.label.clone());
        self.queue.push(AfterAction {
            op: w.op.clone(),
            ctx: OpContext::new(self.pointer, self.modifiers),
            undo,
            notify: w.prop.clone(),
        });
    }

    fn enqueue_notify(&mut self, id: WidgetId) {
        let Some(prop) = self.widget(id).and_then(|w| w.prop.clone()) else {
            return;
        };
        self.queue.push(AfterAction {
            op: None,
            ctx: OpContext::new(self.pointer, self.modifiers),
            undo: None,
            notify: Some(prop),
        });
    }

    fn cancel_dwell(&mut self, out: &mut Vec<UiSignal>) {
        if let Some((timer, _)) = self.dwell.take() {
            out.push(UiSignal::TimerCancel { id: timer });
        }
    }

    /// Drop the session. `rehighlight` re-enters `Highlight` if the
    /// pointer is still over that widget.
    fn teardown(&mut self, out: &mut Vec<UiSignal>, rehighlight: Option<WidgetId>) {
        if let Some(session) = self.session.as_mut() {
            session.set_state(ButtonState::Exit);
        }
        self.session = None;
        if let Some(id) = rehighlight
            && self.hit(self.pointer) == Some(id)
        {
            let origin = self.prop_snapshot(id);
            self.session = Some(InteractionSession::highlight(
                id,
                origin,
                self.pointer,
                Instant::now(),
            ));
        }
        out.push(UiSignal::Redraw);
    }

    fn restore_origin(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.widget;
        let origin = session.origin.clone();
        // Flagged targets only changed once enabled; restoring the rest
        // of the set writes back the values they already hold.
        let targets: Vec<MultiTarget> = session
            .multi
            .as_ref()
            .map(|m| m.targets().to_vec())
            .unwrap_or_default();

        match origin {
            PropValue::Float(v) => self.update_widget(id, |w| w.set_numeric_value(v)),
            PropValue::Text(s) => self.update_widget(id, |w| {
                if let WidgetKind::Text(t) = &mut w.kind {
                    t.value = s;
                }
            }),
            PropValue::Bool(v) => self.update_widget(id, |w| {
                if let WidgetKind::Toggle { value } = &mut w.kind {
                    *value = v;
                }
            }),
            PropValue::Index(i) => self.update_widget(id, |w| {
                if let WidgetKind::Menu(menu) = &mut w.kind {
                    menu.select(i);
                }
            }),
        }
        for t in targets {
            self.update_widget(t.id, |w| w.set_numeric_value(t.start_value));
        }
    }

    fn cancel_session(&mut self, out: &mut Vec<UiSignal>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.widget;
        if !session.applied {
            self.restore_origin();
        }
        out.push(UiSignal::Cancelled { id });
        self.teardown(out, Some(id));
    }

    fn begin_flash(&mut self, out: &mut Vec<UiSignal>) {
        let timer = self.alloc_timer();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.set_state(ButtonState::WaitFlash) {
            session.flash_timer = Some(timer);
            out.push(UiSignal::TimerRequest {
                id: timer,
                after: self.cfg.flash_duration,
            });
            out.push(UiSignal::Redraw);
        }
    }

    fn format_number(field: &NumberField) -> String {
        format!(
            "{:.prec$}",
            field.value,
            prec = field.display_precision() as usize
        )
    }

    // ---- internal: mouse dispatch ---------------------------------------

    fn on_mouse(&mut self, m: MouseEvent, now: Instant, out: &mut Vec<UiSignal>) {
        self.pointer = m.point();
        self.modifiers = m.modifiers;
        let semantic = self.classifier.classify(&m, now);

        // A right press cancels whatever is in flight, mid-drag included.
        if let Semantic::Press(MouseButton::Right)
        | Semantic::DoubleClick(MouseButton::Right) = semantic
        {
            match self.active_state() {
                Some(ButtonState::MenuOpen) => {
                    let closed = self.close_menu(None);
                    out.extend(closed);
                }
                Some(
                    ButtonState::WaitRelease
                    | ButtonState::WaitDrag
                    | ButtonState::NumEditing
                    | ButtonState::TextEditing,
                ) => self.cancel_session(out),
                _ => {}
            }
            return;
        }

        match self.active_state() {
            None | Some(ButtonState::Highlight) => self.on_idle_mouse(semantic, m, now, out),
            Some(ButtonState::WaitRelease) => self.on_wait_release(semantic, out),
            Some(ButtonState::WaitDrag) => self.on_wait_drag(semantic, out),
            Some(ButtonState::NumEditing) => self.on_num_editing(semantic, out),
            Some(ButtonState::TextEditing) => self.on_text_mouse(semantic, out),
            Some(ButtonState::MenuOpen) => self.on_menu_mouse(semantic, now, out),
            Some(ButtonState::WaitFlash | ButtonState::Exit | ButtonState::Init) => {}
        }
    }

    fn on_idle_mouse(
        &mut self,
        semantic: Semantic,
        m: MouseEvent,
        now: Instant,
        out: &mut Vec<UiSignal>,
    ) {
        match semantic {
            Semantic::Motion => self.update_hover(now, out),
            Semantic::Press(MouseButton::Left) | Semantic::DoubleClick(MouseButton::Left) => {
                self.activate_press(now, out);
            }
            Semantic::Wheel => {
                let steps = match m.kind {
                    MouseEventKind::ScrollUp => 1,
                    MouseEventKind::ScrollDown => -1,
                    _ => return,
                };
                self.wheel_edit(steps, out);
            }
            _ => {}
        }
    }

    fn update_hover(&mut self, now: Instant, out: &mut Vec<UiSignal>) {
        let target = self.hit(self.pointer);
        let current = self
            .session
            .as_ref()
            .filter(|s| s.state() == ButtonState::Highlight)
            .map(|s| s.widget);
        if target == current {
            return;
        }
        self.session = target.map(|id| {
            InteractionSession::highlight(id, self.prop_snapshot(id), self.pointer, now)
        });
        out.push(UiSignal::Redraw);
    }

    fn activate_press(&mut self, now: Instant, out: &mut Vec<UiSignal>) {
        let Some(id) = self.hit(self.pointer) else {
            if self.session.take().is_some() {
                out.push(UiSignal::Redraw);
            }
            return;
        };
        if !self.activation_permitted(id) {
            return;
        }
        if self.active_widget() != Some(id) {
            let origin = self.prop_snapshot(id);
            self.session = Some(InteractionSession::highlight(id, origin, self.pointer, now));
        }
        let press = self.pointer;
        if let Some(session) = self.session.as_mut() {
            session.press_origin = press;
        }
        self.begin_activation(id, out);
    }

    fn begin_activation(&mut self, id: WidgetId, out: &mut Vec<UiSignal>) {
        let Some(widget) = self.widget(id) else { return };
        #[cfg(feature = "tracing")]
        tracing::debug!(?id, kind = ?std::mem::discriminant(&widget.kind), "activate");

        match &widget.kind {
            WidgetKind::Toggle { .. } | WidgetKind::ViewItem => {
                if let Some(session) = self.session.as_mut() {
                    session.set_state(ButtonState::WaitRelease);
                }
            }
            WidgetKind::Number(_) | WidgetKind::Color(_) if widget.supports_drag() => {
                let multi = (widget.flags.contains(WidgetFlags::MULTI_DRAG)
                    && widget.align_group.is_some())
                .then(|| MultiDragState::new(self.pointer));
                if let Some(session) = self.session.as_mut() {
                    session.multi = multi;
                    session.set_state(ButtonState::WaitDrag);
                }
            }
            WidgetKind::Number(_) | WidgetKind::Color(_) => {
                self.start_number_text_edit(id, out);
            }
            WidgetKind::Text(t) => {
                let edit = TextEditState::new(
                    t.value.clone(),
                    t.max_len,
                    self.cfg.text_undo_depth,
                );
                if let Some(session) = self.session.as_mut()
                    && session.set_state(ButtonState::TextEditing)
                {
                    session.text = Some(edit);
                    out.push(UiSignal::Redraw);
                }
            }
            WidgetKind::Menu(_) => {
                if let Some(session) = self.session.as_mut()
                    && session.set_state(ButtonState::MenuOpen)
                {
                    out.push(UiSignal::MenuOpened { id });
                }
            }
        }
    }

    fn start_number_text_edit(&mut self, id: WidgetId, out: &mut Vec<UiSignal>) {
        let Some(field) = self.widget(id).and_then(Widget::number_view) else {
            return;
        };
        let edit = TextEditState::new(
            Self::format_number(&field),
            None,
            self.cfg.text_undo_depth,
        );
        if let Some(session) = self.session.as_mut()
            && session.set_state(ButtonState::TextEditing)
        {
            session.text = Some(edit);
            out.push(UiSignal::Redraw);
        }
    }

    fn wheel_edit(&mut self, steps: i32, out: &mut Vec<UiSignal>) {
        let Some(id) = self.hit(self.pointer) else { return };
        if !self.activation_permitted(id) {
            return;
        }
        let Some(field) = self.widget(id).and_then(Widget::number_view) else {
            return;
        };
        let value = step_value(&field, steps, self.modifiers, &self.cfg);
        if value == field.value {
            return;
        }
        // Write before touching the widget: a refused step leaves no trace.
        if !self.write_binding(id, PropValue::Float(value)) {
            return;
        }
        self.update_widget(id, |w| w.set_numeric_value(value));
        self.enqueue_commit(id);
        out.push(UiSignal::ValueChanged { id, value });
        out.push(UiSignal::Committed { id });
    }

    fn on_wait_release(&mut self, semantic: Semantic, out: &mut Vec<UiSignal>) {
        match semantic {
            Semantic::Click(MouseButton::Left) | Semantic::Release(MouseButton::Left) => {
                let Some(session) = self.session.as_ref() else {
                    return;
                };
                let id = session.widget;
                if self.hit(self.pointer) == Some(id) {
                    self.apply_instant(id, out);
                } else {
                    self.cancel_session(out);
                }
            }
            _ => {}
        }
    }

    /// Apply a toggle or view-item activation and flash.
    fn apply_instant(&mut self, id: WidgetId, out: &mut Vec<UiSignal>) {
        let toggled = self.update_widget(id, |w| {
            if let WidgetKind::Toggle { value } = &mut w.kind {
                *value = !*value;
                Some(*value)
            } else {
                None
            }
        });
        if let Some(new_value) = toggled {
            self.write_binding(id, PropValue::Bool(new_value));
        }
        self.enqueue_commit(id);
        if let Some(session) = self.session.as_mut() {
            session.applied = true;
        }
        out.push(UiSignal::Committed { id });
        self.begin_flash(out);
    }

    fn on_wait_drag(&mut self, semantic: Semantic, out: &mut Vec<UiSignal>) {
        match semantic {
            Semantic::Motion => self.feed_multi(),
            Semantic::ClickDrag { .. } => {
                self.feed_multi();
                self.latch_drag(out);
            }
            Semantic::Click(MouseButton::Left) => {
                // Press and release without travel: edit by typing.
                let Some(session) = self.session.as_ref() else {
                    return;
                };
                let id = session.widget;
                self.start_number_text_edit(id, out);
            }
            Semantic::Release(MouseButton::Left) => self.cancel_session(out),
            _ => {}
        }
    }

    fn feed_multi(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(multi) = session.multi.as_mut() else {
            return;
        };
        if multi.feed(self.pointer, &self.cfg) {
            let rows = (session.press_origin.y, self.pointer.y);
            let targets = self
                .widgets
                .iter()
                .find(|w| w.id == session.widget)
                .map(|primary| collect_targets(primary, rows, self.widgets.iter()))
                .unwrap_or_default();
            multi.flag(targets);
        }
    }

    fn latch_drag(&mut self, out: &mut Vec<UiSignal>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.widget;
        let press = session.press_origin;
        let Some(widget) = self.widget(id) else { return };
        let Some(field) = widget.number_view() else { return };
        let hue = matches!(
            &widget.kind,
            WidgetKind::Color(c) if c.channel == ColorChannel::Hue
        );
        let drag = if hue {
            DragEdit::begin_hue(press, &field, &self.cfg)
        } else {
            DragEdit::begin(press, &field, &self.cfg)
        };
        if let Some(session) = self.session.as_mut()
            && session.set_state(ButtonState::NumEditing)
        {
            session.drag = Some(drag);
        }
        self.num_motion(out);
    }

    fn on_num_editing(&mut self, semantic: Semantic, out: &mut Vec<UiSignal>) {
        match semantic {
            Semantic::Motion => {
                self.feed_multi();
                self.num_motion(out);
            }
            Semantic::Release(MouseButton::Left) | Semantic::Click(MouseButton::Left) => {
                self.commit_drag(out);
            }
            _ => {}
        }
    }

    fn num_motion(&mut self, out: &mut Vec<UiSignal>) {
        let pointer = self.pointer;
        let modifiers = self.modifiers;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let id = session.widget;
        let Some(field) = self
            .widgets
            .iter()
            .find(|w| w.id == id)
            .and_then(Widget::number_view)
        else {
            return;
        };
        let Some(drag) = session.drag.as_mut() else {
            return;
        };
        let value = drag.update(pointer, modifiers, &field, &self.cfg);
        let delta = drag.applied_delta(&field);
        let targets: Vec<MultiTarget> = session
            .multi
            .as_ref()
            .filter(|m| m.is_enabled())
            .map(|m| m.targets().to_vec())
            .unwrap_or_default();

        self.update_widget(id, |w| w.set_numeric_value(value));
        for t in &targets {
            self.update_widget(t.id, |w| w.set_numeric_value(t.start_value + delta));
        }
        out.push(UiSignal::ValueChanged { id, value });
    }

    fn commit_drag(&mut self, out: &mut Vec<UiSignal>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let id = session.widget;
        let targets: Vec<MultiTarget> = session
            .multi
            .as_ref()
            .filter(|m| m.is_enabled())
            .map(|m| m.targets().to_vec())
            .unwrap_or_default();

        if let Some(value) = self.widget(id).and_then(Widget::numeric_value)
            && !self.write_binding(id, PropValue::Float(value))
        {
            self.restore_origin();
            out.push(UiSignal::Cancelled { id });
            self.teardown(out, Some(id));
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.applied = true;
        }
        self.enqueue_commit(id);
        for t in &targets {
            if let Some(value) = self.widget(t.id).and_then(Widget::numeric_value) {
                self.write_binding(t.id, PropValue::Float(value));
            }
            self.enqueue_notify(t.id);
        }
        out.push(UiSignal::Committed { id });
        self.teardown(out, Some(id));
    }

    fn on_text_mouse(&mut self, semantic: Semantic, out: &mut Vec<UiSignal>) {
        if let Semantic::Press(MouseButton::Left) | Semantic::DoubleClick(MouseButton::Left) =
            semantic
        {
            let Some(session) = self.session.as_ref() else {
                return;
            };
            if self.hit(self.pointer) != Some(session.widget) {
                // Clicking away commits, as Enter would.
                self.commit_text(out);
            }
        }
    }

    fn on_menu_mouse(&mut self, semantic: Semantic, now: Instant, out: &mut Vec<UiSignal>) {
        let _ = now;
        match semantic {
            // The opening press may still be held, so travel can latch as
            // a click-drag; for dwell purposes it is just hover motion.
            Semantic::Motion | Semantic::ClickDrag { .. } => {
                let Some(session) = self.session.as_ref() else {
                    return;
                };
                let own = session.widget;
                let hovered = self.hit(self.pointer).filter(|&hid| {
                    hid != own
                        && self.widget(hid).is_some_and(|w| {
                            matches!(w.kind, WidgetKind::Menu(_)) && !w.is_disabled()
                        })
                });
                match hovered {
                    Some(hid) => {
                        if self.dwell.map(|(_, target)| target) != Some(hid) {
                            self.cancel_dwell(out);
                            let timer = self.alloc_timer();
                            self.dwell = Some((timer, hid));
                            out.push(UiSignal::TimerRequest {
                                id: timer,
                                after: self.cfg.auto_open_dwell,
                            });
                        }
                    }
                    None => self.cancel_dwell(out),
                }
            }
            Semantic::Press(MouseButton::Left) | Semantic::DoubleClick(MouseButton::Left) => {
                // Pressing the button again, or anywhere outside the popup's
                // owner, dismisses without selecting.
                let closed = self.close_menu(None);
                out.extend(closed);
            }
            _ => {}
        }
    }

    // ---- internal: keys and timers --------------------------------------

    fn on_key(&mut self, key: KeyEvent, now: Instant, out: &mut Vec<UiSignal>) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match self.active_state() {
            Some(ButtonState::TextEditing) => self.text_key(key, out),
            Some(ButtonState::NumEditing) => match key.code {
                KeyCode::Escape => self.cancel_session(out),
                KeyCode::Char(c) if is_numeric_seed(c) && !key.ctrl() => {
                    self.switch_to_seeded_text(c, out);
                }
                _ => {}
            },
            Some(ButtonState::WaitDrag | ButtonState::WaitRelease) => {
                if key.code == KeyCode::Escape {
                    self.cancel_session(out);
                }
            }
            Some(ButtonState::MenuOpen) => {
                if key.code == KeyCode::Escape {
                    let closed = self.close_menu(None);
                    out.extend(closed);
                }
            }
            Some(ButtonState::Highlight) => match key.code {
                KeyCode::Enter => self.activate_by_key(now, out),
                KeyCode::Escape => {
                    self.session = None;
                    out.push(UiSignal::Redraw);
                }
                _ => {}
            },
            _ => {}
        }
    }

    /// Enter on a highlighted widget behaves as a click on its center.
    fn activate_by_key(&mut self, now: Instant, out: &mut Vec<UiSignal>) {
        let _ = now;
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.widget;
        if !self.activation_permitted(id) {
            return;
        }
        let Some(widget) = self.widget(id) else { return };
        let center = widget.rect.center();
        if let Some(session) = self.session.as_mut() {
            session.press_origin = center;
        }
        match self.widget(id).map(|w| &w.kind) {
            Some(WidgetKind::Toggle { .. } | WidgetKind::ViewItem) => {
                self.apply_instant(id, out);
            }
            Some(WidgetKind::Number(_) | WidgetKind::Color(_)) => {
                self.start_number_text_edit(id, out);
            }
            Some(WidgetKind::Text(_) | WidgetKind::Menu(_)) => {
                self.begin_activation(id, out);
            }
            _ => {}
        }
    }

    fn switch_to_seeded_text(&mut self, c: char, out: &mut Vec<UiSignal>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.widget;
        let PropValue::Float(origin) = session.origin else {
            return;
        };
        let Some(mut field) = self.widget(id).and_then(Widget::number_view) else {
            return;
        };
        field.value = origin;
        let edit = TextEditState::seeded(
            Self::format_number(&field),
            c,
            self.cfg.text_undo_depth,
        );
        if let Some(session) = self.session.as_mut()
            && session.set_state(ButtonState::TextEditing)
        {
            session.drag = None;
            session.text = Some(edit);
            out.push(UiSignal::Redraw);
        }
    }

    fn text_key(&mut self, key: KeyEvent, out: &mut Vec<UiSignal>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(text) = session.text.as_mut() else {
            return;
        };
        match text.handle_key(&key) {
            EditOutcome::Changed => out.push(UiSignal::Redraw),
            EditOutcome::Unchanged => {}
            EditOutcome::Commit => self.commit_text(out),
            EditOutcome::Cancel => self.cancel_session(out),
        }
    }

    fn commit_text(&mut self, out: &mut Vec<UiSignal>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.widget;
        let Some(entered) = session.text.as_ref().map(|t| t.text().to_owned()) else {
            return;
        };
        // Copy mode reaches every flagged widget, whether or not the
        // gesture ever went horizontal.
        let targets: Vec<MultiTarget> = session
            .multi
            .as_ref()
            .map(|m| m.targets().to_vec())
            .unwrap_or_default();

        let is_text_widget = matches!(
            self.widget(id).map(|w| &w.kind),
            Some(WidgetKind::Text(_))
        );

        if is_text_widget {
            let value = entered.clone();
            self.update_widget(id, |w| {
                if let WidgetKind::Text(t) = &mut w.kind {
                    t.value = value;
                }
            });
            if !self.write_binding(id, PropValue::Text(entered)) {
                self.restore_origin();
                out.push(UiSignal::Cancelled { id });
                self.teardown(out, Some(id));
                return;
            }
        } else {
            let Ok(parsed) = entered.trim().parse::<f64>() else {
                // Unparseable input abandons the edit.
                self.cancel_session(out);
                return;
            };
            let Some(field) = self.widget(id).and_then(Widget::number_view) else {
                return;
            };
            let value = field.clamp_hard(parsed);
            self.update_widget(id, |w| w.set_numeric_value(value));
            self.write_binding(id, PropValue::Float(value));
            out.push(UiSignal::ValueChanged { id, value });
            // Copy mode: the typed value lands on every recruited widget.
            for t in &targets {
                self.update_widget(t.id, |w| w.set_numeric_value(value));
                if let Some(applied) = self.widget(t.id).and_then(Widget::numeric_value) {
                    self.write_binding(t.id, PropValue::Float(applied));
                }
                self.enqueue_notify(t.id);
            }
        }
        if let Some(session) = self.session.as_mut() {
            session.applied = true;
        }
        self.enqueue_commit(id);
        out.push(UiSignal::Committed { id });
        self.teardown(out, Some(id));
    }

    fn on_timer(&mut self, timer: TimerId, now: Instant, out: &mut Vec<UiSignal>) {
        // Flash expiry tears down the applied session.
        if let Some(session) = self.session.as_ref()
            && session.state() == ButtonState::WaitFlash
            && session.flash_timer == Some(timer)
        {
            let id = session.widget;
            self.teardown(out, Some(id));
            return;
        }

        // Sibling-menu dwell: switch popups if still hovering the target.
        if let Some((dwell_timer, target)) = self.dwell
            && dwell_timer == timer
        {
            self.dwell = None;
            let open = self
                .session
                .as_ref()
                .filter(|s| s.state() == ButtonState::MenuOpen)
                .map(|s| s.widget);
            if let Some(current) = open
                && self.hit(self.pointer) == Some(target)
            {
                if let Some(session) = self.session.as_mut() {
                    session.set_state(ButtonState::Exit);
                }
                self.session = None;
                out.push(UiSignal::MenuClosed {
                    id: current,
                    selected: None,
                });
                let origin = self.prop_snapshot(target);
                let mut session =
                    InteractionSession::highlight(target, origin, self.pointer, now);
                session.set_state(ButtonState::MenuOpen);
                self.session = Some(session);
                out.push(UiSignal::MenuOpened { id: target });
            }
        }
    }
}

fn is_numeric_seed(c: char) -> bool {
    c.is_ascii_digit() || c == '-' || c == '.'
}
