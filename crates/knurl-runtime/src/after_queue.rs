#![forbid(unsafe_code)]

//! Deferred action queue.
//!
//! Committing an edit must not run operators inline: the widget that
//! queued the action is usually mid-teardown, and an operator may rebuild
//! the whole region. Handlers therefore enqueue an [`AfterAction`] and the
//! embedder flushes the queue once per frame, after event dispatch has
//! fully unwound.
//!
//! The queue is owned by its region. There is no global; two regions flush
//! independently and an action can never run against the wrong region's
//! state.
//!
//! # Invariants
//!
//! - Flushing drains the queue by swap, so actions enqueued while flushing
//!   land in the next flush rather than running re-entrantly.
//! - An action holds its own reference to its operator; widget teardown
//!   cannot invalidate a queued action.

use std::rc::Rc;

use knurl_widgets::binding::{OpContext, OpResult, Operator};

/// One deferred commit, captured at enqueue time.
pub struct AfterAction {
    /// Operator to run, if the widget carried one.
    pub op: Option<Rc<dyn Operator>>,
    /// Interaction snapshot from enqueue time.
    pub ctx: OpContext,
    /// Undo step to record on success, if the widget opted in.
    pub undo: Option<String>,
    /// Property whose binding should be notified after the action runs.
    pub notify: Option<String>,
}

impl std::fmt::Debug for AfterAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AfterAction")
            .field("op", &self.op.as_ref().map(|_| ".."))
            .field("ctx", &self.ctx)
            .field("undo", &self.undo)
            .field("notify", &self.notify)
            .finish()
    }
}

impl AfterAction {
    /// Run the operator, if present and willing.
    ///
    /// An absent operator counts as finished: the edit itself already
    /// happened at commit time.
    #[must_use]
    pub fn run(&self) -> OpResult {
        match &self.op {
            Some(op) if op.poll(&self.ctx) => op.invoke(&self.ctx),
            Some(_) => OpResult::Cancelled,
            None => OpResult::Finished,
        }
    }
}

/// FIFO queue of deferred actions.
#[derive(Debug, Default)]
pub struct AfterQueue {
    actions: Vec<AfterAction>,
}

impl AfterQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action.
    pub fn push(&mut self, action: AfterAction) {
        self.actions.push(action);
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Take everything pending, leaving the queue empty.
    #[must_use]
    pub fn drain(&mut self) -> Vec<AfterAction> {
        std::mem::take(&mut self.actions)
    }
}
