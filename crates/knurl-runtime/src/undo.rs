#![forbid(unsafe_code)]

//! Application-level undo journal.
//!
//! The interaction layer does not own application data, so it cannot undo
//! anything itself. What it can do is record, once per committed edit,
//! that an undoable step happened and what to call it. The embedder
//! subscribes to this journal and snapshots its own state.
//!
//! This is distinct from the per-session text undo substack in
//! `knurl_widgets::text_edit`; that one lives and dies with a single
//! editing session.

/// Bounded journal of committed, undoable steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoJournal {
    steps: Vec<String>,
    depth: usize,
}

impl UndoJournal {
    /// Journal keeping at most `depth` steps; older ones fall off.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            steps: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Record a committed step.
    pub fn push(&mut self, label: impl Into<String>) {
        if self.steps.len() == self.depth {
            self.steps.remove(0);
        }
        self.steps.push(label.into());
    }

    /// Remove and return the newest step's label.
    pub fn pop(&mut self) -> Option<String> {
        self.steps.pop()
    }

    /// Newest step's label without removing it.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.steps.last().map(String::as_str)
    }

    /// Recorded labels, oldest first.
    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Number of recorded steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for UndoJournal {
    fn default() -> Self {
        Self::new(64)
    }
}
