#![forbid(unsafe_code)]

//! Inline text editing with a local undo substack.
//!
//! [`TextEditState`] owns the string being edited while a text field (or a
//! numeric field entered by typing) is active. Editing keeps its own undo
//! stack, separate from the application's undo history: Ctrl+Z while
//! editing steps back through keystrokes, and the whole substack is
//! discarded when the edit commits or cancels.
//!
//! Cursor and deletion are grapheme-aware; a multi-codepoint emoji or a
//! combining sequence deletes as one unit.
//!
//! # Invariants
//!
//! - `cursor` and the selection anchor always sit on grapheme boundaries.
//! - `original` is immutable for the session; cancel restores it exactly.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use knurl_core::event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};

/// Result of feeding one key to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The text or cursor changed.
    Changed,
    /// The key was not handled.
    Unchanged,
    /// Enter: the edited text should be committed.
    Commit,
    /// Escape: the edit should be abandoned.
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UndoStep {
    text: String,
    cursor: usize,
}

/// Bounded stack of pre-edit snapshots, with a redo side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUndoStack {
    steps: Vec<UndoStep>,
    redo: Vec<UndoStep>,
    depth: usize,
}

impl TextUndoStack {
    /// Stack holding at most `depth` snapshots; older ones fall off.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            steps: Vec::new(),
            redo: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Number of stored undo snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no undo snapshots are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// A fresh edit invalidates anything previously undone.
    fn push(&mut self, text: &str, cursor: usize) {
        self.redo.clear();
        if self.steps.len() == self.depth {
            self.steps.remove(0);
        }
        self.steps.push(UndoStep {
            text: text.to_owned(),
            cursor,
        });
    }

    fn undo(&mut self, current: UndoStep) -> Option<UndoStep> {
        let step = self.steps.pop()?;
        self.redo.push(current);
        Some(step)
    }

    fn redo(&mut self, current: UndoStep) -> Option<UndoStep> {
        let step = self.redo.pop()?;
        self.steps.push(current);
        Some(step)
    }
}

/// Active text-edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEditState {
    text: String,
    /// Byte offset of the cursor, on a grapheme boundary.
    cursor: usize,
    /// Selection anchor; `None` means no selection.
    anchor: Option<usize>,
    original: String,
    max_len: Option<usize>,
    undo: TextUndoStack,
}

impl TextEditState {
    /// Begin editing `initial` with the whole string selected, so the
    /// first typed character replaces it.
    #[must_use]
    pub fn new(initial: impl Into<String>, max_len: Option<usize>, undo_depth: usize) -> Self {
        let text: String = initial.into();
        let cursor = text.len();
        Self {
            original: text.clone(),
            anchor: (!text.is_empty()).then_some(0),
            text,
            cursor,
            max_len,
            undo: TextUndoStack::new(undo_depth),
        }
    }

    /// Begin editing with `seed` as the entire content, cursor at the end.
    ///
    /// Used when typing a character over a numeric field: the keystroke
    /// that started the edit becomes the content.
    #[must_use]
    pub fn seeded(original: impl Into<String>, seed: char, undo_depth: usize) -> Self {
        let mut state = Self::new(original, None, undo_depth);
        state.undo.push(&state.text, state.cursor);
        state.text = seed.to_string();
        state.cursor = state.text.len();
        state.anchor = None;
        state
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The string as it was when editing began.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Cursor byte offset.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Selected byte range, ordered, if a non-empty selection exists.
    #[must_use]
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some((anchor.min(self.cursor), anchor.max(self.cursor)))
    }

    /// Display columns occupied by the text before the cursor.
    #[must_use]
    pub fn width_before_cursor(&self) -> usize {
        self.text[..self.cursor].width()
    }

    /// Snapshots available to Ctrl+Z.
    #[must_use]
    pub fn undo_depth_used(&self) -> usize {
        self.undo.len()
    }

    fn prev_boundary(&self, from: usize) -> usize {
        self.text[..from]
            .grapheme_indices(true)
            .last()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self, from: usize) -> usize {
        self.text[from..]
            .graphemes(true)
            .next()
            .map_or(self.text.len(), |g| from + g.len())
    }

    fn prev_word_boundary(&self, from: usize) -> usize {
        self.text[..from]
            .unicode_word_indices()
            .last()
            .map_or(0, |(i, _)| i)
    }

    fn next_word_boundary(&self, from: usize) -> usize {
        self.text[from..]
            .unicode_word_indices()
            .next()
            .map_or(self.text.len(), |(i, w)| from + i + w.len())
    }

    fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    fn snapshot(&mut self) {
        let cursor = self.cursor;
        let text = self.text.clone();
        self.undo.push(&text, cursor);
    }

    fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection() else {
            return false;
        };
        self.text.replace_range(start..end, "");
        self.cursor = start;
        self.anchor = None;
        true
    }

    fn insert(&mut self, ch: char) -> EditOutcome {
        let at_cap = self.max_len.is_some_and(|max| self.grapheme_count() >= max);
        if at_cap && self.selection().is_none() {
            return EditOutcome::Unchanged;
        }
        self.snapshot();
        self.delete_selection();
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        EditOutcome::Changed
    }

    fn backspace(&mut self) -> EditOutcome {
        if self.selection().is_some() {
            self.snapshot();
            self.delete_selection();
            return EditOutcome::Changed;
        }
        if self.cursor == 0 {
            return EditOutcome::Unchanged;
        }
        self.snapshot();
        let start = self.prev_boundary(self.cursor);
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        self.anchor = None;
        EditOutcome::Changed
    }

    fn delete_forward(&mut self) -> EditOutcome {
        if self.selection().is_some() {
            self.snapshot();
            self.delete_selection();
            return EditOutcome::Changed;
        }
        if self.cursor == self.text.len() {
            return EditOutcome::Unchanged;
        }
        self.snapshot();
        let end = self.next_boundary(self.cursor);
        self.text.replace_range(self.cursor..end, "");
        self.anchor = None;
        EditOutcome::Changed
    }

    fn move_cursor(&mut self, to: usize, extend: bool) -> EditOutcome {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.cursor);
            }
        } else {
            self.anchor = None;
        }
        if to == self.cursor && self.anchor.is_none() {
            return EditOutcome::Unchanged;
        }
        self.cursor = to;
        EditOutcome::Changed
    }

    fn select_all(&mut self) -> EditOutcome {
        if self.text.is_empty() {
            return EditOutcome::Unchanged;
        }
        self.anchor = Some(0);
        self.cursor = self.text.len();
        EditOutcome::Changed
    }

    fn apply_step(&mut self, step: UndoStep) -> EditOutcome {
        self.text = step.text;
        self.cursor = step.cursor.min(self.text.len());
        self.anchor = None;
        EditOutcome::Changed
    }

    fn undo_step(&mut self) -> EditOutcome {
        let current = UndoStep {
            text: self.text.clone(),
            cursor: self.cursor,
        };
        match self.undo.undo(current) {
            Some(step) => self.apply_step(step),
            None => EditOutcome::Unchanged,
        }
    }

    fn redo_step(&mut self) -> EditOutcome {
        let current = UndoStep {
            text: self.text.clone(),
            cursor: self.cursor,
        };
        match self.undo.redo(current) {
            Some(step) => self.apply_step(step),
            None => EditOutcome::Unchanged,
        }
    }

    /// Feed one key event.
    pub fn handle_key(&mut self, key: &KeyEvent) -> EditOutcome {
        if key.kind == KeyEventKind::Release {
            return EditOutcome::Unchanged;
        }
        let shift = key.modifiers.contains(Modifiers::SHIFT);
        match key.code {
            KeyCode::Enter => EditOutcome::Commit,
            KeyCode::Escape => EditOutcome::Cancel,
            KeyCode::Char(c) if key.ctrl() => match c.to_ascii_lowercase() {
                'a' => self.select_all(),
                'z' if shift => self.redo_step(),
                'z' => self.undo_step(),
                'y' => self.redo_step(),
                _ => EditOutcome::Unchanged,
            },
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete_forward(),
            KeyCode::Left => {
                let to = if key.ctrl() {
                    self.prev_word_boundary(self.cursor)
                } else {
                    self.prev_boundary(self.cursor)
                };
                self.move_cursor(to, shift)
            }
            KeyCode::Right => {
                let to = if key.ctrl() {
                    self.next_word_boundary(self.cursor)
                } else {
                    self.next_boundary(self.cursor)
                };
                self.move_cursor(to, shift)
            }
            KeyCode::Home => self.move_cursor(0, shift),
            KeyCode::End => self.move_cursor(self.text.len(), shift),
            _ => EditOutcome::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code)
    }

    fn typed(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c))
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c)).with_modifiers(Modifiers::CTRL)
    }

    fn state(initial: &str) -> TextEditState {
        TextEditState::new(initial, None, 32)
    }

    #[test]
    fn entry_selects_all_so_first_char_replaces() {
        let mut s = state("old name");
        assert_eq!(s.selection(), Some((0, 8)));
        assert_eq!(s.handle_key(&typed('x')), EditOutcome::Changed);
        assert_eq!(s.text(), "x");
    }

    #[test]
    fn seeded_entry_replaces_numeric_display() {
        let s = TextEditState::seeded("0.500", '7', 32);
        assert_eq!(s.text(), "7");
        assert_eq!(s.original(), "0.500");
        assert!(s.selection().is_none());
    }

    #[test]
    fn typing_appends_at_cursor() {
        let mut s = TextEditState::seeded("", 'a', 32);
        s.handle_key(&typed('b'));
        s.handle_key(&typed('c'));
        assert_eq!(s.text(), "abc");
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut s = TextEditState::seeded("", 'a', 32);
        // Family emoji: multiple codepoints, one grapheme.
        for c in "👨‍👩‍👧".chars() {
            s.handle_key(&typed(c));
        }
        s.handle_key(&press(KeyCode::Backspace));
        assert_eq!(s.text(), "a");
    }

    #[test]
    fn delete_forward_from_home() {
        let mut s = TextEditState::seeded("", 'a', 32);
        s.handle_key(&typed('b'));
        s.handle_key(&press(KeyCode::Home));
        assert_eq!(s.handle_key(&press(KeyCode::Delete)), EditOutcome::Changed);
        assert_eq!(s.text(), "b");
        s.handle_key(&press(KeyCode::End));
        assert_eq!(s.handle_key(&press(KeyCode::Delete)), EditOutcome::Unchanged);
    }

    #[test]
    fn shift_arrows_extend_selection() {
        let mut s = TextEditState::seeded("", 'a', 32);
        s.handle_key(&typed('b'));
        s.handle_key(&typed('c'));
        let shift_left = KeyEvent::new(KeyCode::Left).with_modifiers(Modifiers::SHIFT);
        s.handle_key(&shift_left);
        s.handle_key(&shift_left);
        assert_eq!(s.selection(), Some((1, 3)));
        s.handle_key(&typed('X'));
        assert_eq!(s.text(), "aX");
    }

    #[test]
    fn plain_arrow_collapses_selection() {
        let mut s = state("abc");
        assert!(s.selection().is_some());
        s.handle_key(&press(KeyCode::Left));
        assert!(s.selection().is_none());
    }

    #[test]
    fn ctrl_z_steps_back_through_edits() {
        let mut s = TextEditState::seeded("", 'a', 32);
        s.handle_key(&typed('b'));
        s.handle_key(&typed('c'));
        assert_eq!(s.text(), "abc");
        s.handle_key(&ctrl('z'));
        assert_eq!(s.text(), "ab");
        s.handle_key(&ctrl('z'));
        assert_eq!(s.text(), "a");
        s.handle_key(&ctrl('z'));
        assert_eq!(s.text(), "");
        // Substack exhausted.
        assert_eq!(s.handle_key(&ctrl('z')), EditOutcome::Unchanged);
    }

    #[test]
    fn redo_restores_undone_edit() {
        let mut s = TextEditState::seeded("", 'a', 32);
        s.handle_key(&typed('b'));
        s.handle_key(&ctrl('z'));
        assert_eq!(s.text(), "a");
        s.handle_key(&ctrl('y'));
        assert_eq!(s.text(), "ab");

        // Ctrl+Shift+Z redoes as well.
        s.handle_key(&ctrl('z'));
        let redo = KeyEvent::new(KeyCode::Char('z'))
            .with_modifiers(Modifiers::CTRL | Modifiers::SHIFT);
        s.handle_key(&redo);
        assert_eq!(s.text(), "ab");
    }

    #[test]
    fn new_edit_invalidates_redo() {
        let mut s = TextEditState::seeded("", 'a', 32);
        s.handle_key(&typed('b'));
        s.handle_key(&ctrl('z'));
        s.handle_key(&typed('c'));
        assert_eq!(s.text(), "ac");
        assert_eq!(s.handle_key(&ctrl('y')), EditOutcome::Unchanged);
        assert_eq!(s.text(), "ac");
    }

    #[test]
    fn ctrl_arrows_jump_words() {
        let mut s = TextEditState::seeded("", 'f', 32);
        for c in "oo bar".chars() {
            s.handle_key(&typed(c));
        }
        assert_eq!(s.text(), "foo bar");
        let ctrl_left = KeyEvent::new(KeyCode::Left).with_modifiers(Modifiers::CTRL);
        s.handle_key(&ctrl_left);
        assert_eq!(s.cursor(), 4); // start of "bar"
        s.handle_key(&ctrl_left);
        assert_eq!(s.cursor(), 0);
        let ctrl_right = KeyEvent::new(KeyCode::Right).with_modifiers(Modifiers::CTRL);
        s.handle_key(&ctrl_right);
        assert_eq!(s.cursor(), 3); // end of "foo"
    }

    #[test]
    fn undo_depth_is_bounded() {
        let mut s = TextEditState::seeded("", '0', 3);
        for c in "123456".chars() {
            s.handle_key(&typed(c));
        }
        assert_eq!(s.undo_depth_used(), 3);
        for _ in 0..3 {
            s.handle_key(&ctrl('z'));
        }
        // Oldest snapshots were discarded; undo stops partway back.
        assert_eq!(s.text(), "0123");
    }

    #[test]
    fn max_len_refuses_insert_without_side_effects() {
        let mut s = TextEditState::new("ab", Some(2), 32);
        s.handle_key(&press(KeyCode::End)); // collapse entry selection
        let before = s.undo_depth_used();
        assert_eq!(s.handle_key(&typed('c')), EditOutcome::Unchanged);
        assert_eq!(s.text(), "ab");
        assert_eq!(s.undo_depth_used(), before);
    }

    #[test]
    fn max_len_still_allows_replacing_selection() {
        let mut s = TextEditState::new("ab", Some(2), 32);
        // Entry selection covers "ab"; typing replaces it even at max.
        assert_eq!(s.handle_key(&typed('x')), EditOutcome::Changed);
        assert_eq!(s.text(), "x");
    }

    #[test]
    fn select_all_then_type() {
        let mut s = TextEditState::seeded("", 'a', 32);
        s.handle_key(&typed('b'));
        s.handle_key(&ctrl('a'));
        assert_eq!(s.selection(), Some((0, 2)));
        s.handle_key(&typed('z'));
        assert_eq!(s.text(), "z");
    }

    #[test]
    fn commit_and_cancel_outcomes() {
        let mut s = state("v");
        assert_eq!(s.handle_key(&press(KeyCode::Enter)), EditOutcome::Commit);
        assert_eq!(s.handle_key(&press(KeyCode::Escape)), EditOutcome::Cancel);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut s = state("v");
        let release = KeyEvent::new(KeyCode::Char('x')).with_kind(KeyEventKind::Release);
        assert_eq!(s.handle_key(&release), EditOutcome::Unchanged);
        assert_eq!(s.text(), "v");
    }

    #[test]
    fn width_accounts_for_wide_glyphs() {
        let mut s = TextEditState::seeded("", '界', 32);
        assert_eq!(s.width_before_cursor(), 2);
        s.handle_key(&typed('a'));
        assert_eq!(s.width_before_cursor(), 3);
    }
}
