//! Free-text comments with a clear-on-first-edit placeholder.

use tui_input::{Input, InputRequest};

/// Instructional text shown until the user starts typing.
pub const PLACEHOLDER: &str =
    "If you have any additional comments that might help identify your tune, enter them here.";

/// Editable comment buffer.
///
/// Starts out holding [`PLACEHOLDER`]. The first edit request clears it
/// before it is applied, so typing one character yields exactly that
/// character.
#[derive(Debug)]
pub struct CommentsEntry {
    input: Input,
}

impl Default for CommentsEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentsEntry {
    pub fn new() -> Self {
        Self {
            input: Input::new(PLACEHOLDER.to_string()),
        }
    }

    /// Current buffer contents, placeholder included.
    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Cursor position as a char index into [`Self::text`].
    pub fn cursor(&self) -> usize {
        self.input.cursor()
    }

    pub fn shows_placeholder(&self) -> bool {
        self.input.value() == PLACEHOLDER
    }

    /// Applies one editing request.
    pub fn apply(&mut self, request: InputRequest) {
        if self.shows_placeholder() {
            self.input.reset();
            // Cursor moves and deletions on the placeholder only clear it.
            if !matches!(request, InputRequest::InsertChar(_)) {
                return;
            }
        }
        let _ = self.input.handle(request);
    }

    /// Comment text to forward: empty if the placeholder was never replaced.
    pub fn submit(&self) -> String {
        if self.shows_placeholder() {
            String::new()
        } else {
            self.input.value().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_entry_submits_empty() {
        let entry = CommentsEntry::new();
        assert!(entry.shows_placeholder());
        assert_eq!(entry.submit(), "");
    }

    #[test]
    fn test_single_keystroke_replaces_placeholder() {
        let mut entry = CommentsEntry::new();
        entry.apply(InputRequest::InsertChar('a'));
        assert_eq!(entry.text(), "a");
        assert_eq!(entry.submit(), "a");
    }

    #[test]
    fn test_backspace_on_placeholder_only_clears() {
        let mut entry = CommentsEntry::new();
        entry.apply(InputRequest::DeletePrevChar);
        assert_eq!(entry.text(), "");
        entry.apply(InputRequest::InsertChar('h'));
        entry.apply(InputRequest::InsertChar('i'));
        assert_eq!(entry.submit(), "hi");
    }

    #[test]
    fn test_multiline_text_is_kept() {
        let mut entry = CommentsEntry::new();
        for c in "la\nla".chars() {
            entry.apply(InputRequest::InsertChar(c));
        }
        assert_eq!(entry.submit(), "la\nla");
    }

    #[test]
    fn test_retyping_placeholder_still_counts_as_empty() {
        let mut entry = CommentsEntry::new();
        for c in PLACEHOLDER.chars() {
            entry.apply(InputRequest::InsertChar(c));
        }
        assert_eq!(entry.submit(), "");
    }
}
