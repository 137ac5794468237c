//! Text splicing behind the editor's formatting toolbar.
//!
//! Offsets are character offsets into the editor text. Selections that run
//! past the end or are reversed are clamped instead of rejected, since they
//! come straight from the DOM.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

/// Half-open `[start, end)` character range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Collapsed selection (a bare cursor).
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Result of a splice: the new text and the selection to restore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splice {
    pub text: String,
    pub selection: Selection,
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(offset, _)| offset)
}

/// Wrap the selected text in `prefix` and `suffix`.
///
/// The returned selection covers the originally selected text at its new
/// position, so repeated toolbar clicks keep acting on the same words.
pub fn insert_formatting(text: &str, selection: Selection, prefix: &str, suffix: &str) -> Splice {
    let char_len = text.chars().count();
    let end = selection.end.min(char_len);
    let start = selection.start.min(end);

    let start_byte = byte_offset(text, start);
    let end_byte = byte_offset(text, end);

    let mut spliced = String::with_capacity(text.len() + prefix.len() + suffix.len());
    spliced.push_str(&text[..start_byte]);
    spliced.push_str(prefix);
    spliced.push_str(&text[start_byte..end_byte]);
    spliced.push_str(suffix);
    spliced.push_str(&text[end_byte..]);

    let new_start = start + prefix.chars().count();
    Splice {
        text: spliced,
        selection: Selection::new(new_start, new_start + (end - start)),
    }
}

/// Toolbar buttons of the post editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatAction {
    Bold,
    Italic,
    Underline,
    Code,
    Quote,
    Link,
    BulletList,
    NumberedList,
    Heading,
}

impl FormatAction {
    /// Every action, in toolbar order.
    pub const ALL: [Self; 9] = [
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Code,
        Self::Quote,
        Self::BulletList,
        Self::NumberedList,
        Self::Link,
        Self::Heading,
    ];

    /// Markup inserted before and after the selection.
    pub fn affixes(self) -> (&'static str, &'static str) {
        match self {
            Self::Bold => ("**", "**"),
            Self::Italic => ("*", "*"),
            Self::Underline => ("<u>", "</u>"),
            Self::Code => ("`", "`"),
            Self::Quote => ("> ", ""),
            Self::Link => ("[", "](url)"),
            Self::BulletList => ("- ", ""),
            Self::NumberedList => ("1. ", ""),
            Self::Heading => ("## ", ""),
        }
    }

    /// Button tooltip.
    pub fn title(self) -> &'static str {
        match self {
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Underline => "Underline",
            Self::Code => "Code",
            Self::Quote => "Quote",
            Self::Link => "Link",
            Self::BulletList => "Bullet List",
            Self::NumberedList => "Numbered List",
            Self::Heading => "Heading",
        }
    }

    /// Apply this action to `text` at `selection`.
    pub fn apply(self, text: &str, selection: Selection) -> Splice {
        let (prefix, suffix) = self.affixes();
        insert_formatting(text, selection, prefix, suffix)
    }
}
