//! Cursor-relative markdown formatting.
//!
//! Offsets are counted in characters, not bytes, so they line up with a
//! browser textarea's `selectionStart`/`selectionEnd` for text without
//! astral-plane characters. Out-of-range offsets are clamped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Placeholder used by line-prefix actions when nothing is selected.
pub const PLACEHOLDER: &str = "Text";

/// Language tag used for code blocks when none is given.
pub const DEFAULT_CODE_LANGUAGE: &str = "c";

/// A selection in the editor textarea. `start == end` is a caret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelection {
    pub start: usize,
    pub end: usize,
}

impl TextSelection {
    /// Create a selection, swapping the ends if they are reversed.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    #[must_use]
    pub const fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both ends to a text of `len` characters.
    #[must_use]
    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

/// Result of applying an action: the new content and where the selection
/// should be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit {
    pub content: String,
    pub selection: TextSelection,
}

/// A toolbar or shortcut formatting action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MarkdownAction {
    Bold,
    Italic,
    Underline,
    InlineCode,
    Link,
    Image,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    Quote,
    /// Fenced code block tagged with a language.
    CodeBlock(String),
}

impl MarkdownAction {
    /// Toolbar buttons in display order.
    #[must_use]
    pub fn toolbar() -> Vec<Self> {
        vec![
            Self::Bold,
            Self::Italic,
            Self::Underline,
            Self::Heading1,
            Self::Heading2,
            Self::Heading3,
            Self::BulletList,
            Self::NumberedList,
            Self::Quote,
            Self::Link,
            Self::InlineCode,
            Self::CodeBlock(DEFAULT_CODE_LANGUAGE.to_string()),
            Self::Image,
        ]
    }

    /// Short button label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bold => "B",
            Self::Italic => "I",
            Self::Underline => "U",
            Self::InlineCode => "`code`",
            Self::Link => "Link",
            Self::Image => "Image",
            Self::Heading1 => "H1",
            Self::Heading2 => "H2",
            Self::Heading3 => "H3",
            Self::BulletList => "• List",
            Self::NumberedList => "1. List",
            Self::Quote => "Quote",
            Self::CodeBlock(_) => "Code block",
        }
    }

    /// Apply the action to `content` at `selection`.
    #[must_use]
    pub fn apply(&self, content: &str, selection: TextSelection) -> Edit {
        match self {
            Self::Bold => wrap(content, selection, "**", "**"),
            Self::Italic => wrap(content, selection, "*", "*"),
            Self::Underline => wrap(content, selection, "<u>", "</u>"),
            Self::InlineCode => wrap(content, selection, "`", "`"),
            Self::Link => wrap(content, selection, "[", "](https://)"),
            Self::Image => wrap(content, selection, "![alt text](", ")"),
            Self::Heading1 => prefix_lines(content, selection, "# "),
            Self::Heading2 => prefix_lines(content, selection, "## "),
            Self::Heading3 => prefix_lines(content, selection, "### "),
            Self::BulletList => prefix_lines(content, selection, "- "),
            Self::NumberedList => prefix_lines(content, selection, "1. "),
            Self::Quote => prefix_lines(content, selection, "> "),
            Self::CodeBlock(language) => {
                let before = format!("\n\n```{language}\n");
                wrap(content, selection, &before, "\n```\n\n")
            }
        }
    }
}

impl fmt::Display for MarkdownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bold => f.write_str("bold"),
            Self::Italic => f.write_str("italic"),
            Self::Underline => f.write_str("underline"),
            Self::InlineCode => f.write_str("inline-code"),
            Self::Link => f.write_str("link"),
            Self::Image => f.write_str("image"),
            Self::Heading1 => f.write_str("h1"),
            Self::Heading2 => f.write_str("h2"),
            Self::Heading3 => f.write_str("h3"),
            Self::BulletList => f.write_str("bullet-list"),
            Self::NumberedList => f.write_str("numbered-list"),
            Self::Quote => f.write_str("quote"),
            Self::CodeBlock(language) => write!(f, "code-block:{language}"),
        }
    }
}

impl FromStr for MarkdownAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("code-block") {
            let language = match rest {
                "" => "",
                rest => rest
                    .strip_prefix(':')
                    .ok_or_else(|| format!("unknown formatting action: {s}"))?
                    .trim(),
            };
            let language = if language.is_empty() {
                DEFAULT_CODE_LANGUAGE
            } else {
                language
            };
            if !language.chars().all(|c| c.is_ascii_alphanumeric() || "+-#_".contains(c)) {
                return Err(format!("invalid code block language: {language}"));
            }
            return Ok(Self::CodeBlock(language.to_string()));
        }

        Ok(match s {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "inline-code" => Self::InlineCode,
            "link" => Self::Link,
            "image" => Self::Image,
            "h1" => Self::Heading1,
            "h2" => Self::Heading2,
            "h3" => Self::Heading3,
            "bullet-list" => Self::BulletList,
            "numbered-list" => Self::NumberedList,
            "quote" => Self::Quote,
            other => return Err(format!("unknown formatting action: {other}")),
        })
    }
}

impl TryFrom<String> for MarkdownAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarkdownAction> for String {
    fn from(action: MarkdownAction) -> Self {
        action.to_string()
    }
}

/// Editor keyboard shortcuts.
///
/// The editor page renders this table and its script binds keys from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Save,
    Bold,
    Italic,
    ToggleHelp,
}

impl Shortcut {
    pub const ALL: [Self; 4] = [Self::Save, Self::Bold, Self::Italic, Self::ToggleHelp];

    /// The key as reported by the browser, lowercase.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Save => "s",
            Self::Bold => "b",
            Self::Italic => "i",
            Self::ToggleHelp => "?",
        }
    }

    /// Whether Ctrl (or Cmd) must be held.
    #[must_use]
    pub const fn needs_modifier(self) -> bool {
        !matches!(self, Self::ToggleHelp)
    }

    /// Key combination as shown in the help dialog.
    #[must_use]
    pub const fn keys_label(self) -> &'static str {
        match self {
            Self::Save => "Ctrl/Cmd + S",
            Self::Bold => "Ctrl/Cmd + B",
            Self::Italic => "Ctrl/Cmd + I",
            Self::ToggleHelp => "?",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Save => "Save",
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::ToggleHelp => "Toggle this help",
        }
    }

    /// The formatting action bound to this shortcut, if any.
    #[must_use]
    pub fn action(self) -> Option<MarkdownAction> {
        match self {
            Self::Bold => Some(MarkdownAction::Bold),
            Self::Italic => Some(MarkdownAction::Italic),
            Self::Save | Self::ToggleHelp => None,
        }
    }

    /// What the editor script does on this shortcut: `save`, `help`, or
    /// the name of a formatting action.
    #[must_use]
    pub fn command(self) -> String {
        match self {
            Self::Save => "save".to_string(),
            Self::ToggleHelp => "help".to_string(),
            Self::Bold | Self::Italic => self
                .action()
                .map(|action| action.to_string())
                .unwrap_or_default(),
        }
    }
}

fn byte_offset(content: &str, chars: usize) -> usize {
    content
        .char_indices()
        .nth(chars)
        .map_or(content.len(), |(index, _)| index)
}

fn split(content: &str, selection: TextSelection) -> (TextSelection, &str, &str, &str) {
    let selection = selection.clamp(content.chars().count());
    let start = byte_offset(content, selection.start);
    let end = byte_offset(content, selection.end);
    let (head, rest) = content.split_at(start);
    let (selected, tail) = rest.split_at(end - start);
    (selection, head, selected, tail)
}

fn wrap(content: &str, selection: TextSelection, before: &str, after: &str) -> Edit {
    let (selection, head, selected, tail) = split(content, selection);
    let shift = before.chars().count();

    Edit {
        content: format!("{head}{before}{selected}{after}{tail}"),
        selection: TextSelection::new(selection.start + shift, selection.end + shift),
    }
}

fn prefix_lines(content: &str, selection: TextSelection, prefix: &str) -> Edit {
    let (selection, head, selected, tail) = split(content, selection);
    let selected = if selected.is_empty() {
        PLACEHOLDER
    } else {
        selected
    };
    let block = selected
        .split('\n')
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n");
    let block_len = block.chars().count();

    Edit {
        content: format!("{head}{block}{tail}"),
        selection: TextSelection::new(selection.start, selection.start + block_len),
    }
}
