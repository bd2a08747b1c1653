//! Answer items: the input widgets inside a question.
//!
//! Every variant shares one base record (owning question, position, lock
//! flag, posted solution, feedback slot) and differs only in how it stores
//! and validates its value.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ItemError;
use crate::model::{ItemLayout, ItemType};

/// Rich-text editing widget that can back a long-answer item.
///
/// While attached, the editor holds the authoritative text.
pub trait RichTextEditor: Send + Sync {
    fn get_text(&self) -> String;
    fn set_text(&self, text: &str);
}

/// Where an instructor solution is shown relative to the student's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionPlacement {
    /// The matching option is highlighted in place.
    Highlight,
    /// A short span right after the input.
    Inline,
    /// A block appended below the input.
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub text: String,
    pub placement: SolutionPlacement,
}

/// Variant-specific state.
#[derive(Clone)]
pub enum ItemKind {
    MultipleChoice {
        options: Vec<String>,
        selected: Option<String>,
    },
    ShortAnswer {
        text: String,
    },
    LongAnswer {
        text: String,
        preview: String,
        editor: Option<Arc<dyn RichTextEditor>>,
    },
}

impl fmt::Debug for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::MultipleChoice { options, selected } => f
                .debug_struct("MultipleChoice")
                .field("options", options)
                .field("selected", selected)
                .finish(),
            ItemKind::ShortAnswer { text } => {
                f.debug_struct("ShortAnswer").field("text", text).finish()
            }
            ItemKind::LongAnswer {
                text,
                preview,
                editor,
            } => f
                .debug_struct("LongAnswer")
                .field("text", text)
                .field("preview", preview)
                .field("editor", &editor.as_ref().map(|_| "attached"))
                .finish(),
        }
    }
}

/// One answer-capturing widget.
#[derive(Debug, Clone)]
pub struct AnswerItem {
    question_id: String,
    index: usize,
    enabled: bool,
    solution: Option<Solution>,
    feedback: Option<String>,
    kind: ItemKind,
}

impl AnswerItem {
    pub fn from_layout(question_id: &str, index: usize, layout: &ItemLayout) -> Self {
        let kind = match layout.item_type {
            ItemType::MultipleChoice => ItemKind::MultipleChoice {
                options: layout.options.clone(),
                selected: None,
            },
            ItemType::ShortAnswer => ItemKind::ShortAnswer {
                text: String::new(),
            },
            ItemType::LongAnswer => ItemKind::LongAnswer {
                text: String::new(),
                preview: String::new(),
                editor: None,
            },
        };
        Self {
            question_id: question_id.to_string(),
            index,
            enabled: true,
            solution: None,
            feedback: None,
            kind,
        }
    }

    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn item_type(&self) -> ItemType {
        match self.kind {
            ItemKind::MultipleChoice { .. } => ItemType::MultipleChoice,
            ItemKind::ShortAnswer { .. } => ItemType::ShortAnswer,
            ItemKind::LongAnswer { .. } => ItemType::LongAnswer,
        }
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Current value; `None` only for a multiple-choice item with nothing
    /// selected.
    pub fn get_value(&self) -> Option<String> {
        match &self.kind {
            ItemKind::MultipleChoice { selected, .. } => selected.clone(),
            ItemKind::ShortAnswer { text } => Some(text.clone()),
            ItemKind::LongAnswer {
                editor: Some(editor),
                ..
            } => Some(normalize_line_endings(&editor.get_text())),
            ItemKind::LongAnswer { text, .. } => Some(text.clone()),
        }
    }

    /// Student edit. Refused while the item is locked.
    pub fn set_value(&mut self, value: &str) -> Result<(), ItemError> {
        if !self.enabled {
            return Err(ItemError::Locked { index: self.index });
        }
        self.write_value(value)
    }

    /// Write a value regardless of lock state; used when restoring a
    /// stored submission.
    pub(crate) fn restore_value(&mut self, value: &str) -> Result<(), ItemError> {
        self.write_value(value)
    }

    fn write_value(&mut self, value: &str) -> Result<(), ItemError> {
        let index = self.index;
        match &mut self.kind {
            ItemKind::MultipleChoice { options, selected } => {
                if value.is_empty() {
                    *selected = None;
                } else if options.iter().any(|o| o == value) {
                    *selected = Some(value.to_string());
                } else {
                    return Err(ItemError::UnknownOption {
                        index,
                        value: value.to_string(),
                    });
                }
            }
            ItemKind::ShortAnswer { text } => *text = value.to_string(),
            ItemKind::LongAnswer {
                text,
                preview,
                editor,
            } => {
                *text = normalize_line_endings(value);
                *preview = render_preview(text);
                if let Some(editor) = editor {
                    editor.set_text(text);
                }
            }
        }
        Ok(())
    }

    pub fn lock(&mut self) {
        self.enabled = false;
    }

    pub fn unlock(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Show the instructor's answer next to the student's own.
    pub fn set_solution(&mut self, solution: &str) {
        let placement = match self.kind {
            ItemKind::MultipleChoice { .. } => SolutionPlacement::Highlight,
            ItemKind::ShortAnswer { .. } => SolutionPlacement::Inline,
            ItemKind::LongAnswer { .. } => SolutionPlacement::Block,
        };
        self.solution = Some(Solution {
            text: solution.to_string(),
            placement,
        });
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Option id to highlight as correct, for choice items.
    pub fn highlighted_option(&self) -> Option<&str> {
        match (&self.kind, &self.solution) {
            (ItemKind::MultipleChoice { options, .. }, Some(solution)) => options
                .iter()
                .find(|o| **o == solution.text)
                .map(String::as_str),
            _ => None,
        }
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub(crate) fn set_feedback(&mut self, comment: &str) {
        self.feedback = Some(comment.to_string());
    }

    /// Rendered preview of a long answer.
    pub fn preview(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::LongAnswer { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Back a long-answer item with a rich-text editor, seeding it with the
    /// current text. Returns `false` for other variants.
    pub fn attach_editor(&mut self, new_editor: Arc<dyn RichTextEditor>) -> bool {
        match &mut self.kind {
            ItemKind::LongAnswer { text, editor, .. } => {
                new_editor.set_text(text);
                *editor = Some(new_editor);
                true
            }
            _ => false,
        }
    }

    /// Stop delegating to the editor, keeping whatever it last held.
    pub fn detach_editor(&mut self) {
        if let ItemKind::LongAnswer {
            text,
            preview,
            editor,
        } = &mut self.kind
        {
            if let Some(old) = editor.take() {
                *text = normalize_line_endings(&old.get_text());
                *preview = render_preview(text);
            }
        }
    }
}

/// `\r\n` and lone `\r` become `\n`.
pub fn normalize_line_endings(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Paragraph-split, HTML-escaped preview of a long answer. Math delimiters
/// pass through untouched for the typesetter.
fn render_preview(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", html_escape(p).replace('\n', "<br/>")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
