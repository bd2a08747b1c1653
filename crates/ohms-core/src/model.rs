//! Core data model: homework layouts and the payloads exchanged with the
//! homework server.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::column::Cell;

/// Date format the server uses for `time`, `start_date` and `due_date`.
pub const SERVER_DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Parse a date in the server's format.
pub fn parse_server_date(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), SERVER_DATE_FORMAT)
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

/// Kind of input widget an item is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemType {
    MultipleChoice,
    ShortAnswer,
    LongAnswer,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::MultipleChoice => write!(f, "multiple-choice"),
            ItemType::ShortAnswer => write!(f, "short-answer"),
            ItemType::LongAnswer => write!(f, "long-answer"),
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple-choice" | "mc" => Ok(ItemType::MultipleChoice),
            "short-answer" | "short" => Ok(ItemType::ShortAnswer),
            "long-answer" | "long" => Ok(ItemType::LongAnswer),
            other => Err(format!("unknown item type: {other}")),
        }
    }
}

/// One item as authored in a homework layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemLayout {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Option ids for multiple-choice items.
    #[serde(default)]
    pub options: Vec<String>,
}

/// One question as authored in a homework layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionLayout {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub points: f64,
    #[serde(default)]
    pub items: Vec<ItemLayout>,
}

/// A homework page: an ordered list of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeworkLayout {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionLayout>,
}

// ---------------------------------------------------------------------------
// Server payloads
// ---------------------------------------------------------------------------

/// A stored response for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    #[serde(default)]
    pub response: String,
}

/// Grader comments: one block for the whole question, or one per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Comments {
    Single(String),
    PerItem(Vec<Option<String>>),
}

/// A recorded submission as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub item_responses: Vec<ItemResponse>,
    /// `None` while grading is pending.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub comments: Option<Comments>,
    #[serde(default)]
    pub time: String,
}

/// Body of `GET load`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub submission: Option<Submission>,
    #[serde(default)]
    pub solution: Option<Vec<String>>,
}

/// Body of `POST submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub responses: Vec<String>,
}

/// Answer to `POST submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub locked: bool,
    pub submission: Submission,
}

/// Authored source and rendered form of a question, from `update_question`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSource {
    pub xml: String,
    pub html: String,
}

// ---------------------------------------------------------------------------
// Gradebook admin edits
// ---------------------------------------------------------------------------

/// A field-level gradebook edit sent to one of the admin endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminUpdate {
    Grade {
        student_id: String,
        assignment_id: String,
        score: Cell,
    },
    MaxScore {
        assignment_id: String,
        max_score: f64,
    },
    Category {
        assignment_id: String,
        category: String,
    },
    DueDate {
        assignment_id: String,
        start_date: String,
        due_date: String,
    },
    AddHomework {
        name: String,
        start_date: String,
        due_date: String,
    },
    AddQuestion {
        assignment_id: String,
        xml: String,
    },
}

impl AdminUpdate {
    /// Endpoint path, relative to the server base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            AdminUpdate::Grade { .. } => "update_grade",
            AdminUpdate::MaxScore { .. } => "update_max_score",
            AdminUpdate::Category { .. } => "update_category",
            AdminUpdate::DueDate { .. } => "update_due_date",
            AdminUpdate::AddHomework { .. } => "add_homework",
            AdminUpdate::AddQuestion { .. } => "add_question",
        }
    }

    /// Form fields in the names the server expects.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            AdminUpdate::Grade {
                student_id,
                assignment_id,
                score,
            } => vec![
                ("stuid", student_id.clone()),
                ("hw_id", assignment_id.clone()),
                ("score", score.to_string()),
            ],
            AdminUpdate::MaxScore {
                assignment_id,
                max_score,
            } => vec![
                ("hw_id", assignment_id.clone()),
                ("max_score", max_score.to_string()),
            ],
            AdminUpdate::Category {
                assignment_id,
                category,
            } => vec![
                ("hw_id", assignment_id.clone()),
                ("category", category.clone()),
            ],
            AdminUpdate::DueDate {
                assignment_id,
                start_date,
                due_date,
            } => vec![
                ("hw_id", assignment_id.clone()),
                ("start_date", start_date.clone()),
                ("due_date", due_date.clone()),
            ],
            AdminUpdate::AddHomework {
                name,
                start_date,
                due_date,
            } => vec![
                ("name", name.clone()),
                ("start_date", start_date.clone()),
                ("due_date", due_date.clone()),
            ],
            AdminUpdate::AddQuestion { assignment_id, xml } => {
                vec![("hw_id", assignment_id.clone()), ("xml", xml.clone())]
            }
        }
    }

    /// Check the edit locally before it is sent.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            AdminUpdate::MaxScore { max_score, .. } if !max_score.is_finite() || *max_score < 0.0 => {
                Err(format!("max score must be a non-negative number, got {max_score}"))
            }
            AdminUpdate::AddHomework { name, .. } if name.trim().is_empty() => {
                Err("homework name is empty".into())
            }
            AdminUpdate::DueDate {
                start_date,
                due_date,
                ..
            }
            | AdminUpdate::AddHomework {
                start_date,
                due_date,
                ..
            } => {
                let start = parse_server_date(start_date)
                    .map_err(|e| format!("invalid start date '{start_date}': {e}"))?;
                let due = parse_server_date(due_date)
                    .map_err(|e| format!("invalid due date '{due_date}': {e}"))?;
                if due < start {
                    return Err("due date is before the start date".into());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
