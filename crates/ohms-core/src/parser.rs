//! TOML homework layout and gradebook parsers.
//!
//! Loads homework pages and gradebook snapshots from TOML files, and
//! validates layouts.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::column::Cell;
use crate::gradebook::{Assignment, Gradebook, Student};
use crate::model::{parse_server_date, HomeworkLayout, ItemLayout, ItemType, QuestionLayout};

#[derive(Debug, Deserialize)]
struct TomlHomeworkFile {
    homework: TomlHomeworkHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlHomeworkHeader {
    id: String,
    name: String,
    #[serde(default)]
    due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default = "default_points")]
    points: f64,
    #[serde(default)]
    items: Vec<TomlItem>,
}

fn default_points() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    options: Vec<String>,
}

/// Parse a single TOML file into a `HomeworkLayout`.
pub fn parse_homework(path: &Path) -> Result<HomeworkLayout> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read homework file: {}", path.display()))?;

    parse_homework_str(&content, path)
}

/// Parse a TOML string into a `HomeworkLayout`.
pub fn parse_homework_str(content: &str, source_path: &Path) -> Result<HomeworkLayout> {
    let parsed: TomlHomeworkFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let items = q
                .items
                .into_iter()
                .map(|item| {
                    let item_type: ItemType = item
                        .item_type
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
                    Ok(ItemLayout {
                        item_type,
                        options: item.options,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(QuestionLayout {
                id: q.id,
                name: q.name,
                points: q.points,
                items,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(HomeworkLayout {
        id: parsed.homework.id,
        name: parsed.homework.name,
        due_date: parsed.homework.due_date,
        questions,
    })
}

/// Recursively load all `.toml` homework files from a directory.
pub fn load_homework_directory(dir: &Path) -> Result<Vec<HomeworkLayout>> {
    let mut pages = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            pages.extend(load_homework_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_homework(&path) {
                Ok(page) => pages.push(page),
                Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
            }
        }
    }

    pages.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(pages)
}

/// A warning from homework validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub question_id: Option<String>,
    pub message: String,
}

/// Check a homework layout for common authoring mistakes.
pub fn validate_homework(page: &HomeworkLayout) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |question_id: Option<&str>, message: String| {
        warnings.push(ValidationWarning {
            question_id: question_id.map(str::to_string),
            message,
        })
    };

    if page.questions.is_empty() {
        warn(None, "homework has no questions".into());
    }
    if let Some(due) = &page.due_date {
        if let Err(e) = parse_server_date(due) {
            warn(None, format!("due date '{due}' is not MM/DD/YYYY HH:MM:SS: {e}"));
        }
    }

    let mut seen = HashSet::new();
    for q in &page.questions {
        let id = Some(q.id.as_str());
        if !seen.insert(q.id.as_str()) {
            warn(id, format!("duplicate question ID: {}", q.id));
        }
        if q.items.is_empty() {
            warn(id, "question has no items".into());
        }
        if q.points.is_nan() || q.points <= 0.0 {
            warn(id, format!("points should be positive, got {}", q.points));
        }
        for (i, item) in q.items.iter().enumerate() {
            match item.item_type {
                ItemType::MultipleChoice => {
                    if item.options.len() < 2 {
                        warn(id, format!("item {} is multiple choice with fewer than two options", i + 1));
                    }
                    let mut options = HashSet::new();
                    for option in &item.options {
                        if !options.insert(option.as_str()) {
                            warn(id, format!("item {} repeats option '{option}'", i + 1));
                        }
                    }
                }
                _ if !item.options.is_empty() => {
                    warn(id, format!("item {} is {} and ignores its options", i + 1, item.item_type));
                }
                _ => {}
            }
        }
    }

    warnings
}

#[derive(Debug, Deserialize)]
struct TomlGradebookFile {
    #[serde(default)]
    assignments: Vec<Assignment>,
    #[serde(default)]
    students: Vec<TomlStudent>,
}

#[derive(Debug, Deserialize)]
struct TomlStudent {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    scores: BTreeMap<String, Cell>,
}

/// Parse a gradebook snapshot file.
pub fn parse_gradebook(path: &Path) -> Result<Gradebook> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read gradebook file: {}", path.display()))?;

    parse_gradebook_str(&content, path)
}

pub fn parse_gradebook_str(content: &str, source_path: &Path) -> Result<Gradebook> {
    let parsed: TomlGradebookFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let students = parsed
        .students
        .iter()
        .map(|s| Student {
            id: s.id.clone(),
            name: s.name.clone(),
        })
        .collect();
    let mut gradebook = Gradebook::new(students, parsed.assignments)
        .with_context(|| format!("invalid gradebook: {}", source_path.display()))?;

    for student in &parsed.students {
        for (assignment, cell) in &student.scores {
            gradebook
                .set_cell(&student.id, assignment, *cell)
                .with_context(|| format!("student {}", student.id))?;
        }
    }

    Ok(gradebook)
}
