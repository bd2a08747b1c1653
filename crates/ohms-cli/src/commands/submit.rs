//! The `ohms submit` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use ohms_client::config::{create_client, load_config_from};
use ohms_core::parser;
use ohms_core::question::Question;

use super::ConsoleHooks;

pub async fn execute(
    homework_path: PathBuf,
    question_id: String,
    responses: Vec<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let layout = parser::parse_homework(&homework_path)?;
    let question_layout = layout
        .questions
        .iter()
        .find(|q| q.id == question_id)
        .with_context(|| format!("no question '{question_id}' in {}", homework_path.display()))?;
    anyhow::ensure!(
        responses.len() == question_layout.items.len(),
        "question {question_id} has {} item(s), got {} --response value(s)",
        question_layout.items.len(),
        responses.len()
    );

    let client = Arc::new(create_client(&config)?);
    let question = Question::new(question_layout, client, Arc::new(ConsoleHooks));

    question.load().await?;
    if question.is_locked() {
        anyhow::bail!("question {question_id} is locked; no further submissions are accepted");
    }

    for (index, response) in responses.iter().enumerate() {
        question
            .set_value(index, response)
            .with_context(|| format!("item {}", index + 1))?;
    }

    let outcome = question.submit().await?;
    let feedback = &outcome.feedback;

    println!("{}", feedback.headline);
    if let Some(comments) = &feedback.comments {
        println!("{comments}");
    }
    for item in question.snapshot().items {
        if let Some(comment) = item.feedback() {
            println!("  item {}: {comment}", item.index() + 1);
        }
    }
    if !feedback.time.is_empty() {
        println!("{}", feedback.time);
    }
    if outcome.locked {
        println!("This question is now closed to further submissions.");
    }

    Ok(())
}
