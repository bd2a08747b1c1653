//! The `ohms update-grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use ohms_client::config::{create_client, load_config_from};
use ohms_core::column::Cell;
use ohms_core::model::AdminUpdate;
use ohms_core::parser;
use ohms_core::traits::HomeworkApi;

use super::stats::to_table;

pub async fn execute(
    gradebook_path: PathBuf,
    student: String,
    assignment: String,
    score: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let gradebook = parser::parse_gradebook(&gradebook_path)?;
    let score: Cell = score.parse().map_err(anyhow::Error::msg)?;

    let update = AdminUpdate::Grade {
        student_id: student,
        assignment_id: assignment.clone(),
        score,
    };
    update.validate().map_err(anyhow::Error::msg)?;
    // Reject unknown ids before anything is sent.
    let updated = gradebook.apply(&update)?;

    let client = create_client(&config)?;
    let ack = client
        .admin(&update)
        .await
        .with_context(|| format!("{} was not accepted", update.endpoint()))?;
    if !ack.is_empty() {
        println!("{ack}");
    }

    let column = updated.column(&assignment)?;
    println!("{}", to_table(std::slice::from_ref(&column)));
    Ok(())
}
