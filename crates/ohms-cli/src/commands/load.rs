//! The `ohms load` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use ohms_client::config::{create_client, load_config_from};
use ohms_core::homework::Homework;
use ohms_core::parser;

use super::ConsoleHooks;

pub async fn execute(
    homework_path: PathBuf,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let layout = parser::parse_homework(&homework_path)?;
    let client = Arc::new(create_client(&config)?);

    let homework = Homework::new(&layout, client, Arc::new(ConsoleHooks))
        .with_parallelism(parallelism.unwrap_or(config.parallelism));
    eprintln!(
        "Loading {} ({} questions) from {}",
        homework.name(),
        homework.questions().len(),
        config.base_url
    );

    let reports = homework.load_all().await;

    let mut table = Table::new();
    table.set_header(vec!["Question", "Status", "Score", "Responses"]);
    let mut failed = 0;
    for (question, report) in homework.questions().iter().zip(&reports) {
        let snap = question.snapshot();
        let (status, score) = match &report.result {
            Ok(()) => (
                if snap.is_locked() { "locked" } else { "open" },
                snap.feedback
                    .as_ref()
                    .map(|f| f.headline.clone())
                    .unwrap_or_else(|| "not submitted".into()),
            ),
            Err(e) => {
                failed += 1;
                ("error", e.user_message())
            }
        };
        let responses = snap
            .items
            .iter()
            .map(|item| item.get_value().unwrap_or_else(|| "-".into()))
            .collect::<Vec<_>>()
            .join(" | ");
        table.add_row(vec![
            Cell::new(&report.question_id),
            Cell::new(status),
            Cell::new(score),
            Cell::new(responses),
        ]);
    }

    println!("{table}");
    println!(
        "Earned {} of {} points",
        homework.earned_points(),
        homework.total_points()
    );

    anyhow::ensure!(failed == 0, "{failed} question(s) failed to load");
    Ok(())
}
