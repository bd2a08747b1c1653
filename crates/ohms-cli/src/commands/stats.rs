//! The `ohms stats` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use ohms_core::column::{AssignmentColumn, NO_DATA};
use ohms_core::parser;

pub fn execute(gradebook_path: PathBuf, assignment: Option<String>, format: String) -> Result<()> {
    let gradebook = parser::parse_gradebook(&gradebook_path)?;

    let columns = match &assignment {
        Some(id) => vec![gradebook
            .column(id)
            .with_context(|| format!("in {}", gradebook_path.display()))?],
        None => gradebook.columns(),
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&columns)?),
        "markdown" | "md" => print!("{}", to_markdown(&columns)),
        "text" => println!("{}", to_table(&columns)),
        other => anyhow::bail!("unknown format '{other}' (expected text, json or markdown)"),
    }

    Ok(())
}

fn stat_cells(column: &AssignmentColumn) -> [String; 3] {
    match &column.summary {
        Some(s) => [
            format!("{:.2}", s.mean),
            format!("{:.2}", s.median),
            format!("{:.2}", s.std_dev),
        ],
        None => [NO_DATA.to_string(), NO_DATA.to_string(), NO_DATA.to_string()],
    }
}

pub(crate) fn to_table(columns: &[AssignmentColumn]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Assignment",
        "Scored",
        "Missing",
        "Excused",
        "Mean",
        "Median",
        "SD",
    ]);

    for column in columns {
        let [mean, median, sd] = stat_cells(column);
        table.add_row(vec![
            Cell::new(&column.name),
            Cell::new(column.scored.len()),
            Cell::new(column.missing.len()),
            Cell::new(column.excused.len()),
            Cell::new(mean),
            Cell::new(median),
            Cell::new(sd),
        ]);
    }

    table
}

fn to_markdown(columns: &[AssignmentColumn]) -> String {
    let mut md = String::new();
    md.push_str("| Assignment | Scored | Missing | Excused | Mean | Median | SD |\n");
    md.push_str("|------------|--------|---------|---------|------|--------|----|\n");
    for column in columns {
        let [mean, median, sd] = stat_cells(column);
        md.push_str(&format!(
            "| {} | {} | {} | {} | {mean} | {median} | {sd} |\n",
            column.name,
            column.scored.len(),
            column.missing.len(),
            column.excused.len()
        ));
    }
    md
}
