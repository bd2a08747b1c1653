//! The `ohms grades` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use ohms_client::config::load_config_from;
use ohms_core::cutoffs::{GradeCounts, LetterCutoffs};
use ohms_core::parser;
use ohms_core::report::GradebookReport;

pub fn execute(
    gradebook_path: PathBuf,
    cutoffs: Option<String>,
    assignment: Option<String>,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let cutoffs: LetterCutoffs = match cutoffs {
        Some(list) => list
            .parse()
            .map_err(|e: String| anyhow::anyhow!("--cutoffs: {e}"))?,
        None => load_config_from(config_path.as_deref())?.grading.cutoffs,
    };
    let gradebook = parser::parse_gradebook(&gradebook_path)?;

    if let Some(path) = &output {
        let report = GradebookReport::build(&gradebook, &cutoffs);
        report.save_json(path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    if let Some(id) = assignment {
        let (graded, counts) = gradebook
            .assignment_letters(&id, &cutoffs)
            .with_context(|| format!("in {}", gradebook_path.display()))?;
        match format.as_str() {
            "json" => {
                let rows: Vec<_> = graded
                    .iter()
                    .map(|(student, percent, grade)| {
                        serde_json::json!({"student_id": student, "percent": percent, "grade": grade})
                    })
                    .collect();
                let counts: serde_json::Map<_, _> = counts
                    .iter()
                    .map(|(g, n)| (g.to_string(), serde_json::Value::from(n)))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "assignment": id,
                        "grades": rows,
                        "counts": counts,
                    }))?
                );
            }
            "text" | "markdown" | "md" => {
                let mut table = Table::new();
                table.set_header(vec!["Student", "Percent", "Grade"]);
                for (student, percent, grade) in &graded {
                    table.add_row(vec![
                        Cell::new(student),
                        Cell::new(format!("{percent:.1}%")),
                        Cell::new(grade),
                    ]);
                }
                println!("{id}\n{table}\n{}", distribution(&cutoffs, &counts));
            }
            other => anyhow::bail!("unknown format '{other}' (expected text, json or markdown)"),
        }
        return Ok(());
    }

    match format.as_str() {
        "json" => {
            let letters = gradebook.letter_report(&cutoffs);
            println!("{}", serde_json::to_string_pretty(&letters)?);
        }
        "markdown" | "md" => {
            print!("{}", GradebookReport::build(&gradebook, &cutoffs).to_markdown());
        }
        "text" => {
            let letters = gradebook.letter_report(&cutoffs);
            let mut table = Table::new();
            table.set_header(vec!["Student", "Name", "Percent", "Grade"]);
            for g in &letters.grades {
                table.add_row(vec![
                    Cell::new(&g.student_id),
                    Cell::new(&g.name),
                    Cell::new(
                        g.percent
                            .map(|p| format!("{p:.1}%"))
                            .unwrap_or_else(|| "-".into()),
                    ),
                    Cell::new(g.grade.map(|g| g.to_string()).unwrap_or_else(|| "-".into())),
                ]);
            }
            println!("{table}\n{}", distribution(&cutoffs, &letters.counts));
        }
        other => anyhow::bail!("unknown format '{other}' (expected text, json or markdown)"),
    }

    Ok(())
}

fn distribution(cutoffs: &LetterCutoffs, counts: &GradeCounts) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Grade", "Cutoff", "Students"]);
    for (i, (grade, count)) in counts.iter().enumerate() {
        let cutoff = cutoffs
            .values()
            .get(i)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![Cell::new(grade), Cell::new(cutoff), Cell::new(count)]);
    }
    table
}
