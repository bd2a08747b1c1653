//! The `ohms validate` command.

use std::path::PathBuf;

use anyhow::Result;

use ohms_core::parser;

pub fn execute(homework_path: PathBuf) -> Result<()> {
    let pages = if homework_path.is_dir() {
        parser::load_homework_directory(&homework_path)?
    } else {
        vec![parser::parse_homework(&homework_path)?]
    };

    let mut total_warnings = 0;

    for page in &pages {
        let points: f64 = page.questions.iter().map(|q| q.points).sum();
        println!(
            "Homework: {} ({} questions, {} points)",
            page.name,
            page.questions.len(),
            points
        );

        let warnings = parser::validate_homework(page);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All homework files valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
