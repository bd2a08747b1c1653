//! The `ohms init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_once(Path::new("ohms.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("homework").context("failed to create homework/")?;
    write_once(Path::new("homework/example.toml"), EXAMPLE_HOMEWORK)?;
    write_once(Path::new("gradebook.toml"), EXAMPLE_GRADEBOOK)?;

    println!("\nNext steps:");
    println!("  1. Point base_url in ohms.toml at your homework server");
    println!("  2. Run: ohms validate --homework homework/example.toml");
    println!("  3. Run: ohms stats --gradebook gradebook.toml");
    println!("  4. Run: ohms grades --gradebook gradebook.toml");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# ohms configuration

# OHMS_BASE_URL overrides this; ${VAR} references are expanded.
base_url = "http://localhost:8080"
timeout_secs = 30
parallelism = 4

[grading]
# A+ A A- B+ B B- C+ C C- D+ D D-
cutoffs = [97, 93, 90, 87, 83, 80, 77, 73, 70, 67, 63, 60]
"#;

const EXAMPLE_HOMEWORK: &str = r#"[homework]
id = "hw1"
name = "Homework 1: Sampling"
due_date = "10/09/2013 23:59:00"

[[questions]]
id = "hw1-q1"
name = "Sampling frame"
points = 2

[[questions.items]]
type = "multiple-choice"
options = ["a", "b", "c", "d"]

[[questions]]
id = "hw1-q2"
name = "Standard error"
points = 3

[[questions.items]]
type = "short-answer"

[[questions.items]]
type = "short-answer"

[[questions]]
id = "hw1-q3"
name = "Interpretation"
points = 5

[[questions.items]]
type = "long-answer"
"#;

const EXAMPLE_GRADEBOOK: &str = r#"[[assignments]]
id = "hw1"
name = "Homework 1"
max_score = 10
category = "Homework"

[[assignments]]
id = "hw2"
name = "Homework 2"
max_score = 10
category = "Homework"

[[students]]
id = "S1"
name = "Ada Lovelace"
scores = { hw1 = 10, hw2 = 9 }

[[students]]
id = "S2"
name = "Grace Hopper"
scores = { hw1 = 8, hw2 = "EX" }

[[students]]
id = "S3"
name = "Alan Turing"
scores = { hw1 = 6 }
"#;
