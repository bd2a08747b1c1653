//! Gradebook reports with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::column::{AssignmentColumn, NO_DATA};
use crate::cutoffs::LetterCutoffs;
use crate::gradebook::{Gradebook, LetterReport};

/// Column statistics and letter grades computed from one gradebook snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradebookReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub student_count: usize,
    pub columns: Vec<AssignmentColumn>,
    pub letters: LetterReport,
}

impl GradebookReport {
    pub fn build(gradebook: &Gradebook, cutoffs: &LetterCutoffs) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            student_count: gradebook.students().len(),
            columns: gradebook.columns(),
            letters: gradebook.letter_report(cutoffs),
        }
    }

    pub fn column(&self, name: &str) -> Option<&AssignmentColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradebookReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Gradebook:** {} students, {} assignments\n\n",
            self.student_count,
            self.columns.len()
        ));

        md.push_str("### Assignments\n\n");
        md.push_str("| Assignment | Scored | Missing | Excused | Mean | Median | SD |\n");
        md.push_str("|------------|--------|---------|---------|------|--------|----|\n");
        for c in &self.columns {
            match &c.summary {
                Some(s) => md.push_str(&format!(
                    "| {} | {} | {} | {} | {:.2} | {:.2} | {:.2} |\n",
                    c.name,
                    s.count,
                    c.missing.len(),
                    c.excused.len(),
                    s.mean,
                    s.median,
                    s.std_dev
                )),
                None => md.push_str(&format!(
                    "| {} | 0 | {} | {} | {NO_DATA} | {NO_DATA} | {NO_DATA} |\n",
                    c.name,
                    c.missing.len(),
                    c.excused.len()
                )),
            }
        }
        md.push('\n');

        md.push_str("### Letter grades\n\n");
        md.push_str("| Grade | Cutoff | Students |\n");
        md.push_str("|-------|--------|----------|\n");
        let cutoffs = self.letters.cutoffs.values();
        for (i, (grade, count)) in self.letters.counts.iter().enumerate() {
            let cutoff = cutoffs
                .get(i)
                .map(|c| format!("{c}"))
                .unwrap_or_else(|| "-".into());
            md.push_str(&format!("| {grade} | {cutoff} | {count} |\n"));
        }
        md.push('\n');

        md.push_str("### Students\n\n");
        md.push_str("| Student | Percent | Grade |\n");
        md.push_str("|---------|---------|-------|\n");
        for g in &self.letters.grades {
            let label = if g.name.is_empty() { &g.student_id } else { &g.name };
            let percent = g
                .percent
                .map(|p| format!("{p:.1}%"))
                .unwrap_or_else(|| NO_DATA.into());
            let grade = g.grade.map(|g| g.to_string()).unwrap_or_else(|| "-".into());
            md.push_str(&format!("| {label} | {percent} | {grade} |\n"));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Cell;
    use crate::cutoffs::LetterGrade;
    use crate::gradebook::{Assignment, Student};

    fn make_gradebook() -> Gradebook {
        let students = vec![
            Student {
                id: "S1".into(),
                name: "Ada".into(),
            },
            Student {
                id: "S2".into(),
                name: String::new(),
            },
        ];
        let mut gb = Gradebook::new(
            students,
            vec![Assignment::new("hw1", 10.0), Assignment::new("quiz", 5.0)],
        )
        .unwrap();
        gb.set_cell("S1", "hw1", Cell::Scored(9.0)).unwrap();
        gb.set_cell("S2", "hw1", Cell::Scored(6.0)).unwrap();
        gb.set_cell("S1", "quiz", Cell::Excused).unwrap();
        gb.set_cell("S2", "quiz", Cell::Excused).unwrap();
        gb
    }

    #[test]
    fn build_collects_columns_and_letters() {
        let report = GradebookReport::build(&make_gradebook(), &LetterCutoffs::default());
        assert_eq!(report.student_count, 2);
        assert_eq!(report.columns.len(), 2);
        assert!(report.column("quiz").unwrap().summary.is_none());
        assert_eq!(report.letters.grades[0].grade, Some(LetterGrade::AMinus));
        assert_eq!(report.letters.grades[1].grade, Some(LetterGrade::NoPass));
    }

    #[test]
    fn json_roundtrip() {
        let report = GradebookReport::build(&make_gradebook(), &LetterCutoffs::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = GradebookReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.columns, report.columns);
        assert_eq!(loaded.letters, report.letters);
    }

    #[test]
    fn markdown_output() {
        let md = GradebookReport::build(&make_gradebook(), &LetterCutoffs::default()).to_markdown();
        assert!(md.contains("| hw1 | 2 | 0 | 0 | 7.50 | 7.50 | 1.50 |"));
        assert!(md.contains("| quiz | 0 | 0 | 2 | no data |"));
        assert!(md.contains("| A- | 90 | 1 |"));
        assert!(md.contains("| D- | 60 | 0 |"));
        assert!(md.contains("| NP | - | 1 |"));
        assert!(md.contains("| S2 | 60.0% | NP |"));
    }
}
