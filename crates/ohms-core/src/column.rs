//! Per-assignment gradebook columns and their summary statistics.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rendered in place of statistics for a column with no scored cells.
pub const NO_DATA: &str = "no data";

/// One gradebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCell", into = "RawCell")]
pub enum Cell {
    Scored(f64),
    /// Not yet entered (blank in the gradebook).
    Missing,
    /// Not counted.
    Excused,
}

impl Cell {
    pub fn score(&self) -> Option<f64> {
        match self {
            Cell::Scored(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Scored(s) => write!(f, "{s}"),
            Cell::Missing => Ok(()),
            Cell::Excused => write!(f, "EX"),
        }
    }
}

impl FromStr for Cell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "missing" => Ok(Cell::Missing),
            "ex" | "excused" => Ok(Cell::Excused),
            _ => {
                let value: f64 = trimmed
                    .parse()
                    .map_err(|_| format!("not a score: '{trimmed}'"))?;
                if value.is_finite() {
                    Ok(Cell::Scored(value))
                } else {
                    Err(format!("not a score: '{trimmed}'"))
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCell {
    Number(f64),
    Text(String),
}

impl TryFrom<RawCell> for Cell {
    type Error = String;

    fn try_from(raw: RawCell) -> Result<Self, Self::Error> {
        match raw {
            RawCell::Number(n) if n.is_finite() => Ok(Cell::Scored(n)),
            RawCell::Number(n) => Err(format!("not a score: {n}")),
            RawCell::Text(s) => s.parse(),
        }
    }
}

impl From<Cell> for RawCell {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Scored(s) => RawCell::Number(s),
            other => RawCell::Text(other.to_string()),
        }
    }
}

/// Summary statistics over the scored cells of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (divides by `count`).
    pub std_dev: f64,
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} mean={:.2} median={:.2} sd={:.2}",
            self.count, self.mean, self.median, self.std_dev
        )
    }
}

/// Derived view over the roster for one assignment.
///
/// Every student lands in exactly one of `scored`, `missing` or `excused`,
/// in roster order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentColumn {
    pub name: String,
    pub scored: Vec<(String, f64)>,
    pub missing: Vec<String>,
    pub excused: Vec<String>,
    /// `None` when nothing is scored.
    pub summary: Option<ScoreSummary>,
}

impl AssignmentColumn {
    /// Partition a roster snapshot and compute its statistics.
    pub fn from_roster<'a, I>(name: &str, roster: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Cell)>,
    {
        let mut scored = Vec::new();
        let mut missing = Vec::new();
        let mut excused = Vec::new();
        let mut sum = 0.0f64;

        for (student, cell) in roster {
            match cell {
                Cell::Scored(s) => {
                    sum += s;
                    scored.push((student.to_string(), s));
                }
                Cell::Missing => missing.push(student.to_string()),
                Cell::Excused => excused.push(student.to_string()),
            }
        }

        let values: Vec<f64> = scored.iter().map(|(_, s)| *s).collect();
        let summary = summarize(&values, sum);

        Self {
            name: name.to_string(),
            scored,
            missing,
            excused,
            summary,
        }
    }

    /// Number of roster entries, whatever their state.
    pub fn roster_len(&self) -> usize {
        self.scored.len() + self.missing.len() + self.excused.len()
    }

    /// Scored values in roster order, as fed to a chart.
    pub fn scored_values(&self) -> Vec<f64> {
        self.scored.iter().map(|(_, s)| *s).collect()
    }

    /// Each scored student's percentage of `max_score`.
    ///
    /// Empty when `max_score` is not positive.
    pub fn normalized(&self, max_score: f64) -> Vec<(String, f64)> {
        if max_score <= 0.0 || !max_score.is_finite() {
            return Vec::new();
        }
        self.scored
            .iter()
            .map(|(id, s)| (id.clone(), 100.0 * s / max_score))
            .collect()
    }

    /// Mean, median and SD formatted for display, or [`NO_DATA`].
    pub fn describe(&self) -> String {
        match &self.summary {
            Some(summary) => summary.to_string(),
            None => NO_DATA.to_string(),
        }
    }
}

fn summarize(values: &[f64], sum: f64) -> Option<ScoreSummary> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = sum / n;
    // Second pass over deviations; sum_sq/n - mean^2 cancels badly for
    // large, tightly clustered scores.
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(ScoreSummary {
        count: values.len(),
        mean,
        median: median(values)?,
        std_dev: variance.sqrt(),
    })
}

/// Middle element, or mean of the two middle elements for an even count.
fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}
