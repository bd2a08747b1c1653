//! Letter grades from score cutoffs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of passing letter grades (A+ through D-).
pub const CUTOFF_COUNT: usize = 12;

/// The conventional 97/93/90 ... 63/60 scale.
pub const DEFAULT_CUTOFFS: [f64; CUTOFF_COUNT] =
    [97.0, 93.0, 90.0, 87.0, 83.0, 80.0, 77.0, 73.0, 70.0, 67.0, 63.0, 60.0];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CutoffError {
    #[error("expected 12 cutoffs, got {0}")]
    WrongCount(usize),

    #[error("cutoff for {grade} is not a finite number")]
    NotFinite { grade: LetterGrade },

    #[error("cutoff for {lower} ({lower_value}) is above the cutoff for {upper} ({upper_value})")]
    Increasing {
        upper: LetterGrade,
        upper_value: f64,
        lower: LetterGrade,
        lower_value: f64,
    },
}

/// A letter grade, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D-")]
    DMinus,
    #[serde(rename = "NP")]
    NoPass,
}

impl LetterGrade {
    /// All grades, best first; index `i < 12` pairs with cutoff `i`.
    pub const ALL: [LetterGrade; CUTOFF_COUNT + 1] = [
        LetterGrade::APlus,
        LetterGrade::A,
        LetterGrade::AMinus,
        LetterGrade::BPlus,
        LetterGrade::B,
        LetterGrade::BMinus,
        LetterGrade::CPlus,
        LetterGrade::C,
        LetterGrade::CMinus,
        LetterGrade::DPlus,
        LetterGrade::D,
        LetterGrade::DMinus,
        LetterGrade::NoPass,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::DPlus => "D+",
            LetterGrade::D => "D",
            LetterGrade::DMinus => "D-",
            LetterGrade::NoPass => "NP",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LetterGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        LetterGrade::ALL
            .iter()
            .copied()
            .find(|g| g.label() == wanted)
            .ok_or_else(|| format!("unknown letter grade: {s}"))
    }
}

/// Twelve non-increasing thresholds for A+ down to D-.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct LetterCutoffs([f64; CUTOFF_COUNT]);

impl LetterCutoffs {
    pub fn new(values: &[f64]) -> Result<Self, CutoffError> {
        if values.len() != CUTOFF_COUNT {
            return Err(CutoffError::WrongCount(values.len()));
        }
        for (i, v) in values.iter().enumerate() {
            if !v.is_finite() {
                return Err(CutoffError::NotFinite {
                    grade: LetterGrade::ALL[i],
                });
            }
        }
        for i in 1..CUTOFF_COUNT {
            if values[i] > values[i - 1] {
                return Err(CutoffError::Increasing {
                    upper: LetterGrade::ALL[i - 1],
                    upper_value: values[i - 1],
                    lower: LetterGrade::ALL[i],
                    lower_value: values[i],
                });
            }
        }
        let mut cutoffs = [0.0; CUTOFF_COUNT];
        cutoffs.copy_from_slice(values);
        Ok(Self(cutoffs))
    }

    pub fn values(&self) -> &[f64; CUTOFF_COUNT] {
        &self.0
    }

    /// Grade for one score.
    ///
    /// A score equal to a cutoff earns that cutoff's grade, except at the
    /// bottom: a score at or below the D- cutoff, or NaN, is NP.
    pub fn grade(&self, score: f64) -> LetterGrade {
        if score >= self.0[0] {
            return LetterGrade::APlus;
        }
        if score.is_nan() || score <= self.0[CUTOFF_COUNT - 1] {
            return LetterGrade::NoPass;
        }
        self.0
            .iter()
            .position(|&cutoff| score >= cutoff)
            .map(|i| LetterGrade::ALL[i])
            .unwrap_or(LetterGrade::NoPass)
    }

    /// Grade every student and count the population of each grade.
    pub fn assign<'a, I>(&self, scores: I) -> (Vec<(String, f64, LetterGrade)>, GradeCounts)
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut counts = GradeCounts::default();
        let graded = scores
            .into_iter()
            .map(|(student, score)| {
                let grade = self.grade(score);
                counts.add(grade);
                (student.to_string(), score, grade)
            })
            .collect();
        (graded, counts)
    }
}

impl Default for LetterCutoffs {
    fn default() -> Self {
        Self(DEFAULT_CUTOFFS)
    }
}

impl TryFrom<Vec<f64>> for LetterCutoffs {
    type Error = CutoffError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        LetterCutoffs::new(&values)
    }
}

impl From<LetterCutoffs> for Vec<f64> {
    fn from(cutoffs: LetterCutoffs) -> Self {
        cutoffs.0.to_vec()
    }
}

impl FromStr for LetterCutoffs {
    type Err = String;

    /// Parse a comma-separated list such as `"97,93,90,..."`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("invalid cutoff: '{}'", part.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        LetterCutoffs::new(&values).map_err(|e| e.to_string())
    }
}

/// Number of students holding each letter grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCounts([usize; CUTOFF_COUNT + 1]);

impl GradeCounts {
    fn add(&mut self, grade: LetterGrade) {
        self.0[grade.index()] += 1;
    }

    pub fn get(&self, grade: LetterGrade) -> usize {
        self.0[grade.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// (grade, count) pairs, best grade first.
    pub fn iter(&self) -> impl Iterator<Item = (LetterGrade, usize)> + '_ {
        LetterGrade::ALL.into_iter().map(move |g| (g, self.get(g)))
    }
}
