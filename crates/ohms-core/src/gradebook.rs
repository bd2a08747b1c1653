//! Gradebook snapshots and the views derived from them.
//!
//! A `Gradebook` is an immutable value. Acknowledged admin edits produce a
//! fresh snapshot through [`Gradebook::apply`]; columns and letter grades are
//! always recomputed from the snapshot they are asked of.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::column::{AssignmentColumn, Cell};
use crate::cutoffs::{GradeCounts, LetterCutoffs, LetterGrade};
use crate::model::AdminUpdate;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradebookError {
    #[error("unknown student: {0}")]
    UnknownStudent(String),

    #[error("unknown assignment: {0}")]
    UnknownAssignment(String),

    #[error("duplicate student id: {0}")]
    DuplicateStudent(String),

    #[error("duplicate assignment id: {0}")]
    DuplicateAssignment(String),

    #[error("invalid max score for {assignment}: {value}")]
    InvalidMaxScore { assignment: String, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Zero means the assignment is not counted toward the course grade.
    #[serde(default)]
    pub max_score: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl Assignment {
    pub fn new(id: &str, max_score: f64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            max_score,
            category: String::new(),
            start_date: None,
            due_date: None,
        }
    }
}

/// One student's course standing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentGrade {
    pub student_id: String,
    pub name: String,
    /// `None` when no counted assignment applies to the student.
    pub percent: Option<f64>,
    pub grade: Option<LetterGrade>,
}

/// Letter grades for the whole roster plus the population of each grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterReport {
    pub cutoffs: LetterCutoffs,
    pub grades: Vec<StudentGrade>,
    pub counts: GradeCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gradebook {
    students: Vec<Student>,
    assignments: Vec<Assignment>,
    /// assignment id -> student id -> cell; absent cells are `Missing`.
    cells: BTreeMap<String, BTreeMap<String, Cell>>,
}

impl Gradebook {
    pub fn new(students: Vec<Student>, assignments: Vec<Assignment>) -> Result<Self, GradebookError> {
        let mut seen = HashSet::new();
        for s in &students {
            if !seen.insert(s.id.as_str()) {
                return Err(GradebookError::DuplicateStudent(s.id.clone()));
            }
        }
        let mut seen = HashSet::new();
        for a in &assignments {
            if !seen.insert(a.id.as_str()) {
                return Err(GradebookError::DuplicateAssignment(a.id.clone()));
            }
            check_max_score(&a.id, a.max_score)?;
        }
        Ok(Self {
            students,
            assignments,
            cells: BTreeMap::new(),
        })
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn assignment(&self, id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    fn require_assignment(&self, id: &str) -> Result<usize, GradebookError> {
        self.assignments
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| GradebookError::UnknownAssignment(id.to_string()))
    }

    fn require_student(&self, id: &str) -> Result<(), GradebookError> {
        if self.students.iter().any(|s| s.id == id) {
            Ok(())
        } else {
            Err(GradebookError::UnknownStudent(id.to_string()))
        }
    }

    pub fn cell(&self, student_id: &str, assignment_id: &str) -> Cell {
        self.cells
            .get(assignment_id)
            .and_then(|column| column.get(student_id))
            .copied()
            .unwrap_or(Cell::Missing)
    }

    /// Enter one cell while building a snapshot.
    pub fn set_cell(
        &mut self,
        student_id: &str,
        assignment_id: &str,
        cell: Cell,
    ) -> Result<(), GradebookError> {
        self.require_student(student_id)?;
        self.require_assignment(assignment_id)?;
        let column = self.cells.entry(assignment_id.to_string()).or_default();
        match cell {
            Cell::Missing => {
                column.remove(student_id);
            }
            other => {
                column.insert(student_id.to_string(), other);
            }
        }
        Ok(())
    }

    /// Column for one assignment, in roster order.
    pub fn column(&self, assignment_id: &str) -> Result<AssignmentColumn, GradebookError> {
        let index = self.require_assignment(assignment_id)?;
        let assignment = &self.assignments[index];
        let name = if assignment.name.is_empty() {
            &assignment.id
        } else {
            &assignment.name
        };
        Ok(AssignmentColumn::from_roster(
            name,
            self.students
                .iter()
                .map(|s| (s.id.as_str(), self.cell(&s.id, assignment_id))),
        ))
    }

    /// Every column, in assignment order.
    pub fn columns(&self) -> Vec<AssignmentColumn> {
        self.assignments
            .iter()
            .filter_map(|a| self.column(&a.id).ok())
            .collect()
    }

    /// Each student's percentage of the points available to them.
    ///
    /// Excused cells drop out of both sides; missing cells count as zero.
    /// Assignments without a positive max score are ignored.
    pub fn course_percentages(&self) -> Vec<(String, Option<f64>)> {
        self.students
            .iter()
            .map(|student| {
                let mut earned = 0.0;
                let mut possible = 0.0;
                for assignment in self.assignments.iter().filter(|a| a.max_score > 0.0) {
                    match self.cell(&student.id, &assignment.id) {
                        Cell::Excused => {}
                        Cell::Missing => possible += assignment.max_score,
                        Cell::Scored(s) => {
                            earned += s;
                            possible += assignment.max_score;
                        }
                    }
                }
                let percent = (possible > 0.0).then(|| 100.0 * earned / possible);
                (student.id.clone(), percent)
            })
            .collect()
    }

    /// Course letter grades for the roster.
    pub fn letter_report(&self, cutoffs: &LetterCutoffs) -> LetterReport {
        let percentages = self.course_percentages();
        let (graded, counts) = cutoffs.assign(
            percentages
                .iter()
                .filter_map(|(id, p)| p.map(|p| (id.as_str(), p))),
        );
        let mut graded = graded.into_iter();

        let grades = self
            .students
            .iter()
            .zip(&percentages)
            .map(|(student, (_, percent))| {
                // `assign` preserves order, so graded entries line up with
                // the students that have a percentage.
                let grade = percent.and_then(|_| graded.next().map(|(_, _, g)| g));
                StudentGrade {
                    student_id: student.id.clone(),
                    name: student.name.clone(),
                    percent: *percent,
                    grade,
                }
            })
            .collect();

        LetterReport {
            cutoffs: *cutoffs,
            grades,
            counts,
        }
    }

    /// Letter grades over one assignment's scored cells.
    ///
    /// Scores are taken as a percentage of the max score when it is positive.
    pub fn assignment_letters(
        &self,
        assignment_id: &str,
        cutoffs: &LetterCutoffs,
    ) -> Result<(Vec<(String, f64, LetterGrade)>, GradeCounts), GradebookError> {
        let column = self.column(assignment_id)?;
        let max_score = self.assignments[self.require_assignment(assignment_id)?].max_score;
        let scores = if max_score > 0.0 {
            column.normalized(max_score)
        } else {
            column.scored.clone()
        };
        Ok(cutoffs.assign(scores.iter().map(|(id, s)| (id.as_str(), *s))))
    }

    /// A new snapshot with an acknowledged admin edit applied.
    pub fn apply(&self, update: &AdminUpdate) -> Result<Gradebook, GradebookError> {
        let mut next = self.clone();
        match update {
            AdminUpdate::Grade {
                student_id,
                assignment_id,
                score,
            } => next.set_cell(student_id, assignment_id, *score)?,
            AdminUpdate::MaxScore {
                assignment_id,
                max_score,
            } => {
                check_max_score(assignment_id, *max_score)?;
                let i = next.require_assignment(assignment_id)?;
                next.assignments[i].max_score = *max_score;
            }
            AdminUpdate::Category {
                assignment_id,
                category,
            } => {
                let i = next.require_assignment(assignment_id)?;
                next.assignments[i].category = category.clone();
            }
            AdminUpdate::DueDate {
                assignment_id,
                start_date,
                due_date,
            } => {
                let i = next.require_assignment(assignment_id)?;
                next.assignments[i].start_date = Some(start_date.clone());
                next.assignments[i].due_date = Some(due_date.clone());
            }
            AdminUpdate::AddHomework {
                name,
                start_date,
                due_date,
            } => {
                if next.assignment(name).is_some() {
                    return Err(GradebookError::DuplicateAssignment(name.clone()));
                }
                next.assignments.push(Assignment {
                    id: name.clone(),
                    name: name.clone(),
                    max_score: 0.0,
                    category: String::new(),
                    start_date: Some(start_date.clone()),
                    due_date: Some(due_date.clone()),
                });
            }
            // Question content lives on the server; the gradebook is unchanged.
            AdminUpdate::AddQuestion { assignment_id, .. } => {
                next.require_assignment(assignment_id)?;
            }
        }
        debug!(endpoint = update.endpoint(), "gradebook edit applied");
        Ok(next)
    }
}

fn check_max_score(assignment: &str, value: f64) -> Result<(), GradebookError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GradebookError::InvalidMaxScore {
            assignment: assignment.to_string(),
            value,
        })
    }
}
