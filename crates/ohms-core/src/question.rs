//! The per-question submission state machine.
//!
//! A question starts out `Loading` with every item locked. `load` brings it
//! to `Ready`, locked or not as the server says; a load that fails or is
//! dropped leaves it `Ready` and unlocked. `submit` locks the items
//! before the request leaves, so a second submit while one is outstanding is
//! refused instead of racing the first; any outcome, including the future
//! being dropped, releases the lock unless the server asks to keep it.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{QuestionError, ValidationError};
use crate::item::{AnswerItem, RichTextEditor};
use crate::model::{Comments, LoadResponse, QuestionLayout, QuestionSource, Submission, SubmitResponse};
use crate::traits::{HomeworkApi, PageHooks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    Ready,
    Submitting,
}

/// How a score is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    FullCredit,
    PartialCredit,
    /// Not graded yet. Only the score is withheld: the comment block and
    /// per-item comments are still shown.
    Pending,
}

/// Rendered score, comments and submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub band: ScoreBand,
    pub score: Option<f64>,
    pub points: f64,
    pub headline: String,
    /// Question-level comment block. Per-item comments go to the items.
    pub comments: Option<String>,
    pub time: String,
}

impl Feedback {
    pub fn render(points: f64, submission: &Submission) -> Self {
        let (band, headline) = match submission.score {
            Some(score) if score == points => (
                ScoreBand::FullCredit,
                format!("Congrats! You've earned all {points} points."),
            ),
            Some(score) => (
                ScoreBand::PartialCredit,
                format!("You have earned {score} out of {points} points."),
            ),
            None => (ScoreBand::Pending, "SCORE PENDING".to_string()),
        };
        let comments = match &submission.comments {
            Some(Comments::Single(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        };
        let time = if submission.time.is_empty() {
            String::new()
        } else {
            format!("Last submission at {}", submission.time)
        };
        Self {
            band,
            score: submission.score,
            points,
            headline,
            comments,
            time,
        }
    }
}

/// Result of a completed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub feedback: Feedback,
    /// The server is keeping the question closed.
    pub locked: bool,
}

/// Point-in-time copy of a question for rendering.
#[derive(Debug, Clone)]
pub struct QuestionSnapshot {
    pub id: String,
    pub name: String,
    pub points: f64,
    pub phase: Phase,
    pub submit_enabled: bool,
    pub items: Vec<AnswerItem>,
    pub submission: Option<Submission>,
    pub feedback: Option<Feedback>,
    pub source: Option<QuestionSource>,
    pub last_error: Option<String>,
}

impl QuestionSnapshot {
    pub fn is_locked(&self) -> bool {
        !self.submit_enabled
    }
}

struct QuestionState {
    phase: Phase,
    items: Vec<AnswerItem>,
    submit_enabled: bool,
    submission: Option<Submission>,
    feedback: Option<Feedback>,
    source: Option<QuestionSource>,
    last_error: Option<String>,
}

impl QuestionState {
    /// Items and the submit control always move together.
    fn set_locked(&mut self, locked: bool) {
        for item in &mut self.items {
            if locked {
                item.lock();
            } else {
                item.unlock();
            }
        }
        self.submit_enabled = !locked;
    }

    fn is_locked(&self) -> bool {
        !self.submit_enabled
    }

    fn collect_responses(&self) -> Result<Vec<String>, ValidationError> {
        self.items
            .iter()
            .map(|item| match item.get_value() {
                None => Err(ValidationError::Unanswered {
                    index: item.index(),
                }),
                Some(value) if value.trim().is_empty() => Err(ValidationError::Empty {
                    index: item.index(),
                }),
                Some(value) => Ok(value),
            })
            .collect()
    }

    fn apply_submission(&mut self, points: f64, submission: &Submission) -> Feedback {
        if let Some(Comments::PerItem(per_item)) = &submission.comments {
            for (item, comment) in self.items.iter_mut().zip(per_item) {
                if let Some(comment) = comment {
                    item.set_feedback(comment);
                }
            }
        }
        let feedback = Feedback::render(points, submission);
        self.feedback = Some(feedback.clone());
        self.submission = Some(submission.clone());
        feedback
    }
}

/// Releases the lock if a load or submit future is dropped mid-flight.
struct InFlight<'a> {
    question: &'a Question,
    request: &'static str,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn arm(question: &'a Question, request: &'static str) -> Self {
        Self {
            question,
            request,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(question = %self.question.id, request = self.request, "request abandoned before completion");
            let mut st = self.question.state();
            st.set_locked(false);
            st.phase = Phase::Ready;
        }
    }
}

/// A gradable unit of one or more answer items.
pub struct Question {
    id: String,
    name: String,
    points: f64,
    api: Arc<dyn HomeworkApi>,
    hooks: Arc<dyn PageHooks>,
    state: Mutex<QuestionState>,
}

impl Question {
    pub fn new(layout: &QuestionLayout, api: Arc<dyn HomeworkApi>, hooks: Arc<dyn PageHooks>) -> Self {
        let items = layout
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| AnswerItem::from_layout(&layout.id, i, item))
            .collect();
        let mut state = QuestionState {
            phase: Phase::Loading,
            items,
            submit_enabled: true,
            submission: None,
            feedback: None,
            source: None,
            last_error: None,
        };
        state.set_locked(true);

        Self {
            id: layout.id.clone(),
            name: layout.name.clone(),
            points: layout.points,
            api,
            hooks,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, QuestionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn is_locked(&self) -> bool {
        self.state().is_locked()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.state().feedback.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn snapshot(&self) -> QuestionSnapshot {
        let st = self.state();
        QuestionSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            points: self.points,
            phase: st.phase,
            submit_enabled: st.submit_enabled,
            items: st.items.clone(),
            submission: st.submission.clone(),
            feedback: st.feedback.clone(),
            source: st.source.clone(),
            last_error: st.last_error.clone(),
        }
    }

    /// Current value of one item.
    pub fn value(&self, index: usize) -> Result<Option<String>, QuestionError> {
        let st = self.state();
        let item = st.items.get(index).ok_or(QuestionError::NoSuchItem(index))?;
        Ok(item.get_value())
    }

    /// Student edit of one item.
    pub fn set_value(&self, index: usize, value: &str) -> Result<(), QuestionError> {
        let mut st = self.state();
        let item = st
            .items
            .get_mut(index)
            .ok_or(QuestionError::NoSuchItem(index))?;
        item.set_value(value)?;
        Ok(())
    }

    /// Back a long-answer item with a rich-text editor.
    pub fn attach_editor(
        &self,
        index: usize,
        editor: Arc<dyn RichTextEditor>,
    ) -> Result<bool, QuestionError> {
        let mut st = self.state();
        let item = st
            .items
            .get_mut(index)
            .ok_or(QuestionError::NoSuchItem(index))?;
        Ok(item.attach_editor(editor))
    }

    pub fn lock(&self) {
        self.state().set_locked(true);
    }

    pub fn unlock(&self) {
        self.state().set_locked(false);
    }

    /// Render a submission's score, comments and time.
    pub fn update(&self, submission: &Submission) -> Feedback {
        self.state().apply_submission(self.points, submission)
    }

    /// Fetch and show the prior submission.
    ///
    /// On failure, or if the future is dropped, the question is left
    /// unlocked and nothing else changes.
    pub async fn load(&self) -> Result<(), QuestionError> {
        {
            let mut st = self.state();
            if st.phase == Phase::Submitting {
                return Err(QuestionError::Locked(self.id.clone()));
            }
            st.phase = Phase::Loading;
        }

        let mut in_flight = InFlight::arm(self, "load");
        let result = self.api.load(&self.id).await;
        in_flight.disarm();

        let outcome = match result {
            Ok(response) => self.apply_load(response),
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(()) => {
                self.hooks.typeset(&self.id);
                Ok(())
            }
            Err(err) => {
                {
                    let mut st = self.state();
                    st.set_locked(false);
                    st.phase = Phase::Ready;
                    st.last_error = Some(err.user_message());
                }
                Err(self.report(err))
            }
        }
    }

    fn apply_load(&self, response: LoadResponse) -> Result<(), QuestionError> {
        let mut st = self.state();
        let expected = st.items.len();

        if let Some(submission) = &response.submission {
            let got = submission.item_responses.len();
            if got != expected {
                return Err(QuestionError::ResponseMismatch { expected, got });
            }
            for (item, stored) in st.items.iter_mut().zip(&submission.item_responses) {
                if let Err(e) = item.restore_value(&stored.response) {
                    warn!(question = %self.id, "stored response not restored: {e}");
                }
            }
            st.apply_submission(self.points, submission);
        }

        st.set_locked(response.locked);

        if let Some(solutions) = &response.solution {
            if solutions.len() != expected {
                warn!(
                    question = %self.id,
                    "{} solutions for {} items",
                    solutions.len(),
                    expected
                );
            }
            for (item, solution) in st.items.iter_mut().zip(solutions) {
                item.set_solution(solution);
            }
        }

        st.phase = Phase::Ready;
        st.last_error = None;
        debug!(question = %self.id, locked = response.locked, "question loaded");
        Ok(())
    }

    /// Validate, lock, send the item values, and show the result.
    pub async fn submit(&self) -> Result<SubmitOutcome, QuestionError> {
        let responses = {
            let mut st = self.state();
            if st.phase != Phase::Ready || st.is_locked() {
                debug!(question = %self.id, phase = ?st.phase, "submit refused while locked");
                return Err(QuestionError::Locked(self.id.clone()));
            }
            let collected = st.collect_responses();
            match collected {
                Ok(responses) => {
                    st.set_locked(true);
                    st.phase = Phase::Submitting;
                    responses
                }
                Err(invalid) => {
                    drop(st);
                    let err = QuestionError::from(invalid);
                    self.hooks.alert(&self.id, &err.user_message());
                    return Err(err);
                }
            }
        };

        let mut in_flight = InFlight::arm(self, "submit");
        debug!(question = %self.id, items = responses.len(), "submitting");
        let result = self.api.submit(&self.id, &responses).await;
        in_flight.disarm();

        let outcome = match result {
            Ok(response) => self.apply_submit(response),
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(outcome) => {
                self.hooks.typeset(&self.id);
                Ok(outcome)
            }
            Err(err) => {
                {
                    let mut st = self.state();
                    st.set_locked(false);
                    st.phase = Phase::Ready;
                    st.last_error = Some(err.user_message());
                }
                Err(self.report(err))
            }
        }
    }

    fn apply_submit(&self, response: SubmitResponse) -> Result<SubmitOutcome, QuestionError> {
        let mut st = self.state();
        let expected = st.items.len();
        // An empty list means the server did not record the responses.
        let got = response.submission.item_responses.len();
        if got != 0 && got != expected {
            return Err(QuestionError::ResponseMismatch { expected, got });
        }

        let feedback = st.apply_submission(self.points, &response.submission);
        st.set_locked(response.locked);
        st.phase = Phase::Ready;
        st.last_error = None;
        debug!(question = %self.id, band = ?feedback.band, locked = response.locked, "submission recorded");

        Ok(SubmitOutcome {
            feedback,
            locked: response.locked,
        })
    }

    /// Replace the question's authored source (admin).
    pub async fn update_source(&self, xml: &str) -> Result<QuestionSource, QuestionError> {
        match self.api.update_question(&self.id, xml).await {
            Ok(source) => {
                self.state().source = Some(source.clone());
                self.hooks.typeset(&self.id);
                Ok(source)
            }
            Err(e) => Err(self.report(e.into())),
        }
    }

    fn report(&self, err: QuestionError) -> QuestionError {
        error!(question = %self.id, "{err}");
        self.hooks.alert(&self.id, &err.user_message());
        err
    }
}
