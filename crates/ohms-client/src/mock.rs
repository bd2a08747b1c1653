//! In-memory homework server for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use ohms_core::error::ApiError;
use ohms_core::model::{
    AdminUpdate, Comments, ItemResponse, LoadResponse, QuestionSource, Submission, SubmitResponse,
    SERVER_DATE_FORMAT,
};
use ohms_core::traits::HomeworkApi;

struct MockQuestion {
    points: f64,
    /// Expected response per item; `None` leaves the item ungraded.
    key: Vec<Option<String>>,
    max_submissions: Option<usize>,
    submissions: Vec<Submission>,
}

impl MockQuestion {
    fn locked(&self) -> bool {
        self.max_submissions
            .is_some_and(|max| self.submissions.len() >= max)
    }

    /// Full points times the fraction of keyed items answered correctly.
    /// Any unkeyed item leaves the score pending.
    fn grade(&self, responses: &[String]) -> (Option<f64>, Vec<Option<String>>) {
        let mut correct = 0usize;
        let mut pending = false;
        let comments = self
            .key
            .iter()
            .zip(responses)
            .map(|(expected, given)| match expected {
                Some(expected) if expected.trim() == given.trim() => {
                    correct += 1;
                    None
                }
                Some(_) => Some("Incorrect.".to_string()),
                None => {
                    pending = true;
                    None
                }
            })
            .collect();
        let score = if pending || self.key.is_empty() {
            None
        } else {
            Some(self.points * correct as f64 / self.key.len() as f64)
        };
        (score, comments)
    }
}

/// A mock homework server for exercising questions without a network.
///
/// Questions are registered with an answer key; submissions are graded and
/// recorded, and a question locks once its submission limit is reached.
pub struct MockBackend {
    questions: Mutex<HashMap<String, MockQuestion>>,
    release_solutions: bool,
    /// Error returned by the next request, whatever it is.
    fail_next: Mutex<Option<ApiError>>,
    load_count: AtomicU32,
    submit_count: AtomicU32,
    admin_log: Mutex<Vec<AdminUpdate>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            questions: Mutex::new(HashMap::new()),
            release_solutions: false,
            fail_next: Mutex::new(None),
            load_count: AtomicU32::new(0),
            submit_count: AtomicU32::new(0),
            admin_log: Mutex::new(Vec::new()),
        }
    }

    /// Register a question graded against `key`.
    pub fn with_question(self, id: &str, points: f64, key: &[&str]) -> Self {
        self.questions.lock().unwrap_or_else(|e| e.into_inner()).insert(
            id.to_string(),
            MockQuestion {
                points,
                key: key.iter().map(|k| Some(k.to_string())).collect(),
                max_submissions: None,
                submissions: Vec::new(),
            },
        );
        self
    }

    /// Register a question whose submissions are never graded.
    pub fn with_ungraded_question(self, id: &str, points: f64, items: usize) -> Self {
        self.questions.lock().unwrap_or_else(|e| e.into_inner()).insert(
            id.to_string(),
            MockQuestion {
                points,
                key: vec![None; items],
                max_submissions: None,
                submissions: Vec::new(),
            },
        );
        self
    }

    pub fn with_submission_limit(self, id: &str, max: usize) -> Self {
        if let Some(q) = self
            .questions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(id)
        {
            q.max_submissions = Some(max);
        }
        self
    }

    /// Include answer keys in `load` responses.
    pub fn with_released_solutions(mut self) -> Self {
        self.release_solutions = true;
        self
    }

    pub fn fail_next(&self, err: ApiError) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(err);
    }

    pub fn load_count(&self) -> u32 {
        self.load_count.load(Ordering::Relaxed)
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::Relaxed)
    }

    /// Admin edits acknowledged so far, oldest first.
    pub fn admin_log(&self) -> Vec<AdminUpdate> {
        self.admin_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn take_failure(&self) -> Result<(), ApiError> {
        match self.fail_next.lock().unwrap_or_else(|e| e.into_inner()).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_question(id: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("Question {id} does not exist."),
    }
}

#[async_trait]
impl HomeworkApi for MockBackend {
    async fn load(&self, question_id: &str) -> Result<LoadResponse, ApiError> {
        self.load_count.fetch_add(1, Ordering::Relaxed);
        self.take_failure()?;

        let questions = self.questions.lock().unwrap_or_else(|e| e.into_inner());
        let q = questions
            .get(question_id)
            .ok_or_else(|| unknown_question(question_id))?;
        let solution = self.release_solutions.then(|| {
            q.key
                .iter()
                .map(|k| k.clone().unwrap_or_default())
                .collect()
        });
        Ok(LoadResponse {
            locked: q.locked(),
            submission: q.submissions.last().cloned(),
            solution,
        })
    }

    async fn submit(&self, question_id: &str, responses: &[String]) -> Result<SubmitResponse, ApiError> {
        self.submit_count.fetch_add(1, Ordering::Relaxed);
        self.take_failure()?;

        let mut questions = self.questions.lock().unwrap_or_else(|e| e.into_inner());
        let q = questions
            .get_mut(question_id)
            .ok_or_else(|| unknown_question(question_id))?;

        if q.locked() {
            return Err(ApiError::Status {
                status: 403,
                message: "You have no submissions remaining for this question.".into(),
            });
        }
        if responses.len() != q.key.len() {
            return Err(ApiError::Status {
                status: 400,
                message: format!("Expected {} responses, got {}.", q.key.len(), responses.len()),
            });
        }

        let (score, comments) = q.grade(responses);
        let submission = Submission {
            item_responses: responses
                .iter()
                .map(|r| ItemResponse { response: r.clone() })
                .collect(),
            score,
            comments: Some(Comments::PerItem(comments)),
            time: chrono::Local::now().format(SERVER_DATE_FORMAT).to_string(),
        };
        q.submissions.push(submission.clone());

        Ok(SubmitResponse {
            locked: q.locked(),
            submission,
        })
    }

    async fn update_question(&self, question_id: &str, xml: &str) -> Result<QuestionSource, ApiError> {
        self.take_failure()?;
        if !self
            .questions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(question_id)
        {
            return Err(unknown_question(question_id));
        }
        Ok(QuestionSource {
            xml: xml.to_string(),
            html: format!("<div class=\"question\" id=\"{question_id}\"></div>"),
        })
    }

    async fn admin(&self, update: &AdminUpdate) -> Result<String, ApiError> {
        self.take_failure()?;
        update.validate().map_err(|message| ApiError::Status {
            status: 400,
            message,
        })?;
        self.admin_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(update.clone());
        Ok(format!("{} applied", update.endpoint()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ohms_core::model::{ItemLayout, ItemType, QuestionLayout};
    use ohms_core::question::{Question, ScoreBand};
    use ohms_core::traits::NoopHooks;

    fn layout(id: &str) -> QuestionLayout {
        QuestionLayout {
            id: id.into(),
            name: String::new(),
            points: 2.0,
            items: vec![
                ItemLayout {
                    item_type: ItemType::MultipleChoice,
                    options: vec!["a".into(), "b".into()],
                },
                ItemLayout {
                    item_type: ItemType::ShortAnswer,
                    options: vec![],
                },
            ],
        }
    }

    #[tokio::test]
    async fn grades_against_key() {
        let backend = MockBackend::new().with_question("q1", 2.0, &["a", "42"]);
        let response = backend
            .submit("q1", &["a".to_string(), "41".to_string()])
            .await
            .unwrap();
        assert_eq!(response.submission.score, Some(1.0));
        assert_eq!(
            response.submission.comments,
            Some(Comments::PerItem(vec![None, Some("Incorrect.".into())]))
        );
        assert_eq!(backend.submit_count(), 1);

        let loaded = backend.load("q1").await.unwrap();
        assert_eq!(loaded.submission, Some(response.submission));
        assert!(loaded.solution.is_none());
    }

    #[tokio::test]
    async fn submission_limit_locks_question() {
        let api = Arc::new(
            MockBackend::new()
                .with_question("q1", 2.0, &["a", "42"])
                .with_submission_limit("q1", 1),
        );
        let question = Question::new(&layout("q1"), api.clone(), Arc::new(NoopHooks));
        question.load().await.unwrap();
        question.set_value(0, "a").unwrap();
        question.set_value(1, "42").unwrap();

        let outcome = question.submit().await.unwrap();
        assert_eq!(outcome.feedback.band, ScoreBand::FullCredit);
        assert!(outcome.locked);
        assert!(question.is_locked());

        // A fresh page sees the lock on load.
        let reopened = Question::new(&layout("q1"), api.clone(), Arc::new(NoopHooks));
        reopened.load().await.unwrap();
        assert!(reopened.is_locked());
        assert_eq!(reopened.value(1).unwrap().as_deref(), Some("42"));
        assert_eq!(api.submit_count(), 1);
    }

    #[tokio::test]
    async fn ungraded_questions_stay_pending() {
        let backend = MockBackend::new().with_ungraded_question("essay", 10.0, 1);
        let response = backend.submit("essay", &["My answer".to_string()]).await.unwrap();
        assert_eq!(response.submission.score, None);
    }

    #[tokio::test]
    async fn injected_failure_is_returned_once() {
        let backend = MockBackend::new()
            .with_question("q1", 1.0, &["a"])
            .with_released_solutions();
        backend.fail_next(ApiError::Network("connection refused".into()));

        assert!(backend.load("q1").await.is_err());
        let loaded = backend.load("q1").await.unwrap();
        assert_eq!(loaded.solution, Some(vec!["a".to_string()]));
        assert_eq!(backend.load_count(), 2);
        assert!(matches!(
            backend.load("nope").await.unwrap_err(),
            ApiError::Status { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn admin_edits_are_validated_and_logged() {
        let backend = MockBackend::new();
        let bad = AdminUpdate::MaxScore {
            assignment_id: "hw1".into(),
            max_score: -5.0,
        };
        assert!(backend.admin(&bad).await.is_err());

        let ok = AdminUpdate::Category {
            assignment_id: "hw1".into(),
            category: "Quiz".into(),
        };
        assert_eq!(backend.admin(&ok).await.unwrap(), "update_category applied");
        assert_eq!(backend.admin_log(), vec![ok]);
    }
}
