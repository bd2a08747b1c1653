//! A homework page: its questions, loaded together.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::QuestionError;
use crate::model::HomeworkLayout;
use crate::question::Question;
use crate::traits::{HomeworkApi, PageHooks};

/// Default number of question loads in flight at once.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Outcome of loading one question of a page.
#[derive(Debug)]
pub struct LoadReport {
    pub question_id: String,
    pub result: Result<(), QuestionError>,
}

pub struct Homework {
    id: String,
    name: String,
    due_date: Option<String>,
    questions: Vec<Arc<Question>>,
    parallelism: usize,
}

impl Homework {
    pub fn new(layout: &HomeworkLayout, api: Arc<dyn HomeworkApi>, hooks: Arc<dyn PageHooks>) -> Self {
        let questions = layout
            .questions
            .iter()
            .map(|q| Arc::new(Question::new(q, Arc::clone(&api), Arc::clone(&hooks))))
            .collect();
        Self {
            id: layout.id.clone(),
            name: layout.name.clone(),
            due_date: layout.due_date.clone(),
            questions,
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    /// Cap concurrent loads; zero is treated as one.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn due_date(&self) -> Option<&str> {
        self.due_date.as_deref()
    }

    pub fn questions(&self) -> &[Arc<Question>] {
        &self.questions
    }

    pub fn question(&self, id: &str) -> Option<&Arc<Question>> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Load every question. One failure does not stop the others.
    ///
    /// Reports come back in page order.
    pub async fn load_all(&self) -> Vec<LoadReport> {
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut futures = FuturesUnordered::new();

        for (position, question) in self.questions.iter().enumerate() {
            let question = Arc::clone(question);
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => question.load().await,
                    Err(_) => Err(QuestionError::Locked(question.id().to_string())),
                };
                (
                    position,
                    LoadReport {
                        question_id: question.id().to_string(),
                        result,
                    },
                )
            });
        }

        let mut reports = Vec::with_capacity(self.questions.len());
        while let Some(report) = futures.next().await {
            reports.push(report);
        }
        reports.sort_by_key(|(position, _)| *position);

        let failed = reports.iter().filter(|(_, r)| r.result.is_err()).count();
        if failed > 0 {
            warn!(homework = %self.id, failed, "some questions failed to load");
        }
        info!(homework = %self.id, questions = reports.len(), failed, "homework loaded");

        reports.into_iter().map(|(_, r)| r).collect()
    }

    /// Sum of question points.
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.points()).sum()
    }

    /// Points earned on graded questions; pending ones count nothing.
    pub fn earned_points(&self) -> f64 {
        self.questions
            .iter()
            .filter_map(|q| q.feedback().and_then(|f| f.score))
            .sum()
    }
}
