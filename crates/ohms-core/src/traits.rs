//! Seams to the outside world: the homework server and the page.
//!
//! `HomeworkApi` is implemented over HTTP by `ohms-client`; `PageHooks` is
//! whatever renders questions for the user.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::{AdminUpdate, LoadResponse, QuestionSource, SubmitResponse};

// ---------------------------------------------------------------------------
// Homework server
// ---------------------------------------------------------------------------

/// Request/response access to the homework server.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Prior submission, lock flag and any released solutions.
    async fn load(&self, question_id: &str) -> Result<LoadResponse, ApiError>;

    /// Record one submission: the ordered item values of a question.
    async fn submit(
        &self,
        question_id: &str,
        responses: &[String],
    ) -> Result<SubmitResponse, ApiError>;

    /// Replace a question's authored source (admin only).
    async fn update_question(
        &self,
        question_id: &str,
        xml: &str,
    ) -> Result<QuestionSource, ApiError>;

    /// Apply a gradebook edit; returns the server's acknowledgement text.
    async fn admin(&self, update: &AdminUpdate) -> Result<String, ApiError>;
}

// ---------------------------------------------------------------------------
// Page collaborators
// ---------------------------------------------------------------------------

/// Presentation callbacks a question fires after it changes.
pub trait PageHooks: Send + Sync {
    /// Content of the question changed; re-run math typesetting over it.
    fn typeset(&self, question_id: &str);

    /// Put an error in front of the user.
    fn alert(&self, question_id: &str, message: &str);
}

/// Hooks that do nothing.
pub struct NoopHooks;

impl PageHooks for NoopHooks {
    fn typeset(&self, _: &str) {}
    fn alert(&self, _: &str, _: &str) {}
}
