//! In-crate fakes for the server and page seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::ApiError;
use crate::model::{
    AdminUpdate, ItemResponse, LoadResponse, QuestionSource, Submission, SubmitResponse,
};
use crate::traits::{HomeworkApi, PageHooks};

pub(crate) fn submission(responses: &[&str], score: Option<f64>) -> Submission {
    Submission {
        item_responses: responses
            .iter()
            .map(|r| ItemResponse {
                response: r.to_string(),
            })
            .collect(),
        score,
        comments: None,
        time: String::new(),
    }
}

pub(crate) struct FakeApi {
    load: Result<LoadResponse, ApiError>,
    load_for: HashMap<String, Result<LoadResponse, ApiError>>,
    submit: Result<SubmitResponse, ApiError>,
    gate: Option<Arc<Notify>>,
    load_gate: Option<Arc<Notify>>,
    pub load_calls: AtomicU32,
    pub submit_calls: AtomicU32,
    in_flight: AtomicU32,
    pub max_in_flight: AtomicU32,
    submitted: Mutex<Option<Vec<String>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            load: Ok(LoadResponse::default()),
            load_for: HashMap::new(),
            submit: Ok(SubmitResponse {
                locked: false,
                submission: submission(&[], None),
            }),
            gate: None,
            load_gate: None,
            load_calls: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            submitted: Mutex::new(None),
        }
    }

    pub fn with_load(mut self, response: Result<LoadResponse, ApiError>) -> Self {
        self.load = response;
        self
    }

    pub fn with_load_for(mut self, question_id: &str, response: Result<LoadResponse, ApiError>) -> Self {
        self.load_for.insert(question_id.to_string(), response);
        self
    }

    pub fn with_submit(mut self, response: Result<SubmitResponse, ApiError>) -> Self {
        self.submit = response;
        self
    }

    /// Hold every submit until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Hold every load until the gate is notified.
    pub fn with_load_gate(mut self, gate: Arc<Notify>) -> Self {
        self.load_gate = Some(gate);
        self
    }

    pub fn last_submitted(&self) -> Option<Vec<String>> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl HomeworkApi for FakeApi {
    async fn load(&self, question_id: &str) -> Result<LoadResponse, ApiError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(gate) = &self.load_gate {
            gate.notified().await;
        }
        self.load_for
            .get(question_id)
            .unwrap_or(&self.load)
            .clone()
    }

    async fn submit(&self, _question_id: &str, responses: &[String]) -> Result<SubmitResponse, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        *self.submitted.lock().unwrap() = Some(responses.to_vec());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.submit.clone()
    }

    async fn update_question(&self, question_id: &str, xml: &str) -> Result<QuestionSource, ApiError> {
        Ok(QuestionSource {
            xml: xml.to_string(),
            html: format!("<div class=\"question\" id=\"{question_id}\"></div>"),
        })
    }

    async fn admin(&self, update: &AdminUpdate) -> Result<String, ApiError> {
        Ok(format!("{} ok", update.endpoint()))
    }
}

#[derive(Default)]
pub(crate) struct RecordingHooks {
    typeset: Mutex<Vec<String>>,
    alerts: Mutex<Vec<(String, String)>>,
}

impl RecordingHooks {
    pub fn typeset_calls(&self) -> Vec<String> {
        self.typeset.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().unwrap().clone()
    }
}

impl PageHooks for RecordingHooks {
    fn typeset(&self, question_id: &str) {
        self.typeset.lock().unwrap().push(question_id.to_string());
    }

    fn alert(&self, question_id: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((question_id.to_string(), message.to_string()));
    }
}
