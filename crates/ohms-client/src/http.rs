//! `HomeworkApi` over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use ohms_core::error::ApiError;
use ohms_core::model::{AdminUpdate, LoadResponse, QuestionSource, SubmitRequest, SubmitResponse};
use ohms_core::traits::HomeworkApi;

use crate::error::{server_message, transport_error};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for one homework server.
///
/// Endpoints are resolved against `base_url`; nothing is inferred from the
/// environment.
pub struct HomeworkClient {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HomeworkClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;

        if !(200..300).contains(&status) {
            return Err(ApiError::Status {
                status,
                message: server_message(&body),
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HomeworkApi for HomeworkClient {
    #[instrument(skip(self))]
    async fn load(&self, question_id: &str) -> Result<LoadResponse, ApiError> {
        let request = self
            .client
            .get(self.url("load"))
            .query(&[("q_id", question_id)]);
        let response: LoadResponse = self.send_json(request).await?;
        debug!(locked = response.locked, has_submission = response.submission.is_some(), "loaded");
        Ok(response)
    }

    #[instrument(skip(self, responses), fields(items = responses.len()))]
    async fn submit(&self, question_id: &str, responses: &[String]) -> Result<SubmitResponse, ApiError> {
        let body = SubmitRequest {
            responses: responses.to_vec(),
        };
        let request = self
            .client
            .post(self.url("submit"))
            .query(&[("q_id", question_id)])
            .json(&body);
        self.send_json(request).await
    }

    #[instrument(skip(self, xml))]
    async fn update_question(&self, question_id: &str, xml: &str) -> Result<QuestionSource, ApiError> {
        let request = self
            .client
            .post(self.url("update_question"))
            .form(&[("q_id", question_id), ("xml", xml)]);
        self.send_json(request).await
    }

    #[instrument(skip(self, update), fields(endpoint = update.endpoint()))]
    async fn admin(&self, update: &AdminUpdate) -> Result<String, ApiError> {
        let request = self
            .client
            .post(self.url(update.endpoint()))
            .form(&update.form_fields());
        let ack = self.send(request).await?;
        Ok(ack.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ohms_core::column::Cell;
    use ohms_core::model::{Comments, HomeworkLayout, ItemLayout, ItemType, QuestionLayout};
    use ohms_core::question::{Question, ScoreBand};
    use ohms_core::traits::NoopHooks;
    use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HomeworkClient {
        HomeworkClient::new(&server.uri(), 5).unwrap()
    }

    #[tokio::test]
    async fn load_parses_prior_submission() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "locked": true,
            "submission": {
                "item_responses": [{"response": "b"}, {"response": "42"}],
                "score": 1.5,
                "comments": [null, "Off by one."],
                "time": "10/02/2013 14:05:00"
            },
            "solution": ["a", "41"]
        });
        Mock::given(method("GET"))
            .and(path("/load"))
            .and(query_param("q_id", "q7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).load("q7").await.unwrap();
        assert!(response.locked);
        let submission = response.submission.unwrap();
        assert_eq!(submission.item_responses[1].response, "42");
        assert_eq!(submission.score, Some(1.5));
        assert_eq!(
            submission.comments,
            Some(Comments::PerItem(vec![None, Some("Off by one.".into())]))
        );
        assert_eq!(response.solution.unwrap(), vec!["a", "41"]);
    }

    #[tokio::test]
    async fn submit_posts_json_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(query_param("q_id", "q1"))
            .and(body_json(serde_json::json!({"responses": ["b", "42"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "locked": false,
                "submission": {
                    "item_responses": [{"response": "b"}, {"response": "42"}],
                    "score": null,
                    "comments": "",
                    "time": "10/02/2013 14:06:00"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .submit("q1", &["b".to_string(), "42".to_string()])
            .await
            .unwrap();
        assert!(!response.locked);
        assert_eq!(response.submission.score, None);
    }

    #[tokio::test]
    async fn error_body_becomes_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string("The deadline for submitting this homework has passed."),
            )
            .mount(&server)
            .await;

        let err = client(&server).submit("q1", &["a".into()]).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 403,
                message: "The deadline for submitting this homework has passed.".into()
            }
        );
        assert_eq!(
            err.user_message(),
            "The deadline for submitting this homework has passed."
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/load"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).load("q1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/load"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"locked": false}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = HomeworkClient::new(&server.uri(), 1).unwrap();
        assert_eq!(client.load("q1").await.unwrap_err(), ApiError::Timeout(1));
    }

    #[tokio::test]
    async fn admin_edits_are_form_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update_grade"))
            .and(body_string_contains("stuid=S1"))
            .and(body_string_contains("hw_id=hw2"))
            .and(body_string_contains("score=EX"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Grade updated.\n"))
            .expect(1)
            .mount(&server)
            .await;

        let ack = client(&server)
            .admin(&AdminUpdate::Grade {
                student_id: "S1".into(),
                assignment_id: "hw2".into(),
                score: Cell::Excused,
            })
            .await
            .unwrap();
        assert_eq!(ack, "Grade updated.");
    }

    #[tokio::test]
    async fn update_question_returns_rendered_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update_question"))
            .and(body_string_contains("q_id=q3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "xml": "<question/>",
                "html": "<div class=\"question\"></div>"
            })))
            .mount(&server)
            .await;

        let source = client(&server)
            .update_question("q3", "<question/>")
            .await
            .unwrap();
        assert_eq!(source.html, "<div class=\"question\"></div>");
    }

    #[tokio::test]
    async fn question_protocol_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/load"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "locked": false
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(body_json(serde_json::json!({"responses": ["c"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "locked": false,
                "submission": {
                    "item_responses": [{"response": "c"}],
                    "score": 1,
                    "comments": "Correct.",
                    "time": "10/02/2013 14:06:00"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let layout = HomeworkLayout {
            id: "hw1".into(),
            name: "Homework 1".into(),
            due_date: None,
            questions: vec![QuestionLayout {
                id: "q1".into(),
                name: String::new(),
                points: 1.0,
                items: vec![ItemLayout {
                    item_type: ItemType::MultipleChoice,
                    options: vec!["a".into(), "b".into(), "c".into()],
                }],
            }],
        };
        let api = Arc::new(client(&server));
        let question = Question::new(&layout.questions[0], api, Arc::new(NoopHooks));

        question.load().await.unwrap();
        question.set_value(0, "c").unwrap();
        let outcome = question.submit().await.unwrap();

        assert_eq!(outcome.feedback.band, ScoreBand::FullCredit);
        assert_eq!(outcome.feedback.comments.as_deref(), Some("Correct."));
        assert!(!question.is_locked());
    }
}
