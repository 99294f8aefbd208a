use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::Classifier;
use super::ClassifierError;
use super::TriageOutcome;
use super::TriageRequest;
use crate::domain::Confidence;
use crate::domain::Intent;
use crate::domain::NextAction;
use crate::domain::Priority;

#[derive(Serialize)]
struct RemoteRequest<'a> {
    note: &'a str,
}

#[derive(Deserialize)]
struct RemoteResponse {
    intent: Intent,
    priority: Priority,
    next_action: NextAction,
    confidence: f32,
    tags: Option<Vec<String>>,
}

/// Delegates triage to an out-of-process service over HTTP, selected via
/// `classifier.llm_adapter = "remote"` (§6's `LLM_ADAPTER`). Mirrors the
/// teacher's `EmailClient`: a thin `reqwest::Client` wrapper with a fixed
/// base URL and a bounded timeout, substituted in tests with `wiremock`.
pub struct RemoteHttpClassifier {
    http_client: reqwest::Client,
    base_url: String,
}

impl RemoteHttpClassifier {
    pub fn new(base_url: String) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client configuration is always valid");
        Self { http_client, base_url }
    }
}

#[async_trait]
impl Classifier for RemoteHttpClassifier {
    async fn triage(&self, request: TriageRequest) -> Result<TriageOutcome, ClassifierError> {
        let url = format!("{}/triage", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&RemoteRequest { note: &request.note })
            .send()
            .await
            .map_err(|e| ClassifierError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClassifierError::Request(e.to_string()))?;

        let body: RemoteResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

        let confidence = Confidence::new(body.confidence)
            .map_err(ClassifierError::MalformedResponse)?;

        Ok(TriageOutcome {
            intent: body.intent,
            priority: body.priority,
            next_action: body.next_action,
            confidence,
            tags: body.tags.unwrap_or_default(),
        })
    }
}
