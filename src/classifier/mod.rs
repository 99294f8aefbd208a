mod remote;
mod rule_based;

pub use remote::RemoteHttpClassifier;
pub use rule_based::RuleBasedClassifier;

use async_trait::async_trait;

use crate::domain::Confidence;
use crate::domain::Intent;
use crate::domain::NextAction;
use crate::domain::Priority;

/// What a classifier is asked to triage: the note alone (§6 "Classifier
/// (external)" — a pure function `note -> (intent, priority, next_action,
/// confidence, tags)`).
#[derive(Debug, Clone)]
pub struct TriageRequest {
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriageOutcome {
    pub intent: Intent,
    pub priority: Priority,
    pub next_action: NextAction,
    pub confidence: Confidence,
    pub tags: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(String),
    #[error("classifier returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Pluggable triage strategy (§6 `LLM_ADAPTER`). §4.3(c): any failure here
/// is *transient* — the caller leaves the entry pending for reclaim rather
/// than treating it as terminal.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn triage(&self, request: TriageRequest) -> Result<TriageOutcome, ClassifierError>;
}

/// Selects the classifier implementation named by `classifier.llm_adapter`
/// (§6's `LLM_ADAPTER` variable).
pub fn select_classifier(
    adapter_name: &str,
    remote_url: Option<&str>,
) -> Result<Box<dyn Classifier>, anyhow::Error> {
    match adapter_name {
        "rule_based" => Ok(Box::new(RuleBasedClassifier::new())),
        "remote" => {
            let url = remote_url.ok_or_else(|| {
                anyhow::anyhow!("classifier.remote_classifier_url is required for the `remote` adapter")
            })?;
            Ok(Box::new(RemoteHttpClassifier::new(url.to_string())))
        }
        other => Err(anyhow::anyhow!("unknown LLM_ADAPTER `{other}`")),
    }
}
