use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use lead_triage::classifier::Classifier;
use lead_triage::classifier::ClassifierError;
use lead_triage::classifier::TriageOutcome;
use lead_triage::classifier::TriageRequest;
use lead_triage::domain::Confidence;
use lead_triage::domain::Intent;
use lead_triage::domain::NextAction;
use lead_triage::domain::Priority;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with_classifier;

/// Fails its first `remaining_failures` calls, then always succeeds —
/// stands in for a classifier backend that is down and then recovers.
struct FlakyClassifier {
    remaining_failures: AtomicUsize,
}

#[async_trait]
impl Classifier for FlakyClassifier {
    async fn triage(&self, _request: TriageRequest) -> Result<TriageOutcome, ClassifierError> {
        if self.remaining_failures.load(Ordering::SeqCst) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(ClassifierError::Request("classifier temporarily unavailable".to_string()));
        }
        Ok(TriageOutcome {
            intent: Intent::Buy,
            priority: Priority::P1,
            next_action: NextAction::Email,
            confidence: Confidence::new(0.7).unwrap(),
            tags: vec![],
        })
    }
}

#[tokio::test]
async fn happy_path_creates_a_lead_and_eventually_an_insight() {
    let app = spawn_app().await;
    let token = Uuid::new_v4().to_string();

    let response = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", &token)
        .json(&json!({
            "note": "Need urgent pricing for 50 seats ASAP! Want to buy next week.",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let lead: serde_json::Value = response.json().await.unwrap();
    let lead_id: Uuid = lead["id"].as_str().unwrap().parse().unwrap();

    let insight_response = app
        .wait_for_insight(lead_id)
        .await
        .expect("insight was never produced");
    let insight: serde_json::Value = insight_response.json().await.unwrap();
    assert_eq!(insight["intent"], "buy");
    assert!(matches!(insight["priority"].as_str().unwrap(), "P0" | "P1"));
}

#[tokio::test]
async fn replaying_the_same_token_and_body_returns_the_cached_response() {
    let app = spawn_app().await;
    let token = Uuid::new_v4().to_string();
    let body = json!({ "note": "Tell me about pricing" });

    let first = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", &token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::CREATED);
    let first_lead: serde_json::Value = first.json().await.unwrap();

    let second = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", &token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::OK);
    let second_lead: serde_json::Value = second.json().await.unwrap();
    assert_eq!(first_lead["id"], second_lead["id"]);

    let lead_id: Uuid = first_lead["id"].as_str().unwrap().parse().unwrap();
    let count: i64 = sqlx::query_scalar!("SELECT COUNT(*) FROM leads WHERE id = $1", lead_id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn reusing_a_token_with_a_different_body_is_a_conflict() {
    let app = spawn_app().await;
    let token = Uuid::new_v4().to_string();

    let first = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", &token)
        .json(&json!({ "note": "first note" }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::CREATED);

    let second = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", &token)
        .json(&json!({ "note": "a completely different note" }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn a_non_uuid_idempotency_key_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", "not-a-uuid")
        .json(&json!({ "note": "some note" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}

/// §6: a body that fails to deserialize at all (here, `note` is the wrong
/// type) is malformed, not just invalid — the `JsonConfig` error handler
/// must turn actix's default `400` into a `422`, same as a failed `Note`
/// parse.
#[tokio::test]
async fn a_wrong_typed_field_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .json(&json!({ "note": 12345 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}

/// Genuinely malformed JSON (not merely an invalid field value) must also
/// hit the `422` path, not actix's default `400`.
#[tokio::test]
async fn invalid_json_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .header("Content-Type", "application/json")
        .body("{ not valid json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn an_empty_note_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .json(&json!({ "note": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}

/// S6: the classifier fails twice, then succeeds on the third (reclaimed)
/// attempt; the entry still ends up acked with exactly one insight.
#[tokio::test]
async fn classifier_transient_failure_eventually_produces_one_insight() {
    let classifier = Arc::new(FlakyClassifier { remaining_failures: AtomicUsize::new(2) });
    let app = spawn_app_with_classifier(classifier).await;
    let token = Uuid::new_v4().to_string();

    let response = app
        .api_client
        .post(app.post_leads_url())
        .header("Idempotency-Key", &token)
        .json(&json!({ "note": "Looking to buy soon" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let lead: serde_json::Value = response.json().await.unwrap();
    let lead_id: Uuid = lead["id"].as_str().unwrap().parse().unwrap();

    let insight_response = app
        .wait_for_insight(lead_id)
        .await
        .expect("insight was never produced despite classifier recovering");
    let insight: serde_json::Value = insight_response.json().await.unwrap();
    assert_eq!(insight["intent"], "buy");

    let count: i64 = sqlx::query_scalar!("SELECT COUNT(*) FROM insights WHERE lead_id = $1", lead_id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn missing_lead_returns_404() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(app.get_lead_url(Uuid::new_v4()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
