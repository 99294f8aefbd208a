use uuid::Uuid;

use lead_triage::domain::Confidence;
use lead_triage::domain::ContentHash;
use lead_triage::domain::Intent;
use lead_triage::domain::NextAction;
use lead_triage::domain::Priority;
use lead_triage::insight_store;
use lead_triage::insight_store::NewInsight;
use lead_triage::lead_store;
use lead_triage::lead_store::NewLead;

use crate::helpers::spawn_app;

#[tokio::test]
async fn insight_for_unknown_lead_is_404() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(app.get_insight_url(Uuid::new_v4()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

/// §4.3(d): a second insert for the same `(lead_id, content_hash)` is a
/// successful no-op (`Ok(None)`), not an error, and leaves exactly one row —
/// the scenario a concurrent worker reclaiming the same entry would hit.
#[tokio::test]
async fn duplicate_insight_insert_is_a_noop() {
    let app = spawn_app().await;

    let lead = lead_store::insert(
        &app.pool,
        &NewLead {
            email: None,
            phone: None,
            name: None,
            note: "Need help, something is broken".to_string(),
            source: None,
        },
    )
    .await
    .unwrap();

    let new_insight = NewInsight {
        lead_id: lead.id,
        content_hash: ContentHash::of(&lead.note),
        intent: Intent::Support,
        priority: Priority::P2,
        next_action: NextAction::Email,
        confidence: Confidence::new(0.6).unwrap(),
        tags: None,
    };

    let first = insight_store::try_insert(&app.pool, &new_insight).await.unwrap();
    assert!(first.is_some());

    let second = insight_store::try_insert(&app.pool, &new_insight).await.unwrap();
    assert!(second.is_none());

    let count: i64 = sqlx::query_scalar!("SELECT COUNT(*) FROM insights WHERE lead_id = $1", lead.id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);
}
