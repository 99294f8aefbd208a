use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::classifier::Classifier;
use crate::classifier::TriageRequest;
use crate::domain::ContentHash;
use crate::events::LeadCreatedEvent;
use crate::insight_store;
use crate::insight_store::NewInsight;
use crate::stream::EventLog;
use crate::stream::StreamEntry;

/// Whether a single stream entry was processed to completion. Maps directly
/// to the ack policy in §4.3 step 4: only `Success` is acknowledged.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// One worker identity's read/reclaim/dispatch/ack loop (§4.3). Each worker
/// owns a distinct `consumer_name` within the shared consumer group so that
/// Redis treats them as independent readers — the "shared-nothing workers"
/// design §9 asks for.
pub struct Worker<L: EventLog> {
    pub event_log: Arc<L>,
    pub pool: PgPool,
    pub classifier: Arc<dyn Classifier>,
    pub consumer_name: String,
    pub batch_size: usize,
    pub stream_block_time_ms: usize,
    pub min_idle_ms: usize,
    pub max_concurrent_requests: usize,
    pub max_deliveries: u64,
}

impl<L: EventLog + 'static> Worker<L> {
    /// Runs the loop until `shutdown` is set, then returns once any
    /// in-flight dispatches drain. Graceful shutdown is cooperative: the
    /// flag is only checked between iterations, mirroring the teacher's
    /// `tokio::select!`-raced shutdown signal rather than hard-aborting
    /// in-flight work.
    pub async fn run(&self, shutdown: Arc<AtomicBool>) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));

        while !shutdown.load(Ordering::SeqCst) {
            if let Err(e) = self.run_iteration(&semaphore).await {
                tracing::error!(error = %e, "worker iteration failed, backing off");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
            tokio::task::yield_now().await;
        }
    }

    async fn run_iteration(&self, semaphore: &Arc<Semaphore>) -> Result<(), anyhow::Error> {
        // Reclaim phase: entries idle past `min_idle_ms`, left pending by a
        // crashed or slow worker.
        let reclaimed = self
            .event_log
            .claim_idle(&self.consumer_name, self.min_idle_ms, self.batch_size)
            .await?;
        self.dispatch(reclaimed, semaphore).await;

        // Read phase: new entries addressed to this consumer.
        let fresh = self
            .event_log
            .read_group(&self.consumer_name, self.batch_size, self.stream_block_time_ms)
            .await?;
        self.dispatch(fresh, semaphore).await;

        Ok(())
    }

    async fn dispatch(&self, entries: Vec<StreamEntry>, semaphore: &Arc<Semaphore>) {
        let mut handles = Vec::with_capacity(entries.len());
        for entry in entries {
            let permit = Arc::clone(semaphore).acquire_owned().await.expect("semaphore is never closed");
            let event_log = Arc::clone(&self.event_log);
            let pool = self.pool.clone();
            let classifier = Arc::clone(&self.classifier);
            let max_deliveries = self.max_deliveries;

            handles.push(tokio::spawn(
                async move {
                    let _permit = permit;
                    let outcome = process_entry(&entry, &pool, classifier.as_ref()).await;
                    match outcome {
                        Outcome::Success => {
                            if let Err(e) = event_log.ack(&entry.id).await {
                                tracing::error!(error = %e, entry_id = %entry.id, "ack failed");
                            }
                        }
                        Outcome::Failure => {
                            handle_failure(event_log.as_ref(), &entry, max_deliveries).await;
                        }
                    }
                }
                .in_current_span(),
            ));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// Past `max_deliveries` redeliveries an entry is treated as poison: it is
/// routed to the dead-letter stream and acked so it stops recirculating
/// (§9's open question, resolved — see DESIGN.md). Otherwise it is simply
/// left pending for the next reclaim.
async fn handle_failure<L: EventLog>(event_log: &L, entry: &StreamEntry, max_deliveries: u64) {
    let deliveries = event_log.delivery_count(&entry.id).await.unwrap_or(1);
    if deliveries >= max_deliveries {
        tracing::warn!(entry_id = %entry.id, deliveries, "routing poison entry to dead-letter stream");
        if let Err(e) = event_log.dead_letter(entry).await {
            tracing::error!(error = %e, entry_id = %entry.id, "dead-letter routing failed");
        }
    }
}

/// The pure per-message core (§4.3 a-e), exercised directly by unit tests
/// against an in-memory event log and a classifier stub — no Redis or
/// Postgres required for that coverage.
#[tracing::instrument(skip_all, fields(entry_id = %entry.id))]
async fn process_entry(
    entry: &StreamEntry,
    pool: &PgPool,
    classifier: &dyn Classifier,
) -> Outcome {
    let event = match LeadCreatedEvent::try_from_fields(&entry.fields) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "could not parse stream entry, leaving pending");
            return Outcome::Failure;
        }
    };

    match find_existing(pool, &event).await {
        Ok(true) => return Outcome::Success,
        Ok(false) => {}
        Err(e) => {
            tracing::error!(error = %e, "insight lookup failed");
            return Outcome::Failure;
        }
    }

    let triage = match classifier
        .triage(TriageRequest { note: event.note.clone() })
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "classifier failed, leaving pending for reclaim");
            return Outcome::Failure;
        }
    };

    let new_insight = NewInsight {
        lead_id: event.lead_id,
        content_hash: event.content_hash.clone(),
        intent: triage.intent,
        priority: triage.priority,
        next_action: triage.next_action,
        confidence: triage.confidence,
        tags: (!triage.tags.is_empty()).then_some(triage.tags),
    };

    match insight_store::try_insert(pool, &new_insight).await {
        // Either we inserted it, or a concurrent worker already did — both
        // are success (§4.3 d).
        Ok(_) => Outcome::Success,
        Err(e) => {
            tracing::error!(error = %e, "insight insert failed");
            Outcome::Failure
        }
    }
}

async fn find_existing(pool: &PgPool, event: &LeadCreatedEvent) -> Result<bool, sqlx::Error> {
    let hash: &ContentHash = &event.content_hash;
    let existing = insight_store::find_by_lead_and_hash(pool, event.lead_id, hash).await?;
    Ok(existing.is_some())
}
