use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use lead_triage::classifier::select_classifier;
use lead_triage::configuration::get_configuration;
use lead_triage::startup::build_redis_connection;
use lead_triage::startup::get_connection_pool;
use lead_triage::stream::EventLog;
use lead_triage::stream::RedisEventLog;
use lead_triage::telemetry::get_subscriber;
use lead_triage::telemetry::init_subscriber;
use lead_triage::worker::Worker;
use secrecy::ExposeSecret;

/// Initialise telemetry, load config, and run `worker_count` triage workers
/// sharing one consumer group, until SIGINT/SIGTERM.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("lead-triage-worker", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;
    let pool = get_connection_pool(&cfg.database);
    let redis_conn = build_redis_connection(cfg.redis_uri.expose_secret()).await?;

    let event_log = Arc::new(RedisEventLog::new(
        redis_conn,
        cfg.stream.name.clone(),
        cfg.stream.consumer_group.clone(),
    ));
    event_log.ensure_group().await?;

    let classifier: Arc<dyn lead_triage::classifier::Classifier> = select_classifier(
        &cfg.classifier.llm_adapter,
        cfg.classifier.remote_classifier_url.as_deref(),
    )?
    .into();

    let shutdown = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::with_capacity(cfg.worker.worker_count);
    for index in 0..cfg.worker.worker_count {
        let worker = Worker {
            event_log: Arc::clone(&event_log),
            pool: pool.clone(),
            classifier: Arc::clone(&classifier),
            consumer_name: format!("{}-{index}", cfg.stream.consumer_name_prefix),
            batch_size: cfg.worker.batch_size,
            stream_block_time_ms: cfg.worker.stream_block_time_ms,
            min_idle_ms: cfg.worker.min_idle_ms,
            max_concurrent_requests: cfg.worker.max_concurrent_requests,
            max_deliveries: cfg.worker.max_deliveries,
        };
        let shutdown = Arc::clone(&shutdown);
        handles.push(tokio::spawn(async move { worker.run(shutdown).await }));
    }

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, draining in-flight work");
    shutdown.store(true, Ordering::SeqCst);

    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
