use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use redis::aio::ConnectionManager;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::routes::create_lead;
use crate::routes::get_insight;
use crate::routes::get_lead;
use crate::routes::health_check;
use crate::stream::EventLog;
use crate::stream::RedisEventLog;
use crate::utils::json_error_handler;

/// Wrapper for actix's `Server` with access to the bound port, mirroring the
/// teacher's `Application`.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        let pool = get_connection_pool(&cfg.database);
        let redis_conn = build_redis_connection(cfg.redis_uri.expose_secret()).await?;
        let event_log: Arc<dyn EventLog> = Arc::new(RedisEventLog::new(
            redis_conn.clone(),
            cfg.stream.name.clone(),
            cfg.stream.consumer_group.clone(),
        ));
        event_log.ensure_group().await?;

        let server = run(listener, pool, redis_conn, event_log)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

pub fn get_connection_pool(db_cfg: &crate::configuration::DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(db_cfg.with_db())
}

pub async fn build_redis_connection(redis_uri: &str) -> Result<ConnectionManager, anyhow::Error> {
    let client = redis::Client::open(redis_uri)?;
    let conn = ConnectionManager::new(client).await?;
    Ok(conn)
}

/// Wires up the Intake and Insight HTTP surfaces: `POST /leads`,
/// `GET /leads/{id}`, `GET /leads/{id}/insight`, plus the ambient
/// `/health_check` probe.
pub fn run(
    listener: TcpListener,
    pool: PgPool,
    redis_conn: ConnectionManager,
    event_log: Arc<dyn EventLog>,
) -> Result<Server, anyhow::Error> {
    let pool = web::Data::new(pool);
    let redis_conn = web::Data::new(redis_conn);
    let event_log = web::Data::new(event_log);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/health_check", web::get().to(health_check))
            .route("/leads", web::post().to(create_lead))
            .route("/leads/{id}", web::get().to(get_lead))
            .route("/leads/{id}/insight", web::get().to(get_insight))
            .app_data(pool.clone())
            .app_data(redis_conn.clone())
            .app_data(event_log.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
