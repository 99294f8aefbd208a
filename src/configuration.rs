use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgSslMode;

/// Top-level server configuration, assembled from `configuration/base.yaml`,
/// an environment-specific overlay, and `APP_`-prefixed environment
/// variables (highest precedence). Shared by both binaries: the API process
/// only reads `application`/`database`/`redis_uri`, the worker only reads
/// `database`/`redis_uri`/`stream`/`worker`/`classifier`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub redis_uri: Secret<String>,
    pub stream: StreamSettings,
    pub worker: WorkerSettings,
    pub classifier: ClassifierSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

/// Names the Redis stream and consumer group the worker pool reads from.
/// `consumer_name_prefix` is combined with each worker's index to produce a
/// distinct consumer identity per §4.3's "shared-nothing workers" design.
#[derive(Deserialize, Clone)]
pub struct StreamSettings {
    pub name: String,
    pub consumer_group: String,
    pub consumer_name_prefix: String,
}

#[derive(Deserialize, Clone)]
pub struct WorkerSettings {
    pub worker_count: usize,
    pub batch_size: usize,
    pub stream_block_time_ms: usize,
    pub min_idle_ms: usize,
    pub max_concurrent_requests: usize,
    /// Deliveries (read + reclaim attempts) an entry may accumulate before
    /// it is routed to the dead-letter stream instead of retried forever.
    pub max_deliveries: u64,
}

#[derive(Deserialize, Clone)]
pub struct ClassifierSettings {
    pub llm_adapter: String,
    pub remote_classifier_url: Option<String>,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(PgSslMode::Prefer)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

/// Which overlay to apply on top of `base.yaml`. Selected via the
/// `APP_ENVIRONMENT` variable; defaults to `local`.
pub enum Environ {
    Local,
    Test,
}

impl Environ {
    fn as_str(&self) -> &'static str {
        match self {
            Environ::Local => "local",
            Environ::Test => "test",
        }
    }
}

impl TryFrom<String> for Environ {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "test" => Ok(Self::Test),
            other => Err(format!(
                "{other} is not a supported environment; use `local` or `test`"
            )),
        }
    }
}

/// Load settings from `configuration/base.yaml` layered with
/// `configuration/{environment}.yaml`, then environment variables
/// (`APP_APPLICATION__PORT=9000`, double underscore as the nesting
/// separator).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().expect("failed to determine current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environ = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = Config::builder()
        .add_source(File::from(configuration_directory.join("base.yaml")))
        .add_source(File::from(configuration_directory.join(environment_filename)))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}
