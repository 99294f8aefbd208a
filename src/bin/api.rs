use lead_triage::configuration::get_configuration;
use lead_triage::startup::Application;
use lead_triage::telemetry::get_subscriber;
use lead_triage::telemetry::init_subscriber;

/// Initialise telemetry, load config, and serve the Intake and Insight HTTP
/// surfaces.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("lead-triage-api", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;
    let application = Application::build(cfg).await?;
    application.run_until_stopped().await?;

    Ok(())
}
