//! main.rs

use profile_sync::configuration::get_configuration;
use profile_sync::error::SyncResult;
use profile_sync::startup::Application;
use profile_sync::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> SyncResult<()> {
    let subscriber = get_subscriber("profile_sync".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    // Panic if we can't read configuration
    let configuration = get_configuration().expect("Failed to read configuration.");
    let application = Application::build(configuration).await?;
    tracing::info!(port = application.port(), "Listening for update triggers");

    if let Err(e) = application.run_until_stopped().await {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "API failed"
        );
        return Err(anyhow::Error::from(e).into());
    }
    tracing::info!("API has exited");
    Ok(())
}
