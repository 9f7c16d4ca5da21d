use std::io;

use anyhow::Context;

use course_notifier::configuration::Settings;
use course_notifier::startup::Application;
use course_notifier::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = get_subscriber("course_notifier".into(), "info".into(), io::stdout);
    init_subscriber(subscriber)?;

    // Retrieve settings
    let config = Settings::get_config().context("Failed to load configuration")?;

    // Run the HTTP server and the notification worker until one of them stops
    Application::build(config).await?.run_until_stopped().await
}
