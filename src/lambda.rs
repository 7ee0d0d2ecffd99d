#[cfg(feature = "lambda")]
use birthday_notifier::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use birthday_notifier::{run_with_config, LambdaConfig};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};

/// Payload of the scheduled event; every field is optional.
#[cfg(feature = "lambda")]
#[derive(Deserialize, Default)]
pub struct Request {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub initiating_user: Option<String>,
}

#[cfg(feature = "lambda")]
#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub today: String,
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    tracing::info!("Starting birthday notifier Lambda function");

    let mut config = LambdaConfig::from_env()?;
    let request = event.payload;
    config.apply_event(request.subject, request.body, request.initiating_user);
    config.validate()?;

    let summary = run_with_config(&config).await?;

    let response = Response {
        message: "Birthday run completed".to_string(),
        today: summary.today.to_string(),
        matched: summary.matched,
        sent: summary.sent(),
        failed: summary.failed(),
        skipped: summary.skipped,
    };

    tracing::info!("Birthday notifier Lambda function completed");
    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
