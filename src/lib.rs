pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "lambda")]
pub use config::lambda::LambdaConfig;

pub use adapters::{
    clock::{FixedClock, SystemClock},
    web_api::WebApiClient,
};
pub use config::toml_config::TomlConfig;
pub use crate::core::notifier::{BirthdayNotifier, ExecutionContext, NotifierSettings};
pub use domain::model::{RunParameters, RunSummary, UserId};
pub use utils::error::{NotifierError, Result};

/// Wires the configured collaborators together and performs one run.
pub async fn run_with_config<C: crate::core::ConfigProvider + ?Sized>(config: &C) -> Result<RunSummary> {
    let timezone = config
        .timezone()
        .map(|tz| utils::validation::validate_timezone("timezone", tz))
        .transpose()?;

    let client = WebApiClient::from_config(config);
    let notifier = BirthdayNotifier::new(
        SystemClock::new(timezone),
        NotifierSettings::from_config(config),
    );
    let context = ExecutionContext {
        initiating_user: UserId(config.initiating_user().to_string()),
        store: &client,
        transport: &client,
    };
    let params = RunParameters::new(config.subject(), config.body());

    notifier.run(&context, &params).await
}
