#[cfg(feature = "lambda")]
pub mod lambda;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{QueryFailurePolicy, SendFailurePolicy};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_timezone, validate_url,
};
#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const MAX_TIMEOUT_SECONDS: u64 = 600;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "birthday-notifier")]
#[command(about = "Send a birthday email to every contact born on today's month and day")]
pub struct CliConfig {
    /// Path to a TOML configuration file; flags given here override it.
    /// NOTIFIER_* environment variables are only read when no file is given.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Root of the CRM Web API, e.g. https://org.example.com/api/data/v9.2
    #[arg(long)]
    pub api_endpoint: Option<String>,

    #[arg(long)]
    pub access_token: Option<String>,

    /// System user the emails are sent from
    #[arg(long)]
    pub initiating_user: Option<String>,

    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long)]
    pub body: Option<String>,

    /// IANA timezone used to decide what "today" is (defaults to the server's local date)
    #[arg(long)]
    pub timezone: Option<String>,

    #[arg(long)]
    pub query_timeout_seconds: Option<u64>,

    #[arg(long)]
    pub send_timeout_seconds: Option<u64>,

    /// fail | degrade
    #[arg(long)]
    pub on_query_failure: Option<QueryFailurePolicy>,

    /// continue | abort
    #[arg(long)]
    pub on_send_failure: Option<SendFailurePolicy>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 只補上命令列沒有給的欄位
    pub fn fill_from_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields = [
            ("NOTIFIER_API_ENDPOINT", &mut self.api_endpoint),
            ("NOTIFIER_ACCESS_TOKEN", &mut self.access_token),
            ("NOTIFIER_INITIATING_USER", &mut self.initiating_user),
        ];

        for (key, field) in fields {
            if field.is_none() {
                *field = lookup(key).filter(|v| !v.is_empty());
            }
        }
    }

    pub fn apply_env_fallbacks(&mut self) {
        self.fill_from_env(|key| std::env::var(key).ok());
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn api_endpoint(&self) -> &str {
        self.api_endpoint.as_deref().unwrap_or_default()
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn initiating_user(&self) -> &str {
        self.initiating_user.as_deref().unwrap_or_default()
    }

    fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }

    fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    fn query_timeout_seconds(&self) -> u64 {
        self.query_timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn send_timeout_seconds(&self) -> u64 {
        self.send_timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn on_query_failure(&self) -> QueryFailurePolicy {
        self.on_query_failure.unwrap_or_default()
    }

    fn on_send_failure(&self) -> SendFailurePolicy {
        self.on_send_failure.unwrap_or_default()
    }
}

#[cfg(feature = "cli")]
impl crate::utils::validation::Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::validate_required_field;

        validate_required_field("api_endpoint", &self.api_endpoint)?;
        validate_required_field("initiating_user", &self.initiating_user)?;
        validate_required_field("subject", &self.subject)?;
        validate_required_field("body", &self.body)?;

        validate_provider(self)
    }
}

/// 所有設定來源共用的檢查
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_url("api_endpoint", config.api_endpoint())?;
    validate_non_empty_string("initiating_user", config.initiating_user())?;
    validate_non_empty_string("subject", config.subject())?;
    validate_non_empty_string("body", config.body())?;

    if let Some(tz) = config.timezone() {
        validate_timezone("timezone", tz)?;
    }

    validate_range(
        "query_timeout_seconds",
        config.query_timeout_seconds(),
        1,
        MAX_TIMEOUT_SECONDS,
    )?;
    validate_range(
        "send_timeout_seconds",
        config.send_timeout_seconds(),
        1,
        MAX_TIMEOUT_SECONDS,
    )?;

    Ok(())
}
