use crate::config::{validate_provider, DEFAULT_TIMEOUT_SECONDS};
use crate::core::ConfigProvider;
use crate::domain::model::{QueryFailurePolicy, SendFailurePolicy};
use crate::utils::error::{NotifierError, Result};
use crate::utils::validation::Validate;
use std::env;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub initiating_user: String,
    pub subject: String,
    pub body: String,
    pub timezone: Option<String>,
    pub query_timeout_seconds: u64,
    pub send_timeout_seconds: u64,
    pub on_query_failure: QueryFailurePolicy,
    pub on_send_failure: SendFailurePolicy,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_endpoint: env::var("NOTIFIER_API_ENDPOINT").map_err(|_| {
                NotifierError::MissingConfigError {
                    field: "NOTIFIER_API_ENDPOINT".to_string(),
                }
            })?,
            access_token: env::var("NOTIFIER_ACCESS_TOKEN").ok(),
            initiating_user: env::var("NOTIFIER_INITIATING_USER").unwrap_or_default(),
            subject: env::var("NOTIFIER_SUBJECT").unwrap_or_default(),
            body: env::var("NOTIFIER_BODY").unwrap_or_default(),
            timezone: env::var("NOTIFIER_TIMEZONE").ok(),
            query_timeout_seconds: parse_seconds("NOTIFIER_QUERY_TIMEOUT_SECONDS")?,
            send_timeout_seconds: parse_seconds("NOTIFIER_SEND_TIMEOUT_SECONDS")?,
            on_query_failure: parse_policy("NOTIFIER_ON_QUERY_FAILURE")?,
            on_send_failure: parse_policy("NOTIFIER_ON_SEND_FAILURE")?,
        })
    }

    /// 排程事件可以覆蓋主旨、內文與寄件者
    pub fn apply_event(
        &mut self,
        subject: Option<String>,
        body: Option<String>,
        initiating_user: Option<String>,
    ) {
        if let Some(subject) = subject {
            self.subject = subject;
        }
        if let Some(body) = body {
            self.body = body;
        }
        if let Some(user) = initiating_user {
            self.initiating_user = user;
        }
    }
}

fn parse_seconds(key: &str) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| NotifierError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw.clone(),
                reason: "expected a whole number of seconds".to_string(),
            }),
        Err(_) => Ok(DEFAULT_TIMEOUT_SECONDS),
    }
}

fn parse_policy<P>(key: &str) -> Result<P>
where
    P: std::str::FromStr<Err = String> + Default,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|reason| NotifierError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw.clone(),
                reason,
            }),
        Err(_) => Ok(P::default()),
    }
}

impl ConfigProvider for LambdaConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn initiating_user(&self) -> &str {
        &self.initiating_user
    }

    fn subject(&self) -> &str {
        &self.subject
    }

    fn body(&self) -> &str {
        &self.body
    }

    fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    fn query_timeout_seconds(&self) -> u64 {
        self.query_timeout_seconds
    }

    fn send_timeout_seconds(&self) -> u64 {
        self.send_timeout_seconds
    }

    fn on_query_failure(&self) -> QueryFailurePolicy {
        self.on_query_failure
    }

    fn on_send_failure(&self) -> SendFailurePolicy {
        self.on_send_failure
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
