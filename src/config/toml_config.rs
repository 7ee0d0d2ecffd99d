use crate::config::{validate_provider, DEFAULT_TIMEOUT_SECONDS};
use crate::core::ConfigProvider;
use crate::domain::model::{QueryFailurePolicy, SendFailurePolicy};
use crate::utils::error::{NotifierError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub notifier: NotifierSection,
    pub source: SourceConfig,
    pub message: MessageConfig,
    pub error_handling: Option<ErrorHandlingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierSection {
    pub name: Option<String>,
    pub initiating_user: String,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    pub subject: String,
    pub body: String,
    pub send_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    pub on_query_failure: Option<QueryFailurePolicy>,
    pub on_send_failure: Option<SendFailurePolicy>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NotifierError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| NotifierError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CRM_ACCESS_TOKEN})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| NotifierError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 用命令列有給的值覆蓋檔案設定
    #[cfg(feature = "cli")]
    pub fn apply_overrides(&mut self, cli: &crate::config::CliConfig) {
        if let Some(endpoint) = &cli.api_endpoint {
            self.source.endpoint = endpoint.clone();
        }
        if let Some(token) = &cli.access_token {
            self.source.access_token = Some(token.clone());
        }
        if let Some(user) = &cli.initiating_user {
            self.notifier.initiating_user = user.clone();
        }
        if let Some(subject) = &cli.subject {
            self.message.subject = subject.clone();
        }
        if let Some(body) = &cli.body {
            self.message.body = body.clone();
        }
        if let Some(tz) = &cli.timezone {
            self.notifier.timezone = Some(tz.clone());
        }
        if let Some(seconds) = cli.query_timeout_seconds {
            self.source.timeout_seconds = Some(seconds);
        }
        if let Some(seconds) = cli.send_timeout_seconds {
            self.message.send_timeout_seconds = Some(seconds);
        }

        let handling = self.error_handling.get_or_insert_with(Default::default);
        if cli.on_query_failure.is_some() {
            handling.on_query_failure = cli.on_query_failure;
        }
        if cli.on_send_failure.is_some() {
            handling.on_send_failure = cli.on_send_failure;
        }
    }

    pub fn name(&self) -> &str {
        self.notifier.name.as_deref().unwrap_or("birthday-notifier")
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn access_token(&self) -> Option<&str> {
        self.source.access_token.as_deref()
    }

    fn initiating_user(&self) -> &str {
        &self.notifier.initiating_user
    }

    fn subject(&self) -> &str {
        &self.message.subject
    }

    fn body(&self) -> &str {
        &self.message.body
    }

    fn timezone(&self) -> Option<&str> {
        self.notifier.timezone.as_deref()
    }

    fn query_timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn send_timeout_seconds(&self) -> u64 {
        self.message
            .send_timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn on_query_failure(&self) -> QueryFailurePolicy {
        self.error_handling
            .as_ref()
            .and_then(|h| h.on_query_failure)
            .unwrap_or_default()
    }

    fn on_send_failure(&self) -> SendFailurePolicy {
        self.error_handling
            .as_ref()
            .and_then(|h| h.on_send_failure)
            .unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        // 未被替換的 ${VAR} 代表環境變數沒有設定
        if let Some(token) = &self.source.access_token {
            if token.starts_with("${") {
                return Err(NotifierError::MissingConfigError {
                    field: token.trim_start_matches("${").trim_end_matches('}').to_string(),
                });
            }
        }

        validate_provider(self)
    }
}
