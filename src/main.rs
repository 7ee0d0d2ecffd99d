use anyhow::Context;
use birthday_notifier::utils::error::ErrorSeverity;
use birthday_notifier::utils::{logger, validation::Validate};
use birthday_notifier::{run_with_config, CliConfig, TomlConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting birthday-notifier");

    let result = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let mut config = TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            config.apply_overrides(&cli);
            validate_or_exit(&config);
            tracing::debug!("Running notifier '{}'", config.name());
            run_with_config(&config).await
        }
        None => {
            cli.apply_env_fallbacks();
            validate_or_exit(&cli);
            run_with_config(&cli).await
        }
    };

    match result {
        Ok(summary) => {
            println!(
                "✅ {} birthday email(s) sent, {} failed, {} contact(s) skipped ({} matched out of {})",
                summary.sent(),
                summary.failed(),
                summary.skipped,
                summary.matched,
                summary.candidates
            );

            if summary.failed() > 0 {
                std::process::exit(2);
            }
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn validate_or_exit<V: Validate>(config: &V) {
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
}
