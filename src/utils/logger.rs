use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crate-specific override, checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "BIRTHDAY_NOTIFIER_LOG";

/// Directives used when neither log variable is set.
///
/// The HTTP stack logs every connection at debug level, so it stays at warn
/// even in verbose mode.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "birthday_notifier=debug,hyper=warn,hyper_util=warn,reqwest=warn,info"
    } else {
        "birthday_notifier=info,hyper=warn,reqwest=warn,warn"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time() // Lambda 自帶時間戳
                .json()
                .with_current_span(true)
                .flatten_event(true),
        )
        .init();
}
