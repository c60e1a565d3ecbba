use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable read by the `keygen` binary to configure its log
/// filter, e.g. `KEYGEN_LOG=debug`.
pub const LOG_ENV_VAR: &str = "KEYGEN_LOG";

/// Initializes `tracing` logging with options from the environment variable
/// given in the `env` parameter.
///
/// Logs are written to stderr. If the variable is not set or cannot be parsed,
/// the maximum log level is set to INFO.
pub fn initialize_logging(env: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(env))
        .with_writer(std::io::stderr)
        .init();
}

fn env_filter(env: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_env_var(env)
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_logs_at_info() {
        let filter = env_filter("KEYGEN_LOG_UNSET_IN_TESTS");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
