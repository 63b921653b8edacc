pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn is_no_color_requested() -> bool {
    no_color_env_requested() || is_dumb_terminal()
}

pub(crate) fn should_use_spinner(
    stderr_is_terminal: bool,
    quiet: bool,
    dumb_terminal: bool,
) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

pub(crate) fn init_tracing(default_level: &str, no_color: bool) {
    let directive = log_filter_directive(std::env::var("RUST_LOG").ok(), default_level);
    let filter = tracing_subscriber::EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}

/// A non-empty `RUST_LOG` wins over the level derived from `-q`, `-v` and
/// the config file.
pub(crate) fn log_filter_directive(rust_log: Option<String>, default_level: &str) -> String {
    rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_level.to_string())
}

#[cfg(test)]
mod tests {
    use super::{log_filter_directive, should_use_spinner};

    #[test]
    fn test_spinner_only_on_interactive_non_quiet_terminal() {
        assert!(should_use_spinner(true, false, false));
        assert!(!should_use_spinner(false, false, false));
        assert!(!should_use_spinner(true, true, false));
        assert!(!should_use_spinner(true, false, true));
    }

    #[test]
    fn test_rust_log_wins_over_cli_level() {
        assert_eq!(
            log_filter_directive(Some("voltdownload_core=trace".to_string()), "error"),
            "voltdownload_core=trace"
        );
    }

    #[test]
    fn test_cli_level_used_without_rust_log() {
        assert_eq!(log_filter_directive(None, "debug"), "debug");
        assert_eq!(log_filter_directive(Some("  ".to_string()), "error"), "error");
    }
}
