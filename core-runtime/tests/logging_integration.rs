//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, redact_secrets, LogFormat, LoggingConfig,
};

#[test]
fn test_logging_initializes_once_per_process() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    assert!(init_logging(config.clone()).is_ok());
    // A second global subscriber is rejected
    assert!(init_logging(config).is_err());
}

#[test]
fn test_secret_params_are_redacted_case_insensitively() {
    let url = "https://api.trakt.tv/users/u/lists/l/items?API_KEY=a&page=1&Token=t";
    let redacted = redact_secrets(url);

    assert_eq!(
        redacted,
        "https://api.trakt.tv/users/u/lists/l/items?API_KEY=[REDACTED]&page=1&Token=[REDACTED]"
    );
}

#[test]
fn test_redaction_leaves_plain_values_alone() {
    assert_eq!(redact_if_sensitive("group", "Noir Classics"), "Noir Classics");
    assert_eq!(redact_if_sensitive("path", "/media/movies"), "/media/movies");
    assert_eq!(redact_if_sensitive("tmdb_api_key", "abc"), "[REDACTED]");
}
