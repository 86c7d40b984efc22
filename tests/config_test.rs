use fintrack_server::config::{Config, ConfigError};
use fintrack_server::constants::{DEFAULT_DATA_PATH, SESSION_EXPIRY_DAYS};
use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

fn secret() -> String {
    "s".repeat(64)
}

#[test]
fn defaults_apply_when_only_secret_is_set() {
    let secret = secret();
    let config = Config::from_lookup(lookup(&[("SESSION_SECRET", secret.as_str())])).unwrap();

    assert_eq!(config.bind_address(), "0.0.0.0:3000");
    assert_eq!(config.data_path, DEFAULT_DATA_PATH);
    assert_eq!(config.session_expiry_days, SESSION_EXPIRY_DAYS);
    assert!(!config.secure_cookies);
    assert_eq!(config.cors_allowed_origin, None);
}

#[test]
fn overrides_are_read() {
    let secret = secret();
    let config = Config::from_lookup(lookup(&[
        ("SESSION_SECRET", secret.as_str()),
        ("SERVER_HOST", "127.0.0.1"),
        ("SERVER_PORT", "8080"),
        ("DATABASE_PATH", "/tmp/ledgers"),
        ("SESSION_EXPIRY_DAYS", "7"),
        ("SESSION_SECURE_COOKIE", "true"),
        ("CORS_ALLOWED_ORIGIN", "https://example.org"),
    ]))
    .unwrap();

    assert_eq!(config.bind_address(), "127.0.0.1:8080");
    assert_eq!(config.data_path, "/tmp/ledgers");
    assert_eq!(config.session_expiry_days, 7);
    assert!(config.secure_cookies);
    assert_eq!(
        config.cors_allowed_origin.as_deref(),
        Some("https://example.org")
    );
}

#[test]
fn invalid_values_are_reported() {
    let secret = secret();

    assert_eq!(
        Config::from_lookup(lookup(&[])).unwrap_err(),
        ConfigError::MissingSessionSecret
    );
    assert!(matches!(
        Config::from_lookup(lookup(&[("SESSION_SECRET", "short")])).unwrap_err(),
        ConfigError::InvalidSessionSecret(_)
    ));
    assert_eq!(
        Config::from_lookup(lookup(&[
            ("SESSION_SECRET", secret.as_str()),
            ("SERVER_PORT", "99999"),
        ]))
        .unwrap_err(),
        ConfigError::InvalidPort("99999".to_string())
    );
    assert!(matches!(
        Config::from_lookup(lookup(&[
            ("SESSION_SECRET", secret.as_str()),
            ("SESSION_EXPIRY_DAYS", "0"),
        ]))
        .unwrap_err(),
        ConfigError::InvalidSessionExpiry(_)
    ));
    assert!(matches!(
        Config::from_lookup(lookup(&[
            ("SESSION_SECRET", secret.as_str()),
            ("SESSION_SECURE_COOKIE", "maybe"),
        ]))
        .unwrap_err(),
        ConfigError::InvalidFlag { .. }
    ));
}
