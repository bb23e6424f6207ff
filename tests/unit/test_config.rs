//! Environment-driven server configuration.

use diagram_collab_server::config::{ConfigError, LogFormat, ServerConfig};
use serial_test::serial;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = ServerConfig::from_lookup(lookup(&[])).unwrap();

    assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(config.port, 8081);
    assert_eq!(config.auth_service_url.as_str(), "http://localhost:8080/");
    assert_eq!(config.database_url, None);
    assert_eq!(config.broadcast_capacity, 256);
    assert!(config.log_relation_removal);
    assert!(config.cors_allowed_origins.is_empty());
    assert_eq!(config.log_format, LogFormat::Text);
}

#[test]
fn test_overrides() {
    let config = ServerConfig::from_lookup(lookup(&[
        ("PORT", "9000"),
        ("BIND_ADDRESS", "127.0.0.1"),
        ("AUTH_SERVICE_URL", "http://auth:4000/api"),
        ("DATABASE_URL", "postgres://localhost/collab"),
        ("BROADCAST_CAPACITY", "16"),
        ("LOG_RELATION_REMOVAL", "false"),
        ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ("LOG_FORMAT", "json"),
    ]))
    .unwrap();

    assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
    assert_eq!(config.auth_service_url.as_str(), "http://auth:4000/api");
    assert_eq!(
        config.database_url.as_deref(),
        Some("postgres://localhost/collab")
    );
    assert_eq!(config.broadcast_capacity, 16);
    assert!(!config.log_relation_removal);
    assert_eq!(
        config.cors_allowed_origins,
        vec!["http://a.test".to_string(), "http://b.test".to_string()]
    );
    assert_eq!(config.log_format, LogFormat::Json);
}

#[test]
fn test_blank_values_fall_back_to_defaults() {
    let config = ServerConfig::from_lookup(lookup(&[("PORT", "  "), ("DATABASE_URL", "")])).unwrap();
    assert_eq!(config.port, 8081);
    assert_eq!(config.database_url, None);
}

#[test]
fn test_invalid_values_are_rejected() {
    let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));

    let err = ServerConfig::from_lookup(lookup(&[("AUTH_SERVICE_URL", "not a url")])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: "AUTH_SERVICE_URL",
            ..
        }
    ));

    let err = ServerConfig::from_lookup(lookup(&[("BROADCAST_CAPACITY", "0")])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: "BROADCAST_CAPACITY",
            ..
        }
    ));

    assert!(ServerConfig::from_lookup(lookup(&[("LOG_RELATION_REMOVAL", "maybe")])).is_err());
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    unsafe {
        std::env::set_var("PORT", "9191");
        std::env::set_var("LOG_RELATION_REMOVAL", "0");
    }

    let config = ServerConfig::from_env();

    unsafe {
        std::env::remove_var("PORT");
        std::env::remove_var("LOG_RELATION_REMOVAL");
    }

    let config = config.unwrap();
    assert_eq!(config.port, 9191);
    assert!(!config.log_relation_removal);
}

#[test]
#[serial]
fn test_from_env_surfaces_invalid_port() {
    unsafe {
        std::env::set_var("PORT", "70000");
    }

    let result = ServerConfig::from_env();

    unsafe {
        std::env::remove_var("PORT");
    }

    assert!(result.is_err());
}
