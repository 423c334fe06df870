use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("unknown").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "EVLOC_ENV"));
}

#[test]
fn build_app_config_uses_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:5000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(
        cfg.catalog_path.to_str(),
        Some("./Bhubaneswar_Charging_Station.csv")
    );
    assert_eq!(cfg.artifact_dir.to_str(), Some("./static"));
    assert_eq!(cfg.render_timeout_secs, 30);
}

#[test]
fn build_app_config_applies_overrides() {
    let mut map = HashMap::new();
    map.insert("EVLOC_ENV", "production");
    map.insert("EVLOC_BIND_ADDR", "127.0.0.1:8080");
    map.insert("EVLOC_LOG_LEVEL", "debug");
    map.insert("EVLOC_CATALOG_PATH", "/data/stations.csv");
    map.insert("EVLOC_ARTIFACT_DIR", "/var/lib/evloc");
    map.insert("EVLOC_RENDER_TIMEOUT_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.bind_addr.port(), 8080);
    assert_eq!(cfg.log_level, "debug");
    assert_eq!(cfg.catalog_path.to_str(), Some("/data/stations.csv"));
    assert_eq!(cfg.artifact_dir.to_str(), Some("/var/lib/evloc"));
    assert_eq!(cfg.render_timeout_secs, 5);
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("EVLOC_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "EVLOC_BIND_ADDR"),
        "expected InvalidEnvVar(EVLOC_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_on_invalid_evloc_env() {
    let mut map = HashMap::new();
    map.insert("EVLOC_ENV", "producton");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "EVLOC_ENV"),
        "expected InvalidEnvVar(EVLOC_ENV), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_on_non_numeric_render_timeout() {
    let mut map = HashMap::new();
    map.insert("EVLOC_RENDER_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "EVLOC_RENDER_TIMEOUT_SECS"),
        "expected InvalidEnvVar(EVLOC_RENDER_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_on_zero_render_timeout() {
    let mut map = HashMap::new();
    map.insert("EVLOC_RENDER_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "EVLOC_RENDER_TIMEOUT_SECS"),
        "expected InvalidEnvVar(EVLOC_RENDER_TIMEOUT_SECS), got: {result:?}"
    );
}
