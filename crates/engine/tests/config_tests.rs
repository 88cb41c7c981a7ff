use std::{env, fs};

use sempred_common::env::{SEMPRED_CONFIG, SEMPRED_PREDICATES};
use sempred_engine::PredicateConfig;
use serial_test::serial;
use tempfile::TempDir;
use tracing::info;

struct EnvGuard(&'static [&'static str]);

impl EnvGuard {
    fn clear(names: &'static [&'static str]) -> Self {
        for name in names {
            env::remove_var(name);
        }
        Self(names)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for name in self.0 {
            env::remove_var(name);
        }
    }
}

#[test]
fn test_default_config() {
    sempred_common::logging::ensure_test_logging(None);
    info!("Running test");
    let config = PredicateConfig::default();

    assert!(config.enabled);
    assert!(config.disabled_value);
    assert!(config.fallback_value);
}

#[test]
fn test_save_and_load_round_trip() {
    sempred_common::logging::ensure_test_logging(None);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sempred.toml");

    let config = PredicateConfig { enabled: false, disabled_value: false, fallback_value: true };
    config.save(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("enabled = false"), "{content}");
    assert_eq!(PredicateConfig::load_from(&path).unwrap(), config);
}

#[test]
fn test_load_from_missing_file_fails() {
    sempred_common::logging::ensure_test_logging(None);
    let dir = TempDir::new().unwrap();
    let err = PredicateConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_load_from_malformed_file_fails() {
    sempred_common::logging::ensure_test_logging(None);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "enabled = [").unwrap();

    let err = PredicateConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
#[serial]
fn test_load_uses_config_env_var() {
    sempred_common::logging::ensure_test_logging(None);
    let _guard = EnvGuard::clear(&[SEMPRED_CONFIG, SEMPRED_PREDICATES]);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "fallback_value = false\n").unwrap();

    env::set_var(SEMPRED_CONFIG, &path);
    let config = PredicateConfig::load().unwrap();
    assert!(config.enabled);
    assert!(!config.fallback_value);
}

#[test]
#[serial]
fn test_predicates_env_var_overrides_file() {
    sempred_common::logging::ensure_test_logging(None);
    let _guard = EnvGuard::clear(&[SEMPRED_CONFIG, SEMPRED_PREDICATES]);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "enabled = true\n").unwrap();

    env::set_var(SEMPRED_CONFIG, &path);
    env::set_var(SEMPRED_PREDICATES, "off");
    assert!(!PredicateConfig::load().unwrap().enabled);

    env::set_var(SEMPRED_PREDICATES, "not-a-switch");
    assert!(PredicateConfig::load().unwrap().enabled);
}

#[test]
#[serial]
fn test_apply_env_overrides_enables() {
    sempred_common::logging::ensure_test_logging(None);
    let _guard = EnvGuard::clear(&[SEMPRED_PREDICATES]);

    let mut config = PredicateConfig { enabled: false, ..Default::default() };
    config.apply_env_overrides();
    assert!(!config.enabled);

    env::set_var(SEMPRED_PREDICATES, "1");
    config.apply_env_overrides();
    assert!(config.enabled);
}
