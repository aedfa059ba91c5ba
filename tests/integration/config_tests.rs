use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use iddedup::config::Config;
use iddedup::scanner::PolicyKind;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tempfile::TempDir;

// Serializes tests that read or write IDDEDUP_* variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_config_file_overrides_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
workers = 2
max_attempts = 1
retry_backoff_ms = 5
policy = "path"
snapshot = "/tmp/out.json"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path));

    assert_eq!(config.workers, 2);
    assert_eq!(config.max_attempts, 1);
    assert_eq!(config.retry_backoff_ms, 5);
    assert_eq!(config.policy, PolicyKind::Path);
    assert_eq!(config.snapshot, Some(PathBuf::from("/tmp/out.json")));
    assert_eq!(config.delimiter, "_");
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
    let dir = TempDir::new().unwrap();
    let config = Config::load(Some(&dir.path().join("absent.toml")));
    assert_eq!(config.workers, Config::default().workers);
}

#[test]
fn test_malformed_config_falls_back_to_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = \"many\"\n[[[").unwrap();

    assert_eq!(Config::load(Some(&path)), Config::default());
}

#[test]
fn test_invalid_values_fall_back_to_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = 0\n").unwrap();

    assert_eq!(Config::load(Some(&path)), Config::default());
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = 2\nretry_backoff_ms = 10\n").unwrap();

    std::env::set_var("IDDEDUP_RETRY_BACKOFF_MS", "250");
    let config: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("IDDEDUP_"))
        .extract();
    let loaded = Config::load(Some(&path));
    std::env::remove_var("IDDEDUP_RETRY_BACKOFF_MS");

    let config = config.unwrap();
    assert_eq!(config.workers, 2);
    assert_eq!(config.retry_backoff_ms, 250);
    assert_eq!(loaded, config);
}
