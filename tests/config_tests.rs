//! Config file and environment layering through the public loader.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use ion_publish::config::{ConfigError, IonConfig, DEFAULT_CALLBACK_PORT};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 5] = [
    "ION_SERVER",
    "ION_API_SERVER",
    "ION_CLIENT_ID",
    "ION_TOKEN_PATH",
    "ION_CALLBACK_PORT",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clean_env() -> (std::sync::MutexGuard<'static, ()>, EnvGuard) {
    let lock = env_lock_guard();
    let guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    (lock, guard)
}

#[test]
fn load_without_file_or_env_uses_defaults() {
    let (_lock, _guard) = clean_env();
    let config = IonConfig::load(None).unwrap();
    assert_eq!(config.callback_port, DEFAULT_CALLBACK_PORT);
    assert_eq!(config.redirect_uri(), "http://localhost:10101/oauth");
    assert_eq!(config.callback_wait().budget(), Duration::from_secs(60));
}

#[test]
fn load_layers_env_over_file() {
    let (_lock, _guard) = clean_env();
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("ion.toml");
    std::fs::write(
        &file,
        r#"
api_server = "https://api.example.test"
client_id = "from-file"
token_path = "/tmp/file-token"

[callback]
port = 20202
max_attempts = 5
"#,
    )
    .unwrap();
    std::env::set_var("ION_CLIENT_ID", "from-env");

    let config = IonConfig::load(Some(&file)).unwrap();
    assert_eq!(config.api_server, "https://api.example.test");
    assert_eq!(config.client_id, "from-env");
    assert_eq!(config.token_path, PathBuf::from("/tmp/file-token"));
    assert_eq!(config.callback_port, 20202);
    assert_eq!(config.callback_max_attempts, 5);
    assert_eq!(config.assets_endpoint(), "https://api.example.test/v1/assets");
}

#[test]
fn missing_file_reports_path() {
    let (_lock, _guard) = clean_env();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    match IonConfig::load(Some(&missing)) {
        Err(ConfigError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn from_env_rejects_bad_port() {
    let (_lock, _guard) = clean_env();
    std::env::set_var("ION_CALLBACK_PORT", "not-a-port");

    assert!(matches!(
        IonConfig::from_env(),
        Err(ConfigError::InvalidValue { ref key, .. }) if key == "ION_CALLBACK_PORT"
    ));
}

#[test]
fn from_env_reads_servers() {
    let (_lock, _guard) = clean_env();
    std::env::set_var("ION_SERVER", "https://ion.example.test/");
    std::env::set_var("ION_API_SERVER", "https://api.example.test/");

    let config = IonConfig::from_env().unwrap();
    assert_eq!(config.authorize_endpoint(), "https://ion.example.test/ion/oauth");
    assert_eq!(config.token_endpoint(), "https://api.example.test/oauth/token");
}
