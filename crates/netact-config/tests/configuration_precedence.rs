//! Precedence checks for the layered daemon configuration.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use netact_config::{Config, DEFAULT_PORT, LogFormat, StatusMode};
use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::{fixture, rstest};
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const PORT_VAR: &str = "NETACT_PORT";

/// Serialises environment mutation and restores the previous value on drop.
struct EnvGuard {
    overrides: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn acquire() -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            overrides: Vec::new(),
            _lock: lock,
        }
    }

    fn set(&mut self, key: &'static str, value: &str) {
        self.overrides.push((key, std::env::var_os(key)));
        // Environment mutation is `unsafe` on edition 2024; the guard holds
        // the process-wide mutex for its whole lifetime.
        unsafe { std::env::set_var(key, value) };
    }

    fn clear(&mut self, key: &'static str) {
        self.overrides.push((key, std::env::var_os(key)));
        unsafe { std::env::remove_var(key) };
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        while let Some((key, previous)) = self.overrides.pop() {
            match previous {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

#[fixture]
fn env() -> EnvGuard {
    let mut guard = EnvGuard::acquire();
    guard.clear(PORT_VAR);
    guard.clear("NETACT_STATUS_MODE");
    guard.clear("NETACT_CONFIG_PATH");
    guard
}

fn args<I, S>(extra: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut all = vec![OsString::from("netactd")];
    all.extend(extra.into_iter().map(|arg| arg.as_ref().to_os_string()));
    all
}

fn load(arguments: Vec<OsString>) -> Config {
    match Config::load_from_iter(arguments) {
        Ok(config) => config,
        Err(error) => panic!("configuration should load: {error}"),
    }
}

#[rstest]
fn defaults_apply_without_overrides(env: EnvGuard) {
    let config = load(args(Vec::<&str>::new()));
    assert_eq!(config.port(), DEFAULT_PORT);
    assert_eq!(config.status_mode(), StatusMode::Compat);
    drop(env);
}

#[rstest]
fn environment_overrides_defaults(mut env: EnvGuard) {
    env.set(PORT_VAR, "27001");
    let config = load(args(Vec::<&str>::new()));
    assert_eq!(config.port(), 27001);
}

#[rstest]
fn cli_flags_override_environment(mut env: EnvGuard) {
    env.set(PORT_VAR, "27001");
    let config = load(args(["--port", "27002"]));
    assert_eq!(config.port(), 27002);
}

#[rstest]
fn configuration_file_is_applied(env: EnvGuard) {
    let temp_dir = match TempDir::new() {
        Ok(dir) => dir,
        Err(error) => panic!("failed to create temporary directory: {error}"),
    };
    let path = temp_dir.path().join("netact.toml");
    let contents =
        "port = 27003\nstatus_mode = \"typed\"\nlog_format = \"compact\"\nidle_timeout_ms = 500\n";
    if let Err(error) = fs::write(&path, contents) {
        panic!("failed to write configuration: {error}");
    }

    let config = load(args([OsString::from("--config-path"), path.into_os_string()]));
    assert_eq!(config.port(), 27003);
    assert_eq!(config.status_mode(), StatusMode::Typed);
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.idle_timeout_ms, 500);
    drop(env);
}
