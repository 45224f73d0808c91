use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub selection: SelectionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub data_path: PathBuf,
    pub write_policy: WritePolicy,
}

#[derive(Clone, Debug)]
pub struct SelectionConfig {
    /// Upper bound on the review count a requester may ask for in one draw.
    pub max_reviewers_per_request: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// What a mutating store call does when the document cannot be written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Log the failure and hand back the in-memory result.
    #[default]
    BestEffort,
    /// Return the failure to the caller. In-memory state is kept either way.
    Strict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub data_path: Option<PathBuf>,
    pub write_policy: Option<WritePolicy>,
    pub max_reviewers_per_request: Option<u32>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["roulette.toml", "config/roulette.toml"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_path: PathBuf::from("data.json"),
                write_policy: WritePolicy::BestEffort,
            },
            selection: SelectionConfig { max_reviewers_per_request: 3 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for WritePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(ConfigError::Validation(format!(
                "unsupported write policy `{other}` (expected best_effort|strict)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(storage) = patch.storage {
            if let Some(data_path) = storage.data_path {
                self.storage.data_path = data_path;
            }
            if let Some(write_policy) = storage.write_policy {
                self.storage.write_policy = write_policy;
            }
        }

        if let Some(selection) = patch.selection {
            if let Some(max_reviewers) = selection.max_reviewers_per_request {
                self.selection.max_reviewers_per_request = max_reviewers;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ROULETTE_STORAGE_DATA_PATH") {
            self.storage.data_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("ROULETTE_STORAGE_WRITE_POLICY") {
            self.storage.write_policy = value.parse()?;
        }

        if let Some(value) = read_env("ROULETTE_SELECTION_MAX_REVIEWERS") {
            self.selection.max_reviewers_per_request =
                parse_u32("ROULETTE_SELECTION_MAX_REVIEWERS", &value)?;
        }

        let log_level =
            read_env("ROULETTE_LOGGING_LEVEL").or_else(|| read_env("ROULETTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ROULETTE_LOGGING_FORMAT").or_else(|| read_env("ROULETTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(data_path) = overrides.data_path {
            self.storage.data_path = data_path;
        }
        if let Some(write_policy) = overrides.write_policy {
            self.storage.write_policy = write_policy;
        }
        if let Some(max_reviewers) = overrides.max_reviewers_per_request {
            self.selection.max_reviewers_per_request = max_reviewers;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_storage(&self.storage)?;
        validate_selection(&self.selection)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First config file that exists, honouring an explicit path when one is given.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    if storage.data_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("storage.data_path must not be empty".to_string()));
    }

    if storage.data_path.is_dir() {
        return Err(ConfigError::Validation(format!(
            "storage.data_path `{}` points to a directory, expected a JSON file",
            storage.data_path.display()
        )));
    }

    Ok(())
}

fn validate_selection(selection: &SelectionConfig) -> Result<(), ConfigError> {
    if selection.max_reviewers_per_request == 0 || selection.max_reviewers_per_request > 50 {
        return Err(ConfigError::Validation(
            "selection.max_reviewers_per_request must be in range 1..=50".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    storage: Option<StoragePatch>,
    selection: Option<SelectionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    data_path: Option<PathBuf>,
    write_policy: Option<WritePolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct SelectionPatch {
    max_reviewers_per_request: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, WritePolicy};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ROULETTE_VARS: &[&str] = &[
        "ROULETTE_STORAGE_DATA_PATH",
        "ROULETTE_STORAGE_WRITE_POLICY",
        "ROULETTE_SELECTION_MAX_REVIEWERS",
        "ROULETTE_LOGGING_LEVEL",
        "ROULETTE_LOG_LEVEL",
        "ROULETTE_LOGGING_FORMAT",
        "ROULETTE_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid_without_file_or_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ROULETTE_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.storage.data_path == PathBuf::from("data.json"), "default data path")?;
        ensure(config.storage.write_policy == WritePolicy::BestEffort, "default write policy")?;
        ensure(config.selection.max_reviewers_per_request == 3, "default reviewer cap")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "default log format")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ROULETTE_VARS);

        env::set_var("TEST_ROULETTE_DATA_DIR", "/var/lib/roulette");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("roulette.toml");
            fs::write(
                &path,
                r#"
[storage]
data_path = "${TEST_ROULETTE_DATA_DIR}/data.json"
write_policy = "strict"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.storage.data_path == PathBuf::from("/var/lib/roulette/data.json"),
                "data path should be interpolated from environment",
            )?;
            ensure(
                config.storage.write_policy == WritePolicy::Strict,
                "write policy should come from file",
            )
        })();

        clear_vars(&["TEST_ROULETTE_DATA_DIR"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ROULETTE_VARS);

        env::set_var("ROULETTE_LOG_LEVEL", "warn");
        env::set_var("ROULETTE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(ROULETTE_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ROULETTE_VARS);

        env::set_var("ROULETTE_STORAGE_DATA_PATH", "from-env.json");
        env::set_var("ROULETTE_SELECTION_MAX_REVIEWERS", "5");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("roulette.toml");
            fs::write(
                &path,
                r#"
[storage]
data_path = "from-file.json"

[selection]
max_reviewers_per_request = 2

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    data_path: Some(PathBuf::from("from-override.json")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.storage.data_path == PathBuf::from("from-override.json"),
                "override data path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.selection.max_reviewers_per_request == 5,
                "env reviewer cap should win over file",
            )
        })();

        clear_vars(ROULETTE_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ROULETTE_VARS);

        env::set_var("ROULETTE_SELECTION_MAX_REVIEWERS", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message)
                    if message.contains("selection.max_reviewers_per_request")
            );
            ensure(has_message, "validation failure should name the offending key")
        })();

        clear_vars(ROULETTE_VARS);
        result
    }

    #[test]
    fn non_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ROULETTE_VARS);

        env::set_var("ROULETTE_SELECTION_MAX_REVIEWERS", "three");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                key == "ROULETTE_SELECTION_MAX_REVIEWERS",
                "invalid override should name the env var",
            ),
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected invalid override failure".to_string()),
        };

        clear_vars(ROULETTE_VARS);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ROULETTE_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(ref path)) if *path == missing),
            "missing required file should be reported",
        )
    }
}
