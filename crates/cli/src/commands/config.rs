use std::env;
use std::fs;
use std::path::Path;

use roulette_core::config::{resolve_config_path, AppConfig};
use toml::Value;

/// Renders the effective configuration, naming where each value came from.
/// `flag_keys` lists the keys overridden on the command line.
pub fn run(config: &AppConfig, explicit_path: Option<&Path>, flag_keys: &[&str]) -> String {
    let config_file_path = resolve_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(
            key_path,
            env_keys,
            flag_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        )
    };

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    lines.push(render_line(
        "storage.data_path",
        &config.storage.data_path.display().to_string(),
        source("storage.data_path", &["ROULETTE_STORAGE_DATA_PATH"]),
    ));
    lines.push(render_line(
        "storage.write_policy",
        &format!("{:?}", config.storage.write_policy),
        source("storage.write_policy", &["ROULETTE_STORAGE_WRITE_POLICY"]),
    ));
    lines.push(render_line(
        "selection.max_reviewers_per_request",
        &config.selection.max_reviewers_per_request.to_string(),
        source("selection.max_reviewers_per_request", &["ROULETTE_SELECTION_MAX_REVIEWERS"]),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["ROULETTE_LOGGING_LEVEL", "ROULETTE_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["ROULETTE_LOGGING_FORMAT", "ROULETTE_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    flag_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if flag_keys.contains(&key_path) {
        return "flag".to_string();
    }

    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
