//! Layered configuration store.
//!
//! # Precedence
//!
//! Lowest to highest:
//!
//! 1. built-in defaults
//! 2. config file (`hurlsh.{yaml,yml,json,toml}`)
//! 3. environment (`HURLSH_<KEY>`)
//! 4. application command-line flags
//! 5. explicit sets (toggles issued at the interactive prompt)
//! 6. interactive line flags, cleared after every command
//!
//! Object values found in several layers are deep-merged.

use crate::application::config_store::ConfigStore;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const APP_NAME: &str = "hurlsh";
pub const ENV_PREFIX: &str = "HURLSH_";

pub const DEBUG_KEY: &str = "debug";
pub const VERBOSE_KEY: &str = "verbose";
pub const JSON_KEY: &str = "json";

const CONFIG_EXTENSIONS: [&str; 4] = ["yaml", "yml", "json", "toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config file format: '{0}'")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LayeredConfig {
    defaults: Value,
    file: Value,
    env: HashMap<String, String>,
    flags: Value,
    sets: Value,
    line_flags: Value,
    file_path: Option<PathBuf>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            defaults: json!({ DEBUG_KEY: false, VERBOSE_KEY: false, JSON_KEY: false }),
            file: empty(),
            env: HashMap::new(),
            flags: empty(),
            sets: empty(),
            line_flags: empty(),
            file_path: None,
        }
    }
}

fn empty() -> Value {
    Value::Object(Map::new())
}

impl LayeredConfig {
    /// Loads the config file (explicit path or the first one found on the search
    /// path) and captures the process environment.
    ///
    /// A missing or unreadable file leaves the file layer empty.
    pub fn load(explicit_path: Option<&Path>) -> Self {
        let mut config = Self::default().with_env(std::env::vars());
        config.file_path = explicit_path
            .map(Path::to_path_buf)
            .or_else(Self::find_config_file);
        config.reload();
        config
    }

    #[cfg(test)]
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            file: normalize(serde_yaml::from_str(content)?),
            ..Self::default()
        })
    }

    /// Keeps the `HURLSH_*` variables of `vars` as the environment layer.
    pub fn with_env<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env = vars
            .into_iter()
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        self
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Re-reads the config file.
    pub fn reload(&mut self) {
        let Some(path) = self.file_path.clone() else {
            debug!("No config file found");
            self.file = empty();
            return;
        };
        match Self::read_file(&path) {
            Ok(value) => {
                debug!(path = %path.display(), "Using config file");
                self.file = value;
            }
            Err(err) => {
                warn!("Error loading config file: {}", err);
                self.file = empty();
            }
        }
    }

    fn config_search_paths() -> Vec<PathBuf> {
        let mut dirs = vec![PathBuf::from(".")];
        if let Some(home) = dirs::home_dir() {
            dirs.push(home);
        }
        dirs.into_iter()
            .flat_map(|dir| {
                CONFIG_EXTENSIONS
                    .iter()
                    .map(move |ext| dir.join(format!("{}.{}", APP_NAME, ext)))
            })
            .collect()
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::config_search_paths().into_iter().find(|p| p.exists())
    }

    fn read_file(path: &Path) -> Result<Value, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let value: Value = match ext.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        Ok(normalize(value))
    }

    /// Sets `key` above flags, env and file. Survives until overwritten.
    pub fn set(&mut self, key: &str, value: Value) {
        insert_path(&mut self.sets, key, value);
    }

    /// Records a flag given on the application command line.
    pub fn set_flag(&mut self, key: &str, value: Value) {
        insert_path(&mut self.flags, key, value);
    }

    /// Records a flag given for the current interactive command only.
    pub fn set_line_flag(&mut self, key: &str, value: Value) {
        insert_path(&mut self.line_flags, key, value);
    }

    pub fn clear_line_flags(&mut self) {
        self.line_flags = empty();
    }

    fn env_lookup(&self, key: &str) -> Option<Value> {
        let var = format!("{}{}", ENV_PREFIX, key.replace('.', "_").to_ascii_uppercase());
        self.env.get(&var).map(|v| Value::String(v.clone()))
    }

    /// The fully merged settings, for display.
    pub fn all_settings(&self) -> Value {
        let mut merged = self.defaults.clone();
        for layer in [&self.file, &self.flags, &self.sets, &self.line_flags] {
            merge(&mut merged, layer.clone());
        }
        for (var, value) in &self.env {
            let key = var[ENV_PREFIX.len()..].to_ascii_lowercase();
            if let Value::Object(map) = &mut merged {
                let existing = map.keys().find(|k| k.to_ascii_lowercase() == key).cloned();
                map.insert(existing.unwrap_or(key), Value::String(value.clone()));
            }
        }
        merged
    }
}

impl ConfigStore for LayeredConfig {
    fn get(&self, key: &str) -> Option<Value> {
        let layers = [
            lookup(&self.defaults, key),
            lookup(&self.file, key),
            self.env_lookup(key),
            lookup(&self.flags, key),
            lookup(&self.sets, key),
            lookup(&self.line_flags, key),
        ];

        layers.into_iter().flatten().fold(None, |acc, value| {
            Some(match (acc, value) {
                (Some(mut base @ Value::Object(_)), top @ Value::Object(_)) => {
                    merge(&mut base, top);
                    base
                }
                (_, top) => top,
            })
        })
    }

    fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

fn lookup(root: &Value, key: &str) -> Option<Value> {
    key.split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
        .cloned()
}

fn insert_path(root: &mut Value, key: &str, value: Value) {
    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };
    let mut node = root;
    for segment in segments {
        if !node.is_object() {
            *node = empty();
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map.entry(segment.to_string()).or_insert_with(empty);
    }
    if !node.is_object() {
        *node = empty();
    }
    if let Value::Object(map) = node {
        map.insert(last.to_string(), value);
    }
}

fn merge(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (k, v) in top_map {
                match base_map.get_mut(&k) {
                    Some(existing) => merge(existing, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (base, top) => *base = top,
    }
}

/// An empty document parses as null; treat it as an empty mapping.
fn normalize(value: Value) -> Value {
    match value {
        Value::Null => empty(),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config_store::ConfigStoreExt;
    use std::io::Write;

    const YAML: &str = r#"
defaultConnection: prod
verbose: true
connections:
  prod:
    serviceURL: https://prod.example.com
    headers:
      X-One: "1"
"#;

    #[test]
    fn nested_keys_are_resolved() {
        let config = LayeredConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.get_string("defaultConnection"), "prod");
        assert_eq!(
            config.get_string("connections.prod.serviceURL"),
            "https://prod.example.com"
        );
        assert!(config.is_set("connections.prod"));
        assert!(!config.is_set("connections.staging"));
        assert!(!config.is_set("connections.prod.serviceURL.deeper"));
    }

    fn connection_names(config: &LayeredConfig) -> Vec<String> {
        let mut names: Vec<String> = match config.get("connections") {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        names.sort();
        names
    }

    #[test]
    fn defaults_apply_when_nothing_else_is_set() {
        let config = LayeredConfig::default();
        assert!(!config.get_bool(DEBUG_KEY));
        assert!(config.is_set(DEBUG_KEY));
        assert!(connection_names(&config).is_empty());
    }

    #[test]
    fn empty_document_is_an_empty_mapping() {
        let config = LayeredConfig::from_yaml_str("").unwrap();
        assert!(config.get("connections").is_none());
    }

    #[test]
    fn precedence_runs_from_file_to_line_flags() {
        let mut config = LayeredConfig::from_yaml_str("defaultConnection: file\n")
            .unwrap()
            .with_env([("HURLSH_DEFAULTCONNECTION".to_string(), "env".to_string())]);
        assert_eq!(config.get_string("defaultConnection"), "env");

        config.set_flag("defaultConnection", json!("flag"));
        assert_eq!(config.get_string("defaultConnection"), "flag");

        config.set("defaultConnection", json!("set"));
        assert_eq!(config.get_string("defaultConnection"), "set");

        config.set_line_flag("defaultConnection", json!("line"));
        assert_eq!(config.get_string("defaultConnection"), "line");

        config.clear_line_flags();
        assert_eq!(config.get_string("defaultConnection"), "set");
    }

    #[test]
    fn unrelated_env_vars_are_ignored() {
        let config = LayeredConfig::default().with_env([
            ("PATH".to_string(), "/bin".to_string()),
            ("HURLSH_DEBUG".to_string(), "true".to_string()),
        ]);
        assert!(config.get_bool(DEBUG_KEY));
        assert!(config.get("path").is_none());
    }

    #[test]
    fn objects_are_merged_across_layers() {
        let mut config = LayeredConfig::from_yaml_str(YAML).unwrap();
        config.set("connections.extra.serviceURL", json!("http://extra"));
        config.set("connections.prod.authToken", json!("tok"));

        assert_eq!(connection_names(&config), vec!["extra", "prod"]);
        assert_eq!(config.get_string("connections.prod.authToken"), "tok");
        assert_eq!(
            config.get_string("connections.prod.serviceURL"),
            "https://prod.example.com"
        );
    }

    #[test]
    fn scalar_set_replaces_object() {
        let mut config = LayeredConfig::from_yaml_str(YAML).unwrap();
        config.set("connections.prod.headers", json!("none"));
        assert_eq!(config.get("connections.prod.headers"), Some(json!("none")));
    }

    #[test]
    fn files_are_read_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("hurlsh.yaml");
        std::fs::write(&yaml, YAML).unwrap();
        let config = LayeredConfig::load(Some(yaml.as_path()));
        assert_eq!(config.get_string("defaultConnection"), "prod");

        let toml_path = dir.path().join("hurlsh.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        writeln!(file, "defaultConnection = \"t\"\n[connections.t]\nserviceURL = \"http://t\"").unwrap();
        let config = LayeredConfig::load(Some(toml_path.as_path()));
        assert_eq!(config.get_string("connections.t.serviceURL"), "http://t");

        let json_path = dir.path().join("hurlsh.json");
        std::fs::write(&json_path, r#"{"connections": {"j": {"serviceURL": "http://j"}}}"#).unwrap();
        let config = LayeredConfig::load(Some(json_path.as_path()));
        assert_eq!(config.get_string("connections.j.serviceURL"), "http://j");
    }

    #[test]
    fn unreadable_files_leave_the_file_layer_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let config = LayeredConfig::load(Some(missing.as_path()));
        assert!(config.get("connections").is_none());

        let odd = dir.path().join("hurlsh.ini");
        std::fs::write(&odd, "x=1").unwrap();
        assert!(matches!(
            LayeredConfig::read_file(&odd),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn reload_picks_up_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hurlsh.yml");
        std::fs::write(&path, "connections:\n  a:\n    serviceURL: http://a\n").unwrap();

        let mut config = LayeredConfig::load(Some(path.as_path()));
        assert_eq!(connection_names(&config), vec!["a"]);

        std::fs::write(&path, "connections:\n  b:\n    serviceURL: http://b\n").unwrap();
        config.reload();
        assert_eq!(connection_names(&config), vec!["b"]);
    }

    #[test]
    fn all_settings_merges_layers() {
        let mut config = LayeredConfig::from_yaml_str(YAML).unwrap();
        config.set(DEBUG_KEY, json!(true));
        let settings = config.all_settings();
        assert_eq!(settings["debug"], json!(true));
        assert_eq!(settings["verbose"], json!(true));
        assert_eq!(settings["defaultConnection"], json!("prod"));
    }
}
