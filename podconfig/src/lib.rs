//! # PodCraft Configuration Module
//!
//! This module provides configuration management for PodCraft, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//! - Thread-safe singleton access pattern
//!
//! Crates that need their own settings (vendors, generation, library) add
//! them through extension traits implemented on [`Config`], using the
//! generic `get_*_or` helpers below.
//!
//! ## Usage
//!
//! ```no_run
//! use podconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! let audio_dir = config.get_managed_dir(&["storage", "audio_dir"], "static/audio")?;
//!
//! config.set_http_port(9000)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{info, warn};

// Modules conditionnels pour l'API REST
#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "api")]
pub mod openapi;

#[cfg(feature = "api")]
pub use openapi::ApiDoc;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("podcraft.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PodCraft configuration"));
}

const ENV_CONFIG_DIR: &str = "PODCRAFT_CONFIG";
const ENV_PREFIX: &str = "PODCRAFT_CONFIG__";
const CONFIG_DIR_NAME: &str = ".podcraft";

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 6000;
const DEFAULT_BASE_URL: &str = "http://localhost";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_MAX_BODY_MB: usize = 20;
const DEFAULT_LOG_BUFFER_CAPACITY: usize = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

/// Macro to generate getter/setter for usize values with default
macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<usize> {
            Ok(self.get_usize_or($path, $default))
        }

        pub fn $setter(&self, size: usize) -> Result<()> {
            let n = Number::from(size);
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            Ok(self.get_bool_or($path, $default))
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Configuration manager for PodCraft
///
/// Holds the merged YAML tree behind a mutex and persists every change to
/// `config.yaml` in the configuration directory.
///
/// # Examples
///
/// ```no_run
/// use podconfig::get_config;
///
/// let config = get_config();
/// println!("HTTP port: {}", config.get_http_port());
/// ```
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

// Implémentation manuelle de Clone
impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.data.lock().unwrap().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Premier répertoire candidat : argument, variable d'environnement,
    /// `.podcraft` local puis `~/.podcraft`
    fn locate_config_dir(directory: &str) -> PathBuf {
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }
        if let Ok(from_env) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %from_env, "Config directory taken from environment");
            return PathBuf::from(from_env);
        }

        let local = PathBuf::from(CONFIG_DIR_NAME);
        if local.is_dir() {
            return local;
        }
        home_dir()
            .map(|home| home.join(CONFIG_DIR_NAME))
            .filter(|candidate| candidate.is_dir())
            .unwrap_or(local)
    }

    /// Creates `dir` when missing and checks that we can write into it
    fn ensure_writable_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        if !dir.is_dir() {
            return Err(anyhow!("Config path {} is not a directory", dir.display()));
        }
        let probe = dir.join(".podcraft-probe");
        fs::write(&probe, b"")?;
        fs::remove_file(&probe)?;
        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// Lookup order: the `directory` argument when not empty, the
    /// `PODCRAFT_CONFIG` environment variable, `.podcraft` in the current
    /// directory, then `.podcraft` in the home directory. The directory is
    /// created when missing.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = Self::locate_config_dir(directory);
        Self::ensure_writable_dir(&dir)?;
        Ok(dir.to_string_lossy().into_owned())
    }

    /// Loads the configuration from the specified directory
    ///
    /// The embedded defaults are overlaid with `config.yaml` when it exists,
    /// then with `PODCRAFT_CONFIG__*` variables. The merged tree is written
    /// back so the file always lists every known key.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let path = Path::new(&config_dir)
            .join("config.yaml")
            .to_string_lossy()
            .into_owned();

        let mut tree: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        match fs::read_to_string(&path) {
            Ok(text) => {
                info!(config_file = %path, "Loaded config file");
                let overlay: Value = serde_yaml::from_str(&text)?;
                merge_yaml(&mut tree, &overlay);
            }
            Err(_) => info!(config_file = %path, "No config file yet, starting from defaults"),
        }

        let mut tree = normalize_keys(tree);
        apply_env_overrides(&mut tree, env::vars());

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(tree),
        };
        config.save()?;
        Ok(config)
    }

    /// Directory holding `config.yaml`; relative managed directories resolve against it
    pub fn get_config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.data.lock().unwrap())?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets the value at `path` (e.g. `&["host", "http_port"]`) and saves
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        insert_at(&mut self.data.lock().unwrap(), path, value)?;
        self.save()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        lookup(&self.data.lock().unwrap(), path).cloned()
    }

    /// Reads a string, falling back to `default` when absent or not a scalar
    pub fn get_string_or(&self, path: &[&str], default: &str) -> String {
        match self.get_value(path) {
            Ok(Value::String(s)) => s,
            Ok(Value::Number(n)) => n.to_string(),
            _ => default.to_string(),
        }
    }

    /// Reads an unsigned integer, accepting numbers and numeric strings
    pub fn get_u64_or(&self, path: &[&str], default: u64) -> u64 {
        match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_u64(),
            Ok(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(default)
    }

    pub fn get_usize_or(&self, path: &[&str], default: usize) -> usize {
        self.get_u64_or(path, default as u64) as usize
    }

    pub fn get_f64_or(&self, path: &[&str], default: f64) -> f64 {
        match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_f64(),
            Ok(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(default)
    }

    pub fn get_bool_or(&self, path: &[&str], default: bool) -> bool {
        match self.get_value(path) {
            Ok(Value::Bool(b)) => Some(b),
            Ok(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(default)
    }

    /// Résout un chemin relatif ou absolu et crée le répertoire si nécessaire
    fn resolve_and_create_dir(&self, dir_path: &str) -> Result<String> {
        let path = Path::new(dir_path);

        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.config_dir).join(path)
        };

        if !absolute_path.exists() {
            fs::create_dir_all(&absolute_path)?;
            info!(directory=%absolute_path.display(), "Created managed directory");
        }

        Ok(absolute_path.to_string_lossy().to_string())
    }

    /// Récupère un répertoire géré par la configuration
    ///
    /// Le répertoire peut être absolu ou relatif au répertoire de
    /// configuration. Il est créé s'il n'existe pas, et la valeur par défaut
    /// est persistée si la clé est absente.
    ///
    /// # Exemple
    ///
    /// ```no_run
    /// use podconfig::get_config;
    ///
    /// let config = get_config();
    /// let covers = config.get_managed_dir(&["storage", "covers_dir"], "static/covers")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<String> {
        let dir_path = match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => {
                self.set_managed_dir(path, default.to_string())?;
                default.to_string()
            }
        };
        self.resolve_and_create_dir(&dir_path)
    }

    /// Définit un répertoire géré par la configuration
    pub fn set_managed_dir(&self, path: &[&str], directory: String) -> Result<()> {
        self.set_value(path, Value::String(directory))
    }

    /// Gets the base URL for the HTTP server
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["host", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => {
                warn!("Base URL not configured, using {}", DEFAULT_BASE_URL);
                DEFAULT_BASE_URL.to_string()
            }
        }
    }

    /// Port HTTP (`host.http_port`), 6000 si absent ou invalide
    pub fn get_http_port(&self) -> u16 {
        let configured = self.get_u64_or(&["host", "http_port"], DEFAULT_HTTP_PORT as u64);
        u16::try_from(configured).unwrap_or_else(|_| {
            warn!(
                "HTTP port {} out of range, using default {}",
                configured, DEFAULT_HTTP_PORT
            );
            DEFAULT_HTTP_PORT
        })
    }

    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    /// Origin allowed to call the API from a browser
    pub fn get_cors_origin(&self) -> String {
        self.get_string_or(&["host", "cors_origin"], DEFAULT_CORS_ORIGIN)
    }

    impl_usize_config!(
        get_max_body_mb,
        set_max_body_mb,
        &["host", "max_body_mb"],
        DEFAULT_MAX_BODY_MB
    );

    impl_usize_config!(
        get_log_cache_size,
        set_log_cache_size,
        &["host", "logger", "buffer_capacity"],
        DEFAULT_LOG_BUFFER_CAPACITY
    );

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> Result<String> {
        Ok(self.get_string_or(&["host", "logger", "min_level"], DEFAULT_LOG_MIN_LEVEL))
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Returns the global configuration instance
///
/// The configuration is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default ones.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn yaml_key(key: &str) -> Value {
    Value::String(key.to_lowercase())
}

/// Walks `path` from `root`
fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut node = root;
    for (depth, key) in path.iter().enumerate() {
        let map = node
            .as_mapping()
            .ok_or_else(|| anyhow!("Path {} is not a mapping", path[..depth].join(".")))?;
        node = map
            .get(yaml_key(key))
            .ok_or_else(|| anyhow!("Path {} does not exist", path[..=depth].join(".")))?;
    }
    Ok(node)
}

/// Stores `value` at `path`, creating intermediate mappings
fn insert_at(root: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for key in parents {
        node = node
            .as_mapping_mut()
            .ok_or_else(|| anyhow!("Cannot set {}: {} is not a mapping", path.join("."), key))?
            .entry(yaml_key(key))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }
    node.as_mapping_mut()
        .ok_or_else(|| anyhow!("Cannot set {}: parent is not a mapping", path.join(".")))?
        .insert(yaml_key(last), value);
    Ok(())
}

/// Lowercases every mapping key, recursively
fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (key, normalize_keys(value))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Parses an environment value as YAML so `42` or `true` keep their type
fn env_value(raw: &str) -> Value {
    serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Applies `PODCRAFT_CONFIG__SECTION__KEY=value` overrides
fn apply_env_overrides(tree: &mut Value, vars: impl Iterator<Item = (String, String)>) {
    for (name, raw) in vars {
        let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = rest.split("__").collect();
        if let Err(e) = insert_at(tree, &path, env_value(&raw)) {
            warn!("Ignoring {}: {}", name, e);
        }
    }
}
