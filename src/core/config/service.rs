use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use crate::core::errors::ApiError;

/// A parsed configuration plus the problems found while reading it. Config is
/// read before logging exists, so the caller reports `warnings` once the
/// subscriber is installed.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("NHTC_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Raw merged document: secrets layered over the public config.
    pub fn load_raw(&self, warnings: &mut Vec<String>) -> Value {
        let public_config = load_yaml_file(&self.config_path(), warnings);
        let secrets_config = load_yaml_file(&self.secrets_path(), warnings);
        deep_merge(&public_config, &secrets_config)
    }

    pub fn load_config(&self) -> Result<LoadedConfig, ApiError> {
        let mut warnings = Vec::new();
        let merged = self.load_raw(&mut warnings);
        let mut config: AppConfig = serde_json::from_value(merged)
            .map_err(|e| ApiError::BadRequest(format!("invalid configuration: {e}")))?;
        apply_env_overrides(&mut config, &mut warnings);
        Ok(LoadedConfig { config, warnings })
    }
}

fn apply_env_overrides(config: &mut AppConfig, warnings: &mut Vec<String>) {
    if let Ok(value) = env::var("NHTC_ADMIN_PASSWORD") {
        config.admin.password = value;
    }
    if let Ok(value) = env::var("NHTC_ADMIN_TOKEN") {
        config.admin.token = value;
    }
    if let Ok(value) = env::var("NHTC_LLM_API_KEY") {
        config.llm.api_key = value;
    }
    if let Ok(value) = env::var("PORT") {
        match value.parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(_) => warnings.push(format!("Ignoring non-numeric PORT override: {}", value)),
        }
    }
}

fn load_yaml_file(path: &Path, warnings: &mut Vec<String>) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                Value::Object(Map::new())
            }
        },
        Err(err) => {
            warnings.push(format!("Failed to read {}: {}", path.display(), err));
            Value::Object(Map::new())
        }
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}
