use config::{Config, ConfigError};
use serde::Deserialize;
use std::env;

use crate::orchestrator::models::MissingTagPolicy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub purge: PurgeSettings,
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AwsSettings {
    /// AWS region (e.g., "us-west-2")
    #[serde(default = "default_region")]
    pub region: String,
    /// Optional: AWS access key ID (if not using the default credential chain)
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Optional: AWS secret access key (if not using the default credential chain)
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PurgeSettings {
    /// Report what would be deleted without deleting anything
    #[serde(default)]
    pub dry_run: bool,
    /// Only clean repositories whose name starts with this prefix
    #[serde(default)]
    pub repository_prefix: Option<String>,
    /// Number of repositories processed at the same time (default: 1)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for PurgeSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            repository_prefix: None,
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OrchestratorSettings {
    /// Handling of running containers whose image reference has no tag
    #[serde(default)]
    pub missing_tag_policy: MissingTagPolicy,
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_concurrency() -> usize {
    1
}

impl Settings {
    /// Substitute environment variables in a string value
    /// Replaces ${VAR_NAME} or ${VAR_NAME:-default} with environment variable values
    fn substitute_env_vars_in_string(s: &str) -> String {
        let re = regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("valid regex");

        re.replace_all(s, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match env::var(var_name) {
                Ok(val) => val,
                Err(_) => default_value.unwrap_or("").to_string(),
            }
        })
        .to_string()
    }

    /// Convert a config::Value to a serde_json::Value, performing environment variable substitution
    fn config_value_to_json(value: &config::Value) -> serde_json::Value {
        use config::ValueKind;

        match &value.kind {
            ValueKind::Nil => serde_json::Value::Null,
            ValueKind::Boolean(b) => serde_json::Value::Bool(*b),
            ValueKind::I64(i) => serde_json::Value::Number((*i).into()),
            ValueKind::I128(i) => serde_json::Value::Number((*i as i64).into()),
            ValueKind::U64(u) => serde_json::Value::Number((*u).into()),
            ValueKind::U128(u) => serde_json::Value::Number((*u as u64).into()),
            ValueKind::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueKind::String(s) => {
                serde_json::Value::String(Self::substitute_env_vars_in_string(s))
            }
            ValueKind::Table(table) => {
                let mut map = serde_json::Map::new();
                for (k, v) in table.iter() {
                    map.insert(k.clone(), Self::config_value_to_json(v));
                }
                serde_json::Value::Object(map)
            }
            ValueKind::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(Self::config_value_to_json).collect())
            }
        }
    }

    /// Try to add a config file with multiple extension attempts (.toml, .yaml, .yml)
    /// Returns true if a file was found
    fn try_add_config_file(
        builder: &mut config::ConfigBuilder<config::builder::DefaultState>,
        config_dir: &str,
        name: &str,
    ) -> bool {
        for ext in ["toml", "yaml", "yml"] {
            let path = format!("{}/{}.{}", config_dir, name, ext);
            if std::path::Path::new(&path).exists() {
                tracing::info!("Loading config file: {}", path);
                *builder = builder
                    .clone()
                    .add_source(config::File::with_name(&format!("{}/{}", config_dir, name)));
                return true;
            }
        }

        tracing::debug!(
            "Optional config file not found: {}/{}.{{toml,yaml,yml}}",
            config_dir,
            name
        );
        false
    }

    /// Load settings from `config_dir` (or `ECR_CLEANER_CONFIG_DIR`, default "config")
    ///
    /// Files are layered default → run mode → local; all of them are optional,
    /// so a missing directory yields the built-in defaults.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let run_mode =
            env::var("ECR_CLEANER_CONFIG_RUN_MODE").unwrap_or_else(|_| "production".into());
        let config_dir = config_dir
            .map(String::from)
            .or_else(|| env::var("ECR_CLEANER_CONFIG_DIR").ok())
            .unwrap_or_else(|| "config".into());

        let mut builder = Config::builder();
        Self::try_add_config_file(&mut builder, &config_dir, "default");
        Self::try_add_config_file(&mut builder, &config_dir, &run_mode);
        Self::try_add_config_file(&mut builder, &config_dir, "local");

        let config = builder.build()?;
        let root_value = config
            .cache
            .into_table()
            .map_err(|e| ConfigError::Message(format!("Failed to get config table: {}", e)))?;

        let mut json_map = serde_json::Map::new();
        for (k, v) in root_value.iter() {
            json_map.insert(k.clone(), Self::config_value_to_json(v));
        }
        let json_value = serde_json::Value::Object(json_map);

        let mut unused_fields = Vec::new();
        let settings: Settings = serde_ignored::deserialize(json_value, |path| {
            unused_fields.push(path.to_string());
        })
        .map_err(|e| ConfigError::Message(format!("Failed to deserialize settings: {}", e)))?;

        for field in &unused_fields {
            tracing::warn!("Unknown configuration field: {}", field);
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aws.region.trim().is_empty() {
            return Err(ConfigError::Message(
                "AWS region not configured. Set [aws] region in config or pass --region".to_string(),
            ));
        }
        if self.purge.concurrency == 0 {
            return Err(ConfigError::Message(
                "purge.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
