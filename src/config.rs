use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for saved progress and logs
    pub state: String,
    /// Optional catalog document; the built-in workflow is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether interactive runs log to a file (false = stderr)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    /// Snapshot lives only as long as the process
    Memory,
    /// Snapshot written as JSON under the state directory
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_backend")]
    pub backend: PersistenceBackend,
    #[serde(default = "default_progress_file")]
    pub file_name: String,
}

fn default_backend() -> PersistenceBackend {
    PersistenceBackend::File
}

fn default_progress_file() -> String {
    "progress.json".to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            file_name: default_progress_file(),
        }
    }
}

/// Where the review summary reads its slots from, and how it is worded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_summary_template")]
    pub template: String,
    #[serde(default = "default_criteria_step")]
    pub criteria_step: String,
    #[serde(default = "default_criteria_field")]
    pub criteria_field: String,
    #[serde(default = "default_record_types_step")]
    pub record_types_step: String,
    #[serde(default = "default_record_types_field")]
    pub record_types_field: String,
    #[serde(default = "default_triggers_step")]
    pub triggers_step: String,
    #[serde(default = "default_triggers_field")]
    pub triggers_field: String,
    #[serde(default = "default_actions_step")]
    pub actions_step: String,
    #[serde(default = "default_actions_field")]
    pub actions_field: String,
}

fn default_summary_template() -> String {
    "When any of the following {{criteria}} types is {{triggers}}, {{actions}}.".to_string()
}

fn default_criteria_step() -> String {
    "step-1".to_string()
}

fn default_criteria_field() -> String {
    "criteria-type".to_string()
}

fn default_record_types_step() -> String {
    "step-2".to_string()
}

fn default_record_types_field() -> String {
    "recordTypes".to_string()
}

fn default_triggers_step() -> String {
    "step-3".to_string()
}

fn default_triggers_field() -> String {
    "triggers".to_string()
}

fn default_actions_step() -> String {
    "step-4".to_string()
}

fn default_actions_field() -> String {
    "actions".to_string()
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            template: default_summary_template(),
            criteria_step: default_criteria_step(),
            criteria_field: default_criteria_field(),
            record_types_step: default_record_types_step(),
            record_types_field: default_record_types_field(),
            triggers_step: default_triggers_step(),
            triggers_field: default_triggers_field(),
            actions_step: default_actions_step(),
            actions_field: default_actions_field(),
        }
    }
}

impl Config {
    /// User config in ~/.config/workflow-wizard/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("workflow-wizard").join("config.toml"))
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the wizard works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with WIZARD_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("WIZARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to the user config location
    pub fn save(&self) -> Result<()> {
        let config_path =
            Self::user_config_path().context("Could not determine user config directory")?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// Get path to the saved progress file
    pub fn progress_path(&self) -> PathBuf {
        self.state_path().join(&self.persistence.file_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                state: ".wizard".to_string(), // Relative to cwd
                catalog: None,
            },
            logging: LoggingConfig::default(),
            persistence: PersistenceConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}
