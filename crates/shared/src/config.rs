//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Approval workflow configuration.
    #[serde(default)]
    pub approval: ApprovalConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalConfig {
    /// Path of the approval rules file (TOML, JSON or YAML).
    #[serde(default)]
    pub rules_file: Option<String>,
    /// Skip the manager step when the submitter has no manager on record.
    ///
    /// When false, planning a manager-first rule without a manager fails.
    #[serde(default = "default_skip_missing_manager")]
    pub skip_missing_manager: bool,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            rules_file: None,
            skip_missing_manager: default_skip_missing_manager(),
        }
    }
}

fn default_skip_missing_manager() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "claimflow=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// The embedding service calls this at startup, then passes `logging` to
    /// `telemetry::init_tracing` and `approval` to `RuleBook::from_config` and
    /// `PlanningOptions::from`.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// then `CLAIMFLOW__*` environment variables (a `.env` file is read first).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CLAIMFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
