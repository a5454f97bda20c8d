//! Layered settings.
//!
//! Precedence, lowest first: built-in defaults, `pch-token.toml` (or the
//! file named by `--config`), `PCH_TOKEN__*` environment variables,
//! command-line flags.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use clinic_token_engine::domain::{CONSULTATION_FEE, CURRENCY};

use crate::cli::Cli;
use crate::error::LedgerError;

pub const DEFAULT_CONFIG_FILE: &str = "pch-token.toml";
pub const ENV_PREFIX: &str = "PCH_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    pub clinic: ClinicSettings,
    pub storage: StorageSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

/// Fixed business details shown to the receptionist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClinicSettings {
    pub name: String,
    pub title: String,
    pub contact: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    pub data_file: PathBuf,
    pub export_file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistorySettings {
    /// Default "last N days" filter for `history`. Unset shows every record.
    #[serde(default)]
    pub window_days: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clinic: ClinicSettings {
                name: "PCH".to_string(),
                title: "PCH Token System".to_string(),
                contact: "03345389032".to_string(),
                address: "City Karachi".to_string(),
            },
            storage: StorageSettings {
                data_file: PathBuf::from("patient_records.csv"),
                export_file_name: "patient_records.csv".to_string(),
            },
            history: HistorySettings::default(),
        }
    }
}

impl Settings {
    /// Defaults, then the config file (optional), then the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, LedgerError> {
        let defaults = Settings::default();
        let file = match config_path {
            Some(path) => File::from(path.to_path_buf()).required(false),
            None => File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false),
        };

        let s = Config::builder()
            .set_default("clinic.name", defaults.clinic.name)?
            .set_default("clinic.title", defaults.clinic.title)?
            .set_default("clinic.contact", defaults.clinic.contact)?
            .set_default("clinic.address", defaults.clinic.address)?
            .set_default(
                "storage.data_file",
                defaults.storage.data_file.to_string_lossy().into_owned(),
            )?
            .set_default("storage.export_file_name", defaults.storage.export_file_name)?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    /// Load and apply command-line overrides (CLI > env > file > defaults).
    pub fn new_with_cli(cli: &Cli) -> Result<Self, LedgerError> {
        let mut settings = Self::load(Some(cli.config.as_path()))?;
        settings.apply_cli_overrides(cli);
        Ok(settings)
    }

    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(path) = &cli.data_file {
            self.storage.data_file = path.clone();
        }
    }

    /// "Contact: 03345389032 | Address: City Karachi | Consultation Fee: Rs. 500"
    pub fn contact_line(&self) -> String {
        format!(
            "Contact: {} | Address: {} | Consultation Fee: {} {}",
            self.clinic.contact, self.clinic.address, CURRENCY, CONSULTATION_FEE
        )
    }
}
