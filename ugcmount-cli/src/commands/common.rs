//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use ugcmount::compat::{CompatibilityChecker, EngineVersion};
use ugcmount::config::UgcSettings;
use ugcmount::platform::HostEnvironment;

use crate::error::CliError;

/// Options accepted before or after any subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub engine_version: String,
    pub editor: bool,
}

impl GlobalArgs {
    /// `--config` if given, else `<config dir>/ugcmount/settings.ini`.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join("ugcmount").join("settings.ini")))
    }

    /// Settings from the config file. A missing file yields defaults.
    ///
    /// `--editor` runs always enable the provider inside the editor.
    pub fn settings(&self) -> Result<UgcSettings, CliError> {
        let settings = match self.config_path() {
            Some(path) => UgcSettings::load(&path)?,
            None => UgcSettings::default(),
        };
        Ok(if self.editor {
            settings.with_provider_in_editor(true)
        } else {
            settings
        })
    }

    pub fn engine_version(&self) -> Result<EngineVersion, CliError> {
        self.engine_version.parse().map_err(CliError::EngineVersion)
    }

    pub fn environment(&self) -> Result<HostEnvironment, CliError> {
        let version = self.engine_version()?;
        Ok(if self.editor {
            HostEnvironment::editor(version)
        } else {
            HostEnvironment::runtime(version)
        })
    }

    pub fn checker(&self) -> Result<CompatibilityChecker, CliError> {
        let settings = self.settings()?;
        Ok(CompatibilityChecker::new(self.engine_version()?, settings.compatibility))
    }
}
