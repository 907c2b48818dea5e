//! UGC settings.
//!
//! Settings are read from an INI file with four sections:
//!
//! ```ini
//! [ugc]
//! auto_initialize_provider = false
//! enable_provider_in_editor = false
//! enable_mod_enable_disable = false
//!
//! [compatibility]
//! check_engine_version = true
//! check_major = true
//! check_minor = true
//! check_patch = false
//! check_changelist = false
//! check_branch = false
//!
//! [packaging]
//! use_io_store = false
//! share_material_shader_code = false
//!
//! [features]
//! monetization = false
//! mod_downvote = false
//! ```
//!
//! A missing file yields the defaults shown above. Unknown keys are ignored.

mod settings;

pub use settings::{CompatibilitySettings, FeatureSettings, PackagingSettings, UgcSettings};

use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    ParseFailed(String),

    #[error("Invalid value '{value}' for [{section}] {key}: expected a boolean")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}
