//! Settings structs and INI parsing.

use std::path::Path;

use ini::{Ini, Properties};

use super::{ConfigError, ConfigResult};

/// Which engine version components must match for a package to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilitySettings {
    /// Master switch. When off every descriptor is compatible.
    pub check_engine_version: bool,
    pub check_major: bool,
    pub check_minor: bool,
    pub check_patch: bool,
    pub check_changelist: bool,
    pub check_branch: bool,
}

impl Default for CompatibilitySettings {
    fn default() -> Self {
        Self {
            check_engine_version: true,
            check_major: true,
            check_minor: true,
            check_patch: false,
            check_changelist: false,
            check_branch: false,
        }
    }
}

impl CompatibilitySettings {
    /// Settings with every check turned off.
    pub fn disabled() -> Self {
        Self {
            check_engine_version: false,
            ..Self::default()
        }
    }

    /// Settings checking only the major version.
    pub fn major_only() -> Self {
        Self {
            check_minor: false,
            ..Self::default()
        }
    }
}

/// Archive storage format and shader sharing of the running build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackagingSettings {
    pub use_io_store: bool,
    pub share_material_shader_code: bool,
}

/// Optional provider features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureSettings {
    pub monetization: bool,
    pub mod_downvote: bool,
}

/// All UGC settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UgcSettings {
    /// Initialise the provider automatically on startup.
    pub auto_initialize_provider: bool,
    /// Allow the provider to run inside the editor.
    pub enable_provider_in_editor: bool,
    /// Let an enabled-state provider filter which mods are active.
    pub enable_mod_enable_disable: bool,
    pub compatibility: CompatibilitySettings,
    pub packaging: PackagingSettings,
    pub features: FeatureSettings,
}

impl UgcSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from an INI file. A missing file yields defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini_str(&text)
    }

    /// Parse settings from INI text.
    pub fn from_ini_str(text: &str) -> ConfigResult<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let mut settings = Self::default();

        read_section(
            &ini,
            "ugc",
            &mut [
                ("auto_initialize_provider", &mut settings.auto_initialize_provider),
                ("enable_provider_in_editor", &mut settings.enable_provider_in_editor),
                ("enable_mod_enable_disable", &mut settings.enable_mod_enable_disable),
            ],
        )?;

        let compat = &mut settings.compatibility;
        read_section(
            &ini,
            "compatibility",
            &mut [
                ("check_engine_version", &mut compat.check_engine_version),
                ("check_major", &mut compat.check_major),
                ("check_minor", &mut compat.check_minor),
                ("check_patch", &mut compat.check_patch),
                ("check_changelist", &mut compat.check_changelist),
                ("check_branch", &mut compat.check_branch),
            ],
        )?;

        let packaging = &mut settings.packaging;
        read_section(
            &ini,
            "packaging",
            &mut [
                ("use_io_store", &mut packaging.use_io_store),
                ("share_material_shader_code", &mut packaging.share_material_shader_code),
            ],
        )?;

        let features = &mut settings.features;
        read_section(
            &ini,
            "features",
            &mut [
                ("monetization", &mut features.monetization),
                ("mod_downvote", &mut features.mod_downvote),
            ],
        )?;

        Ok(settings)
    }

    pub fn with_auto_initialize_provider(mut self, enabled: bool) -> Self {
        self.auto_initialize_provider = enabled;
        self
    }

    pub fn with_provider_in_editor(mut self, enabled: bool) -> Self {
        self.enable_provider_in_editor = enabled;
        self
    }

    pub fn with_mod_enable_disable(mut self, enabled: bool) -> Self {
        self.enable_mod_enable_disable = enabled;
        self
    }

    pub fn with_compatibility(mut self, compatibility: CompatibilitySettings) -> Self {
        self.compatibility = compatibility;
        self
    }

    pub fn with_packaging(mut self, packaging: PackagingSettings) -> Self {
        self.packaging = packaging;
        self
    }

    pub fn with_features(mut self, features: FeatureSettings) -> Self {
        self.features = features;
        self
    }
}

/// Overwrite each field whose key is present in `section_name`.
fn read_section(ini: &Ini, section_name: &str, fields: &mut [(&str, &mut bool)]) -> ConfigResult<()> {
    let Some(section) = ini.section(Some(section_name)) else {
        return Ok(());
    };
    for (key, out) in fields.iter_mut() {
        read_bool(section, section_name, key, &mut **out)?;
    }
    Ok(())
}

fn read_bool(section: &Properties, section_name: &str, key: &str, out: &mut bool) -> ConfigResult<()> {
    let Some(raw) = section.get(key) else {
        return Ok(());
    };
    *out = parse_bool(raw).ok_or_else(|| ConfigError::InvalidValue {
        section: section_name.to_string(),
        key: key.to_string(),
        value: raw.to_string(),
    })?;
    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
