//! Descriptor compatibility checking.

use std::path::Path;

use tracing::{debug, warn};

use super::{CompatError, CompatResult, EngineVersion, VersionComponent};
use crate::config::CompatibilitySettings;

/// Checks descriptors against the running engine version.
#[derive(Debug, Clone)]
pub struct CompatibilityChecker {
    current: EngineVersion,
    settings: CompatibilitySettings,
}

impl CompatibilityChecker {
    pub fn new(current: EngineVersion, settings: CompatibilitySettings) -> Self {
        Self { current, settings }
    }

    pub fn current_version(&self) -> &EngineVersion {
        &self.current
    }

    pub fn settings(&self) -> &CompatibilitySettings {
        &self.settings
    }

    /// Returns `true` if the descriptor at `path` may be loaded.
    ///
    /// Rejections are logged with their reason.
    pub fn is_compatible(&self, path: &Path) -> bool {
        match self.check_descriptor_file(path) {
            Ok(()) => true,
            Err(e) => {
                warn!(descriptor = %path.display(), reason = %e, "Skipping incompatible UGC");
                false
            }
        }
    }

    /// Check the descriptor file at `path`.
    ///
    /// With checking disabled this succeeds without reading the file.
    pub fn check_descriptor_file(&self, path: &Path) -> CompatResult<()> {
        if !self.settings.check_engine_version {
            return Ok(());
        }

        let text = std::fs::read_to_string(path).map_err(|source| CompatError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| CompatError::ParseFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let declared = json
            .get("EngineVersion")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CompatError::MissingEngineVersion(path.to_path_buf()))?;

        let declared: EngineVersion = declared.parse()?;
        self.check_version(&declared)
    }

    /// Compare `declared` with the running version on every enabled component.
    pub fn check_version(&self, declared: &EngineVersion) -> CompatResult<()> {
        if !self.settings.check_engine_version {
            return Ok(());
        }

        for component in VersionComponent::ALL {
            if !self.checks(component) {
                continue;
            }
            let current = self.current.to_string_upto(component);
            let wanted = declared.to_string_upto(component);
            if current != wanted {
                debug!(%component, current = %current, declared = %wanted, "Engine version mismatch");
                return Err(CompatError::Mismatch {
                    component,
                    current,
                    declared: wanted,
                });
            }
        }

        Ok(())
    }

    fn checks(&self, component: VersionComponent) -> bool {
        match component {
            VersionComponent::Major => self.settings.check_major,
            VersionComponent::Minor => self.settings.check_minor,
            VersionComponent::Patch => self.settings.check_patch,
            VersionComponent::Changelist => self.settings.check_changelist,
            VersionComponent::Branch => self.settings.check_branch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_descriptor(dir: &TempDir, engine_version: Option<&str>) -> std::path::PathBuf {
        let path = dir.path().join("Red.uplugin");
        let json = match engine_version {
            Some(v) => format!(r#"{{"FriendlyName":"Red","EngineVersion":"{v}"}}"#),
            None => r#"{"FriendlyName":"Red"}"#.to_string(),
        };
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_minor_mismatch_rejected_with_default_settings() {
        let temp = TempDir::new().unwrap();
        let path = write_descriptor(&temp, Some("5.2.0"));
        let checker =
            CompatibilityChecker::new(EngineVersion::new(5, 3, 0), CompatibilitySettings::default());

        let err = checker.check_descriptor_file(&path).unwrap_err();
        assert!(matches!(
            err,
            CompatError::Mismatch {
                component: VersionComponent::Minor,
                ..
            }
        ));
        assert!(!checker.is_compatible(&path));
    }

    #[test]
    fn test_minor_mismatch_accepted_when_checking_major_only() {
        let temp = TempDir::new().unwrap();
        let path = write_descriptor(&temp, Some("5.2.0"));
        let checker = CompatibilityChecker::new(
            EngineVersion::new(5, 3, 0),
            CompatibilitySettings::major_only(),
        );

        assert!(checker.is_compatible(&path));
    }

    #[test]
    fn test_patch_ignored_by_default() {
        let checker =
            CompatibilityChecker::new(EngineVersion::new(5, 3, 2), CompatibilitySettings::default());
        assert!(checker.check_version(&EngineVersion::new(5, 3, 0)).is_ok());
        assert!(checker.check_version(&EngineVersion::new(4, 3, 2)).is_err());
    }

    #[test]
    fn test_missing_engine_version_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_descriptor(&temp, None);
        let checker =
            CompatibilityChecker::new(EngineVersion::new(5, 3, 0), CompatibilitySettings::default());

        assert!(matches!(
            checker.check_descriptor_file(&path),
            Err(CompatError::MissingEngineVersion(_))
        ));
    }

    #[test]
    fn test_disabled_check_accepts_unreadable_descriptor() {
        let temp = TempDir::new().unwrap();
        let checker =
            CompatibilityChecker::new(EngineVersion::new(5, 3, 0), CompatibilitySettings::disabled());

        assert!(checker.is_compatible(&temp.path().join("missing.uplugin")));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Bad.uplugin");
        std::fs::write(&path, "{ not json").unwrap();
        let checker =
            CompatibilityChecker::new(EngineVersion::new(5, 3, 0), CompatibilitySettings::default());

        assert!(matches!(
            checker.check_descriptor_file(&path),
            Err(CompatError::ParseFailed { .. })
        ));
    }
}
