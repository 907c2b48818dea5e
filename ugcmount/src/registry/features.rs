//! Optional registry features.

use std::fmt;

use crate::config::UgcSettings;

/// Features a host can switch on in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UgcFeature {
    /// Per-mod enable/disable through an enabled-state provider.
    ModEnableDisable,
    Monetization,
    ModDownvote,
}

impl UgcFeature {
    pub const ALL: [UgcFeature; 3] = [
        UgcFeature::ModEnableDisable,
        UgcFeature::Monetization,
        UgcFeature::ModDownvote,
    ];

    /// Whether `settings` turn this feature on.
    pub fn is_enabled_in(self, settings: &UgcSettings) -> bool {
        match self {
            UgcFeature::ModEnableDisable => settings.enable_mod_enable_disable,
            UgcFeature::Monetization => settings.features.monetization,
            UgcFeature::ModDownvote => settings.features.mod_downvote,
        }
    }
}

impl fmt::Display for UgcFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UgcFeature::ModEnableDisable => "mod enable/disable",
            UgcFeature::Monetization => "monetization",
            UgcFeature::ModDownvote => "mod downvote",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureSettings;

    #[test]
    fn test_defaults_disable_everything() {
        let settings = UgcSettings::default();
        for feature in UgcFeature::ALL {
            assert!(!feature.is_enabled_in(&settings), "{feature} should default off");
        }
    }

    #[test]
    fn test_each_flag_maps_to_its_feature() {
        let settings = UgcSettings::default()
            .with_mod_enable_disable(true)
            .with_features(FeatureSettings {
                monetization: false,
                mod_downvote: true,
            });

        assert!(UgcFeature::ModEnableDisable.is_enabled_in(&settings));
        assert!(!UgcFeature::Monetization.is_enabled_in(&settings));
        assert!(UgcFeature::ModDownvote.is_enabled_in(&settings));
    }
}
