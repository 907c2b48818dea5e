//! Structured engine versions.
//!
//! Engine versions are written `major.minor.patch-changelist+branch`, e.g.
//! `5.3.2-29314046+++UE5+Release-5.3`. Only `major.minor` is mandatory.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use super::CompatError;

/// Components of an [`EngineVersion`], from most to least significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VersionComponent {
    Major,
    Minor,
    Patch,
    Changelist,
    Branch,
}

impl VersionComponent {
    pub const ALL: [VersionComponent; 5] = [
        VersionComponent::Major,
        VersionComponent::Minor,
        VersionComponent::Patch,
        VersionComponent::Changelist,
        VersionComponent::Branch,
    ];
}

impl fmt::Display for VersionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionComponent::Major => "major",
            VersionComponent::Minor => "minor",
            VersionComponent::Patch => "patch",
            VersionComponent::Changelist => "changelist",
            VersionComponent::Branch => "branch",
        };
        f.write_str(name)
    }
}

/// A parsed engine version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EngineVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub changelist: u32,
    pub branch: String,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?(?:-(\d+))?(?:\+(.*))?$")
            .unwrap_or_else(|e| unreachable!("version pattern is valid: {e}"))
    })
}

impl EngineVersion {
    pub fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
            ..Self::default()
        }
    }

    pub fn with_changelist(mut self, changelist: u32) -> Self {
        self.changelist = changelist;
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Render the version up to and including `component`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ugcmount::compat::{EngineVersion, VersionComponent};
    ///
    /// let version: EngineVersion = "5.3.2-1234+Release".parse().unwrap();
    /// assert_eq!(version.to_string_upto(VersionComponent::Major), "5");
    /// assert_eq!(version.to_string_upto(VersionComponent::Minor), "5.3");
    /// assert_eq!(version.to_string_upto(VersionComponent::Changelist), "5.3.2-1234");
    /// ```
    pub fn to_string_upto(&self, component: VersionComponent) -> String {
        match component {
            VersionComponent::Major => format!("{}", self.major),
            VersionComponent::Minor => format!("{}.{}", self.major, self.minor),
            VersionComponent::Patch => format!("{}.{}.{}", self.major, self.minor, self.patch),
            VersionComponent::Changelist => format!(
                "{}.{}.{}-{}",
                self.major, self.minor, self.patch, self.changelist
            ),
            VersionComponent::Branch => format!(
                "{}.{}.{}-{}+{}",
                self.major, self.minor, self.patch, self.changelist, self.branch
            ),
        }
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.changelist != 0 {
            write!(f, "-{}", self.changelist)?;
        }
        if !self.branch.is_empty() {
            write!(f, "+{}", self.branch)?;
        }
        Ok(())
    }
}

impl FromStr for EngineVersion {
    type Err = CompatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CompatError::InvalidVersion(s.to_string());
        let caps = version_pattern().captures(s.trim()).ok_or_else(invalid)?;

        let number = |index: usize| -> Result<Option<u32>, CompatError> {
            caps.get(index)
                .map(|m| m.as_str().parse::<u32>().map_err(|_| invalid()))
                .transpose()
        };
        let component = |value: Option<u32>| -> Result<u16, CompatError> {
            u16::try_from(value.unwrap_or(0)).map_err(|_| invalid())
        };

        Ok(Self {
            major: component(number(1)?)?,
            minor: component(number(2)?)?,
            patch: component(number(3)?)?,
            changelist: number(4)?.unwrap_or(0),
            branch: caps
                .get(5)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }
}
