//! Package identifiers.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a package by its provider.
///
/// Side-loaded content has no identifier. The raw value `-1` is reserved
/// as the "unset" sentinel and is exposed as [`PackageId::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(i64);

impl PackageId {
    /// The "no identifier" sentinel.
    pub const NONE: PackageId = PackageId(-1);

    /// Wraps a raw identifier value.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns `true` unless this is the [`NONE`](Self::NONE) sentinel.
    pub const fn is_set(self) -> bool {
        self.0 != Self::NONE.0
    }

    /// Converts the sentinel to `None`.
    pub fn into_option(self) -> Option<PackageId> {
        self.is_set().then_some(self)
    }
}

impl Default for PackageId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<i64> for PackageId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("none")
        }
    }
}

impl FromStr for PackageId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}
