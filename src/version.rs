//! Two-slot package versions and the compatibility predicate.
//!
//! There are no patch levels and no upper-bound ranges. Ordering is plain
//! lexicographic on `(major, minor)`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A `(major, minor)` version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    /// Bumped on a breaking interface change.
    pub major: u32,
    /// Bumped on a non-breaking interface change.
    pub minor: u32,
}

impl Version {
    /// The version every package name starts at on its first publish.
    pub const INITIAL: Version = Version { major: 1, minor: 0 };

    /// Construct a version directly from its two slots.
    pub const fn new(major: u32, minor: u32) -> Self {
        Version { major, minor }
    }

    /// `true` iff `self` and `other` share a major version.
    pub fn compatible(self, other: Version) -> bool {
        self.major == other.major
    }

    /// The next major version, reset to `.0`.
    pub fn bump_major(self) -> Version {
        Version::new(self.major + 1, 0)
    }

    /// The next minor version within the same major.
    pub fn bump_minor(self) -> Version {
        Version::new(self.major, self.minor + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Error returned by [`Version::from_str`] / the `FromStr` impl when a
/// string isn't `"<major>.<minor>"` with both slots parsing as `u32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError(pub String);

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version string: {}", self.0)
    }
}

impl std::error::Error for ParseVersionError {}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| ParseVersionError(s.to_string()))?;
        let major = major
            .parse()
            .map_err(|_| ParseVersionError(s.to_string()))?;
        let minor = minor
            .parse()
            .map_err(|_| ParseVersionError(s.to_string()))?;
        Ok(Version::new(major, minor))
    }
}

// Versions are serialized as `"<major>.<minor>"` strings per the documented
// index schema, not as a `{major, minor}` object — matching the rest of the
// corpus, which serializes versions through their `Display`/`FromStr` pair.
impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct VersionVisitor;

impl Visitor<'_> for VersionVisitor {
    type Value = Version;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a version string of the form \"<major>.<minor>\"")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse().map_err(|e: ParseVersionError| E::custom(e.0))
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(VersionVisitor)
    }
}
