use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::Serialize;

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,
    #[error("Invalid version format: '{0}'")]
    InvalidFormat(String),
    #[error("Version parse error: {0}")]
    ParseError(String),
}

/// The host runtime version a component was built against.
///
/// Components are compatible with the host when the major parts match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RuntimeVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl RuntimeVersion {
    /// Creates a new runtime version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Checks if a component built against `other` can run on this runtime
    pub fn is_compatible_with(&self, other: &RuntimeVersion) -> bool {
        self.major == other.major
    }
}

impl From<&Version> for RuntimeVersion {
    fn from(version: &Version) -> Self {
        Self::new(version.major, version.minor, version.patch)
    }
}

impl FromStr for RuntimeVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s).map(|v| RuntimeVersion::from(&v))
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parses a component version.
///
/// Full semver strings are accepted as-is. Shorter numeric forms such as
/// `"1"` or `"1.2"` are padded with zeros, so `"1.2"` becomes `1.2.0`.
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VersionError::Empty);
    }

    if let Ok(version) = Version::parse(trimmed) {
        return Ok(version);
    }

    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.len() > 3 {
        return Err(VersionError::InvalidFormat(trimmed.to_string()));
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part
            .parse::<u64>()
            .map_err(|e| VersionError::ParseError(format!("'{}' in '{}': {}", part, trimmed, e)))?;
    }

    Ok(Version::new(numbers[0], numbers[1], numbers[2]))
}

/// Parses the minimum version of a declared dependency. An empty string
/// means any version satisfies the dependency.
pub fn parse_minimum_version(input: &str) -> Result<Version, VersionError> {
    if input.trim().is_empty() {
        return Ok(Version::new(0, 0, 0));
    }
    parse_version(input)
}
