//! Package version numbers.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// PEP 440 public version plus local label; only the release segment is kept.
const PATTERN: &str = r"
    v?
    (?:
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?P<pre>
            [-_.]?
            (?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?P<post>
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:
                [-_.]?
                (?P<post_l>post|rev|r)
                [-_.]?
                (?P<post_n2>[0-9]+)?
            )
        )?
        (?P<dev>
            [-_.]?
            (?P<dev_l>dev)
            [-_.]?
            (?P<dev_n>[0-9]+)?
        )?
    )
    (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
";

static FULL: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(&format!(r"(?ix)^\s*{PATTERN}\s*$")));

static PREFIX: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(&format!(r"(?ix)^\s*{PATTERN}")));

/// The `major.minor.micro` version of a package.
///
/// # Examples
///
/// ```rust
/// use nanoutils::utils::VersionInfo;
///
/// let version: VersionInfo = "0.8.2".parse()?;
/// assert_eq!(version, VersionInfo::new(0, 8, 2));
/// assert_eq!(version.patch(), 2);
///
/// assert_eq!(VersionInfo::parse("1.2rc1 (build 5)", false)?, VersionInfo::new(1, 2, 0));
/// assert!(VersionInfo::parse("1.2rc1 (build 5)", true).is_err());
/// # Ok::<(), nanoutils::Error>(())
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VersionInfo {
    /// Major version
    pub major: u64,
    /// Minor version
    pub minor: u64,
    /// Micro version
    pub micro: u64,
}

impl VersionInfo {
    /// Creates a version from its three components.
    pub const fn new(major: u64, minor: u64, micro: u64) -> Self {
        VersionInfo {
            major,
            minor,
            micro,
        }
    }

    /// Parses a PEP 440 version string.
    ///
    /// The release segment is truncated to three numbers and padded with zeros. Pre-, post-,
    /// dev-release and local parts are accepted and dropped. With `fullmatch` the whole string
    /// (apart from surrounding whitespace) must be a version; otherwise trailing text after a
    /// leading version is ignored.
    ///
    /// # Errors
    /// Returns [`Error::Value`] when no version is found or a component overflows.
    pub fn parse(version: &str, fullmatch: bool) -> Result<Self> {
        let pattern = if fullmatch { &*FULL } else { &*PREFIX };
        let pattern = pattern
            .as_ref()
            .map_err(|error| Error::Error(error.to_string()))?;
        let invalid = || Error::Value(format!("failed to parse {version:?}"));

        let release = pattern
            .captures(version)
            .and_then(|captures| captures.name("release"))
            .ok_or_else(invalid)?;

        let mut parts = [0_u64; 3];
        for (part, text) in parts.iter_mut().zip(release.as_str().split('.')) {
            *part = text.parse().map_err(|_| invalid())?;
        }
        let [major, minor, micro] = parts;
        Ok(VersionInfo::new(major, minor, micro))
    }

    /// Alias of `micro`.
    pub fn patch(&self) -> u64 {
        self.micro
    }

    /// Alias of `micro`.
    pub fn maintenance(&self) -> u64 {
        self.micro
    }

    /// Alias of `micro`.
    pub fn bug(&self) -> u64 {
        self.micro
    }
}

impl FromStr for VersionInfo {
    type Err = Error;

    fn from_str(version: &str) -> Result<Self> {
        VersionInfo::parse(version, true)
    }
}

impl From<(u64, u64, u64)> for VersionInfo {
    fn from((major, minor, micro): (u64, u64, u64)) -> Self {
        VersionInfo::new(major, minor, micro)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}
