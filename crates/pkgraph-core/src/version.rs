//! Semantic version parsing, precedence, and range arithmetic.
//!
//! Versions follow `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`:
//! - the numeric core is compared numerically; leading zeros are accepted
//!   on input and dropped on output
//! - a release sorts above any of its prereleases
//! - prerelease identifiers compare left to right, numeric below alphanumeric
//! - build metadata is carried verbatim but never affects ordering, equality
//!   or hashing

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while parsing versions and version ranges.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version string '{0}'")]
    #[diagnostic(
        code(pkgraph::version::invalid),
        help("versions have the form MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]")
    )]
    InvalidVersionString(String),

    #[error("invalid version range '{0}'")]
    #[diagnostic(
        code(pkgraph::version::invalid_range),
        help("use `1.0.0..<2.0.0`, `^1.0.0`, or an exact version such as `1.2.3`")
    )]
    InvalidRange(String),
}

/// One dot-separated prerelease identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(u64),
    AlphaNumeric(String),
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::AlphaNumeric(a), Identifier::AlphaNumeric(b)) => a.cmp(b),
            (Identifier::Numeric(_), Identifier::AlphaNumeric(_)) => Ordering::Less,
            (Identifier::AlphaNumeric(_), Identifier::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::AlphaNumeric(s) => f.write_str(s),
        }
    }
}

/// A parsed semantic version.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Vec<Identifier>,
    pub build: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: Vec::new(),
            build: None,
        }
    }

    /// Attach prerelease identifiers, classifying each as numeric or not.
    pub fn with_prerelease<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.prerelease = identifiers
            .into_iter()
            .map(|s| classify(s.as_ref()))
            .collect();
        self
    }

    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// The first release of the next major series (`1.4.2` → `2.0.0`).
    /// `None` when the major number is already `u64::MAX`.
    pub fn next_major(&self) -> Option<Self> {
        self.major.checked_add(1).map(|major| Self::new(major, 0, 0))
    }

    /// Parse `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidVersionString(text.to_string());

        let (rest, build) = match text.split_once('+') {
            Some((rest, build)) => {
                if !is_identifier_list(build) {
                    return Err(invalid());
                }
                (rest, Some(build.to_string()))
            }
            None => (text, None),
        };

        let (core, prerelease) = match rest.split_once('-') {
            Some((core, pre)) => {
                if !is_identifier_list(pre) {
                    return Err(invalid());
                }
                (core, pre.split('.').map(classify).collect())
            }
            None => (rest, Vec::new()),
        };

        let parts: Vec<&str> = core.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(invalid());
        };

        Ok(Self {
            major: parse_numeric(major).ok_or_else(invalid)?,
            minor: parse_numeric(minor).ok_or_else(invalid)?,
            patch: parse_numeric(patch).ok_or_else(invalid)?,
            prerelease,
            build,
        })
    }
}

fn parse_numeric(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn is_identifier_list(text: &str) -> bool {
    text.split('.').all(|id| {
        !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

fn classify(identifier: &str) -> Identifier {
    if identifier.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = identifier.parse() {
            return Identifier::Numeric(n);
        }
    }
    Identifier::AlphaNumeric(identifier.to_string())
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.prerelease.is_empty() {
            let ids: Vec<String> = self.prerelease.iter().map(|id| id.to_string()).collect();
            write!(f, "-{}", ids.join("."))?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| {
                match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    // Lexicographic Vec ordering: element-wise, shorter prefix first.
                    (false, false) => self.prerelease.cmp(&other.prerelease),
                }
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.prerelease.hash(state);
    }
}

/// A set of acceptable versions: a half-open interval or an exact pin.
///
/// An interval whose lower bound is not below its upper bound is empty and
/// matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionRange {
    /// `lower <= v < upper`
    Between { lower: Version, upper: Version },
    /// `v == pin`
    Exact(Version),
}

impl VersionRange {
    pub fn between(lower: Version, upper: Version) -> Self {
        Self::Between { lower, upper }
    }

    pub fn exact(version: Version) -> Self {
        Self::Exact(version)
    }

    /// `version..<next major`, or `None` if there is no next major.
    pub fn up_to_next_major(version: Version) -> Option<Self> {
        let upper = version.next_major()?;
        Some(Self::Between {
            lower: version,
            upper,
        })
    }

    /// An unsatisfiable range anchored at `at`.
    fn empty_at(at: Version) -> Self {
        Self::Between {
            lower: at.clone(),
            upper: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Between { lower, upper } => lower >= upper,
            Self::Exact(_) => false,
        }
    }

    /// Whether `version` satisfies this range.
    pub fn contains(&self, version: &Version) -> bool {
        match self {
            Self::Between { lower, upper } => lower <= version && version < upper,
            Self::Exact(pin) => pin == version,
        }
    }

    /// The versions accepted by both ranges (possibly empty).
    pub fn intersect(&self, other: &VersionRange) -> VersionRange {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => {
                if a == b {
                    Self::Exact(a.clone())
                } else {
                    Self::empty_at(a.clone())
                }
            }
            (Self::Exact(pin), Self::Between { .. }) => other.restrict_to(pin),
            (Self::Between { .. }, Self::Exact(pin)) => self.restrict_to(pin),
            (
                Self::Between {
                    lower: l1,
                    upper: u1,
                },
                Self::Between {
                    lower: l2,
                    upper: u2,
                },
            ) => Self::Between {
                lower: l1.max(l2).clone(),
                upper: u1.min(u2).clone(),
            },
        }
    }

    fn restrict_to(&self, pin: &Version) -> VersionRange {
        if self.contains(pin) {
            Self::Exact(pin.clone())
        } else {
            Self::empty_at(pin.clone())
        }
    }

    /// Whether every version in `self` is also in `other`, with `self`
    /// accepting strictly fewer bounds. Used to detect tightening.
    pub fn is_narrower_than(&self, other: &VersionRange) -> bool {
        self != other && &self.intersect(other) == self
    }

    /// Parse `A..<B`, `^A`, or an exact `A`.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let trimmed = text.trim();
        let invalid = |_| VersionError::InvalidRange(text.to_string());

        if let Some((lower, upper)) = trimmed.split_once("..<") {
            let lower = Version::parse(lower.trim()).map_err(invalid)?;
            let upper = Version::parse(upper.trim()).map_err(invalid)?;
            return Ok(Self::between(lower, upper));
        }
        if let Some(base) = trimmed.strip_prefix('^') {
            let base = Version::parse(base.trim()).map_err(invalid)?;
            return Self::up_to_next_major(base)
                .ok_or_else(|| VersionError::InvalidRange(text.to_string()));
        }
        Version::parse(trimmed).map(Self::Exact).map_err(invalid)
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Between { lower, upper } => write!(f, "{lower}..<{upper}"),
            Self::Exact(pin) => write!(f, "{pin}"),
        }
    }
}
