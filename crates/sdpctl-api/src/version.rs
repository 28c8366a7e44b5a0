// Semantic appliance versions
//
// Controllers self-report versions such as `5.5.1` or `4.3.0-20000` (build
// number as pre-release). When a controller omits the version, the catalog
// estimate is used and tagged with `+estimated` build metadata.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const ESTIMATED_TAG: &str = "estimated";

/// Semantic version of a controller appliance.
///
/// Ordering follows semver precedence on `major.minor.patch` and the
/// pre-release tag. The estimated marker only breaks ties, so an estimate
/// compares equal in release to the version it estimates:
/// `5.4.0+estimated` satisfies a `>= 5.4.0` capability check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplianceVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release tag, e.g. the `20000` build number in `4.3.0-20000`.
    pub pre: Option<String>,
    estimated: bool,
}

impl ApplianceVersion {
    /// Creates a controller-confirmed release version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
            estimated: false,
        }
    }

    /// Returns a copy marked as estimated (not confirmed by a controller).
    pub fn into_estimate(mut self) -> Self {
        self.estimated = true;
        self
    }

    /// `true` if this version was inferred from the catalog rather than
    /// reported by the controller.
    pub fn is_estimated(&self) -> bool {
        self.estimated
    }

    /// `true` if both versions name the same release, ignoring the
    /// estimated marker.
    pub fn same_release(&self, other: &Self) -> bool {
        self.release_cmp(other) == Ordering::Equal
    }

    fn release_cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| cmp_pre(self.pre.as_deref(), other.pre.as_deref()))
    }
}

/// Semver pre-release precedence: a release outranks any pre-release,
/// numeric identifiers compare numerically.
fn cmp_pre(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let mut left = a.split('.');
            let mut right = b.split('.');
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some(x), Some(y)) => {
                        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                            (Ok(x), Ok(y)) => x.cmp(&y),
                            (Ok(_), Err(_)) => Ordering::Less,
                            (Err(_), Ok(_)) => Ordering::Greater,
                            (Err(_), Err(_)) => x.cmp(y),
                        };
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                }
            }
        }
    }
}

impl Ord for ApplianceVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release_cmp(other)
            .then_with(|| self.estimated.cmp(&other.estimated))
    }
}

impl PartialOrd for ApplianceVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ApplianceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.pre {
            write!(f, "-{pre}")?;
        }
        if self.estimated {
            write!(f, "+{ESTIMATED_TAG}")?;
        }
        Ok(())
    }
}

/// Error returned when a string is not a `major.minor.patch[-pre][+build]` version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid appliance version '{input}'")]
pub struct ParseVersionError {
    input: String,
}

impl FromStr for ApplianceVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError {
            input: s.to_owned(),
        };

        let trimmed = s.trim().trim_start_matches('v');
        let (rest, build) = match trimmed.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (trimmed, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_owned())),
            Some(_) => return Err(err()),
            None => (rest, None),
        };

        let mut parts = core.split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        // Controllers occasionally report `major.minor` only.
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| err())?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.parse().map_err(|_| err())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(err());
        }

        Ok(Self {
            major,
            minor,
            patch,
            pre,
            estimated: build.is_some_and(|b| b.split('.').any(|id| id == ESTIMATED_TAG)),
        })
    }
}

impl Serialize for ApplianceVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApplianceVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
