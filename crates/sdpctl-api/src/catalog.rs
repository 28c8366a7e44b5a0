// Client-API version catalog
//
// Maps the small integer client-API versions this crate can speak to the
// oldest appliance release that serves each of them. Built once and shared
// read-only (`Arc<VersionCatalog>`) by the validator and the negotiator.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::version::ApplianceVersion;

/// Client-API version assumed when the caller does not pick one.
pub const DEFAULT_CLIENT_VERSION: u16 = 15;

const BUILTIN: &[(u16, (u64, u64, u64))] = &[
    (12, (5, 1, 0)),
    (13, (5, 2, 0)),
    (14, (5, 3, 0)),
    (15, (5, 4, 0)),
    (16, (5, 5, 0)),
];

/// Immutable `client version -> appliance version` table.
///
/// Lookups are by exact key; there is no nearest-version matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCatalog {
    entries: BTreeMap<u16, ApplianceVersion>,
    default_version: u16,
}

impl Default for VersionCatalog {
    fn default() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|&(client, (major, minor, patch))| {
                    (client, ApplianceVersion::new(major, minor, patch))
                })
                .collect(),
            default_version: DEFAULT_CLIENT_VERSION,
        }
    }
}

impl VersionCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// Fails if `entries` is empty or `default_version` is not one of its keys.
    pub fn new(
        entries: impl IntoIterator<Item = (u16, ApplianceVersion)>,
        default_version: u16,
    ) -> Result<Self, Error> {
        let entries: BTreeMap<_, _> = entries.into_iter().collect();
        let (Some(&min), Some(&max)) = (entries.keys().next(), entries.keys().next_back()) else {
            return Err(Error::UnsupportedVersion {
                version: default_version,
                min: 0,
                max: 0,
            });
        };
        if !entries.contains_key(&default_version) {
            return Err(Error::UnsupportedVersion {
                version: default_version,
                min,
                max,
            });
        }
        Ok(Self {
            entries,
            default_version,
        })
    }

    /// The client-API version used when none is configured.
    pub fn default_client_version(&self) -> u16 {
        self.default_version
    }

    /// The highest client-API version in the catalog.
    pub fn latest_client_version(&self) -> u16 {
        self.range().1
    }

    /// Inclusive `(min, max)` range of known client-API versions.
    pub fn range(&self) -> (u16, u16) {
        let min = self.entries.keys().next().copied().unwrap_or_default();
        let max = self.entries.keys().next_back().copied().unwrap_or_default();
        (min, max)
    }

    pub fn contains(&self, version: u16) -> bool {
        self.entries.contains_key(&version)
    }

    /// Appliance version that serves `version`, by exact key.
    pub fn resolve_appliance(&self, version: u16) -> Result<ApplianceVersion, Error> {
        self.entries
            .get(&version)
            .cloned()
            .ok_or_else(|| self.unsupported(version))
    }

    /// Same as [`resolve_appliance`](Self::resolve_appliance), marked as an
    /// estimate because no controller confirmed it.
    pub fn estimate(&self, version: u16) -> Result<ApplianceVersion, Error> {
        self.resolve_appliance(version)
            .map(ApplianceVersion::into_estimate)
    }

    /// Appliance version of the maximum key. Independent of any configured version.
    pub fn latest_supported_version(&self) -> ApplianceVersion {
        self.entries
            .values()
            .next_back()
            .cloned()
            .unwrap_or_else(|| ApplianceVersion::new(0, 0, 0))
    }

    /// Iterate entries in ascending client-version order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &ApplianceVersion)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub(crate) fn unsupported(&self, version: u16) -> Error {
        let (min, max) = self.range();
        Error::UnsupportedVersion { version, min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_shape() {
        let catalog = VersionCatalog::default();
        assert_eq!(catalog.range(), (12, 16));
        assert_eq!(catalog.default_client_version(), DEFAULT_CLIENT_VERSION);
        assert!(catalog.contains(catalog.default_client_version()));
        assert_eq!(catalog.latest_client_version(), 16);
    }

    #[test]
    fn resolves_exact_keys_only() {
        let catalog = VersionCatalog::default();
        assert_eq!(
            catalog.resolve_appliance(15).expect("known"),
            ApplianceVersion::new(5, 4, 0)
        );
        for unknown in [0, 11, 17, 35, 99, 22222] {
            assert!(
                matches!(
                    catalog.resolve_appliance(unknown),
                    Err(Error::UnsupportedVersion { min: 12, max: 16, .. })
                ),
                "version {unknown} should be unsupported"
            );
        }
    }

    #[test]
    fn estimates_are_marked() {
        let catalog = VersionCatalog::default();
        let est = catalog.estimate(13).expect("known");
        assert_eq!(est.to_string(), "5.2.0+estimated");
        assert!(est.is_estimated());
    }

    #[test]
    fn latest_supported_follows_maximum_key() {
        let catalog = VersionCatalog::default();
        assert_eq!(catalog.latest_supported_version(), ApplianceVersion::new(5, 5, 0));

        let custom = VersionCatalog::new(
            [
                (7, ApplianceVersion::new(4, 0, 0)),
                (9, ApplianceVersion::new(4, 2, 0)),
                (8, ApplianceVersion::new(4, 1, 0)),
            ],
            7,
        )
        .expect("valid catalog");
        assert_eq!(custom.latest_supported_version(), ApplianceVersion::new(4, 2, 0));
        assert_eq!(custom.range(), (7, 9));
    }

    #[test]
    fn custom_catalog_requires_default_key() {
        assert!(VersionCatalog::new([], 1).is_err());
        assert!(VersionCatalog::new([(7, ApplianceVersion::new(4, 0, 0))], 8).is_err());
    }
}
