//! Storage- and snapshot-location resolution (SPEC_FULL §4.3, §4.5).

use std::collections::HashMap;

use crate::interfaces::{ListableCache, NotFound};
use crate::types::{AccessMode, BackupStorageLocation, SnapshotLocationMap, VolumeSnapshotLocation};

/// Looks up the named `BackupStorageLocation`, producing the exact
/// wording the Validator needs on a miss (SPEC_FULL §4.4).
pub fn get_storage_location(
    cache: &dyn ListableCache<BackupStorageLocation>,
    namespace: &str,
    name: &str,
) -> Result<BackupStorageLocation, String> {
    cache.get(namespace, name).map_err(|NotFound| {
        format!(
            "a BackupStorageLocation CRD with the name specified in the backup spec needs to be created before this backup can be executed. Error: {name} not found"
        )
    })
}

/// Enforces the read-write invariant (SPEC_FULL §3): returns an error
/// string when `location` is present but read-only.
pub fn check_writable(location: &BackupStorageLocation) -> Option<String> {
    match location.access_mode {
        AccessMode::ReadWrite => None,
        AccessMode::ReadOnly => Some(format!(
            "backup can't be created because backup storage location {} is currently in read-only mode",
            location.name
        )),
    }
}

/// Resolves the effective provider -> location mapping for a backup
/// (SPEC_FULL §4.5). Errors are appended to `errors` rather than
/// returned, since the Validator folds them into its own combined list.
pub fn resolve_snapshot_locations(
    cache: &dyn ListableCache<VolumeSnapshotLocation>,
    namespace: &str,
    requested_names: &[String],
    defaults: &HashMap<String, String>,
    errors: &mut Vec<String>,
) -> SnapshotLocationMap {
    // Pass 1: look up every explicitly-requested name, deduplicating
    // by (provider, location-name) and flagging any provider that
    // still has more than one distinct location after dedup.
    let mut by_provider: HashMap<String, String> = HashMap::new();
    for name in requested_names {
        let location = match cache.get(namespace, name) {
            Ok(l) => l,
            Err(NotFound) => {
                errors.push(format!(
                    "a VolumeSnapshotLocation CRD for the location {name} with the name specified in the backup spec needs to be created before this snapshot can be executed. Error: {name} not found"
                ));
                continue;
            }
        };

        match by_provider.get(&location.provider) {
            Some(kept) if kept == &location.name => {
                // Same (provider, name) seen twice: dedup, no error.
            }
            Some(kept) => {
                errors.push(format!(
                    "more than one VolumeSnapshotLocation name specified for provider {}: {kept}; unexpected name was {}",
                    location.provider, location.name
                ));
            }
            None => {
                by_provider.insert(location.provider.clone(), location.name.clone());
            }
        }
    }

    // Pass 2: fill gaps for providers not yet represented, using
    // explicit defaults first and implicit single-candidate locations
    // second.
    let all_locations = cache.list(namespace);
    let mut candidates_by_provider: HashMap<&str, Vec<&VolumeSnapshotLocation>> = HashMap::new();
    for location in &all_locations {
        candidates_by_provider
            .entry(location.provider.as_str())
            .or_default()
            .push(location);
    }

    for (provider, candidates) in &candidates_by_provider {
        if by_provider.contains_key(*provider) {
            continue;
        }
        if let Some(default_name) = defaults.get(*provider) {
            by_provider.insert((*provider).to_string(), default_name.clone());
            continue;
        }
        match candidates.as_slice() {
            [only] => {
                by_provider.insert((*provider).to_string(), only.name.clone());
            }
            _ => {
                errors.push(format!(
                    "provider {provider} has more than one possible volume snapshot location, and none were specified explicitly or as a default"
                ));
            }
        }
    }

    by_provider
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::Cache;
    use std::sync::Mutex;

    struct InMemoryVslCache {
        locations: Mutex<Vec<VolumeSnapshotLocation>>,
    }

    impl Cache<VolumeSnapshotLocation> for InMemoryVslCache {
        fn get(&self, namespace: &str, name: &str) -> Result<VolumeSnapshotLocation, NotFound> {
            self.locations
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.namespace == namespace && l.name == name)
                .cloned()
                .ok_or(NotFound)
        }
    }

    impl ListableCache<VolumeSnapshotLocation> for InMemoryVslCache {
        fn list(&self, namespace: &str) -> Vec<VolumeSnapshotLocation> {
            self.locations
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.namespace == namespace)
                .cloned()
                .collect()
        }
    }

    fn vsl(namespace: &str, name: &str, provider: &str) -> VolumeSnapshotLocation {
        VolumeSnapshotLocation {
            namespace: namespace.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
        }
    }

    #[test]
    fn spec_scenario_7_multi_provider() {
        let cache = InMemoryVslCache {
            locations: Mutex::new(vec![
                vsl("ns", "aws-us-east-1", "aws"),
                vsl("ns", "aws-us-west-1", "aws"),
                vsl("ns", "some-name", "fake"),
            ]),
        };
        let defaults = HashMap::from([("fake".to_string(), "some-name".to_string())]);
        let mut errors = Vec::new();
        let resolved = resolve_snapshot_locations(
            &cache,
            "ns",
            &["aws-us-west-1".to_string(), "aws-us-west-1".to_string()],
            &defaults,
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(resolved.get("aws").map(String::as_str), Some("aws-us-west-1"));
        assert_eq!(resolved.get("fake").map(String::as_str), Some("some-name"));
    }

    #[test]
    fn round_trip_law_default_fills_single_provider() {
        let cache = InMemoryVslCache {
            locations: Mutex::new(vec![vsl("ns", "A", "p1"), vsl("ns", "B", "p1")]),
        };
        let defaults = HashMap::from([("p1".to_string(), "A".to_string())]);
        let mut errors = Vec::new();
        let resolved = resolve_snapshot_locations(&cache, "ns", &[], &defaults, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(resolved.get("p1").map(String::as_str), Some("A"));
    }

    #[test]
    fn no_snapshot_needs_yields_empty_mapping() {
        let cache = InMemoryVslCache {
            locations: Mutex::new(vec![]),
        };
        let mut errors = Vec::new();
        let resolved =
            resolve_snapshot_locations(&cache, "ns", &[], &HashMap::new(), &mut errors);
        assert!(errors.is_empty());
        assert!(resolved.is_empty());
    }

    #[test]
    fn ambiguous_provider_without_default_errors() {
        let cache = InMemoryVslCache {
            locations: Mutex::new(vec![vsl("ns", "A", "p1"), vsl("ns", "B", "p1")]),
        };
        let mut errors = Vec::new();
        let resolved =
            resolve_snapshot_locations(&cache, "ns", &[], &HashMap::new(), &mut errors);
        assert!(resolved.get("p1").is_none());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("more than one possible volume snapshot location"));
    }
}
