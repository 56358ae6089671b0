//! Structural diffing between two versions of a resource snippet.
//!
//! The diff is deliberately coarse: a changed sub-field reports only its
//! owning top-level key. Any edit inside a compound property is treated
//! the same as replacing the whole property, which is what keeps the
//! downstream replace-vs-resize classification sound.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::snippet::{INSTANCE_TYPE_KEY, UPDATE_POLICY_KEY};

/// Classification of the change between two snippet versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeClassification {
    /// The snippets are structurally identical.
    NoChange,
    /// Only the `UpdatePolicy` key differs; membership is untouched.
    PolicyOnly,
    /// One or more top-level keys differ (possibly including
    /// `UpdatePolicy` alongside others).
    PropertiesChanged(BTreeSet<String>),
}

impl ChangeClassification {
    pub fn is_no_change(&self) -> bool {
        matches!(self, ChangeClassification::NoChange)
    }
}

/// Compare two fully-resolved snippets by structural equality per
/// top-level key. Every group-update path classifies through this
/// before deciding whether instance churn is required.
pub fn diff_snippets(current: &Value, updated: &Value) -> ChangeClassification {
    let empty = serde_json::Map::new();
    let current_map = current.as_object().unwrap_or(&empty);
    let updated_map = updated.as_object().unwrap_or(&empty);

    let mut changed: BTreeSet<String> = BTreeSet::new();
    for key in current_map.keys().chain(updated_map.keys()) {
        if changed.contains(key) {
            continue;
        }
        if current_map.get(key) != updated_map.get(key) {
            changed.insert(key.clone());
        }
    }

    if changed.is_empty() {
        ChangeClassification::NoChange
    } else if changed.len() == 1 && changed.contains(UPDATE_POLICY_KEY) {
        ChangeClassification::PolicyOnly
    } else {
        ChangeClassification::PropertiesChanged(changed)
    }
}

/// The kind of member churn a launch-configuration change demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChurnKind {
    /// An immutable launch property changed (image, user data, ...);
    /// members must be destroyed and recreated.
    Replace,
    /// Only the instance flavor changed; members are resized in place.
    ResizeInPlace { flavor: String },
}

/// Classify how members must be reconciled after a launch-configuration
/// change. Returns `None` when the launch properties are identical.
pub fn classify_launch_change(current: &Value, updated: &Value) -> Option<ChurnKind> {
    if current == updated {
        return None;
    }

    let empty = serde_json::Map::new();
    let current_map = current.as_object().unwrap_or(&empty);
    let updated_map = updated.as_object().unwrap_or(&empty);

    let changed: BTreeSet<&str> = current_map
        .keys()
        .chain(updated_map.keys())
        .map(String::as_str)
        .filter(|key| current_map.get(*key) != updated_map.get(*key))
        .collect();

    let only_flavor = changed.iter().all(|key| *key == INSTANCE_TYPE_KEY);
    if only_flavor
        && let Some(flavor) = updated_map.get(INSTANCE_TYPE_KEY).and_then(Value::as_str)
    {
        return Some(ChurnKind::ResizeInPlace {
            flavor: flavor.to_string(),
        });
    }
    Some(ChurnKind::Replace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snippet(policy: Option<Value>) -> Value {
        let mut snippet = json!({
            "Type": "AWS::AutoScaling::AutoScalingGroup",
            "Properties": {
                "MinSize": "10",
                "MaxSize": "20",
                "LaunchConfigurationName": "LaunchConfig"
            }
        });
        if let Some(policy) = policy {
            snippet["UpdatePolicy"] = policy;
        }
        snippet
    }

    #[test]
    fn identical_snippets_yield_no_change() {
        let a = snippet(Some(json!({"AutoScalingRollingUpdate": {"MaxBatchSize": "2"}})));
        assert_eq!(diff_snippets(&a, &a), ChangeClassification::NoChange);
    }

    #[test]
    fn policy_added_is_policy_only() {
        let current = snippet(None);
        let updated = snippet(Some(json!({"AutoScalingRollingUpdate": {}})));
        assert_eq!(diff_snippets(&current, &updated), ChangeClassification::PolicyOnly);
    }

    #[test]
    fn policy_removed_is_policy_only() {
        let current = snippet(Some(json!({"AutoScalingRollingUpdate": {}})));
        let updated = snippet(None);
        assert_eq!(diff_snippets(&current, &updated), ChangeClassification::PolicyOnly);
    }

    #[test]
    fn nested_policy_edit_reports_owning_key_only() {
        let current = snippet(Some(json!({"AutoScalingRollingUpdate": {"MaxBatchSize": "2"}})));
        let updated = snippet(Some(json!({"AutoScalingRollingUpdate": {"MaxBatchSize": "4"}})));
        assert_eq!(diff_snippets(&current, &updated), ChangeClassification::PolicyOnly);
    }

    #[test]
    fn property_edit_reports_properties_key() {
        let current = snippet(None);
        let mut updated = snippet(None);
        updated["Properties"]["MinSize"] = json!("12");

        match diff_snippets(&current, &updated) {
            ChangeClassification::PropertiesChanged(keys) => {
                assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["Properties"]);
            }
            other => panic!("expected PropertiesChanged, got {other:?}"),
        }
    }

    #[test]
    fn policy_and_property_edits_report_both_keys() {
        let current = snippet(Some(json!({"AutoScalingRollingUpdate": {}})));
        let mut updated = snippet(Some(json!({"AutoScalingRollingUpdate": {"MaxBatchSize": "4"}})));
        updated["Properties"]["MinSize"] = json!("12");

        match diff_snippets(&current, &updated) {
            ChangeClassification::PropertiesChanged(keys) => {
                assert!(keys.contains("Properties"));
                assert!(keys.contains("UpdatePolicy"));
            }
            other => panic!("expected PropertiesChanged, got {other:?}"),
        }
    }

    #[test]
    fn flavor_only_change_resizes_in_place() {
        let current = json!({"ImageId": "F20", "InstanceType": "m1.medium"});
        let updated = json!({"ImageId": "F20", "InstanceType": "m1.large"});
        assert_eq!(
            classify_launch_change(&current, &updated),
            Some(ChurnKind::ResizeInPlace { flavor: "m1.large".into() })
        );
    }

    #[test]
    fn image_change_forces_replacement() {
        let current = json!({"ImageId": "F20", "InstanceType": "m1.medium"});
        let updated = json!({"ImageId": "F17", "InstanceType": "m1.medium"});
        assert_eq!(classify_launch_change(&current, &updated), Some(ChurnKind::Replace));
    }

    #[test]
    fn image_and_flavor_change_forces_replacement() {
        let current = json!({"ImageId": "F20", "InstanceType": "m1.medium"});
        let updated = json!({"ImageId": "F17", "InstanceType": "m1.large"});
        assert_eq!(classify_launch_change(&current, &updated), Some(ChurnKind::Replace));
    }

    #[test]
    fn identical_launch_config_is_no_churn() {
        let config = json!({"ImageId": "F20", "InstanceType": "m1.medium"});
        assert_eq!(classify_launch_change(&config, &config), None);
    }
}
