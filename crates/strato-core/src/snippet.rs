//! Accessors over fully-resolved resource snippets.
//!
//! A snippet is the JSON mapping of a single resource definition after
//! intrinsic functions have been evaluated: `Type`, `Properties`, and
//! optionally `UpdatePolicy` at the top level. Templates carry numbers
//! as quoted strings, so numeric reads accept both forms.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{ValidationError, ValidationResult};

/// Top-level snippet key holding the resource type name.
pub const TYPE_KEY: &str = "Type";
/// Top-level snippet key holding the resource properties.
pub const PROPERTIES_KEY: &str = "Properties";
/// Top-level snippet key holding the update policy mapping.
pub const UPDATE_POLICY_KEY: &str = "UpdatePolicy";

/// Launch-configuration property that can be adjusted in place.
pub const INSTANCE_TYPE_KEY: &str = "InstanceType";

/// Read a snippet's `Properties` mapping.
pub fn properties(snippet: &Value) -> ValidationResult<&Value> {
    snippet
        .get(PROPERTIES_KEY)
        .filter(|v| v.is_object())
        .ok_or_else(|| ValidationError::MalformedSnippet("missing Properties mapping".into()))
}

/// Read a snippet's `UpdatePolicy` mapping, if present.
///
/// Absence of the key is meaningful (no rolling update configured) and
/// is distinct from a present-but-empty policy body.
pub fn update_policy(snippet: &Value) -> Option<&Value> {
    snippet.get(UPDATE_POLICY_KEY)
}

/// Interpret a JSON value as a non-negative integer, accepting both
/// numbers and numeric strings.
pub fn value_as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Interpret a JSON value as a signed integer, accepting both numbers
/// and numeric strings. Used to detect negative policy values before
/// they are narrowed to `u32`.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Capacity and wiring read from a group snippet's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupProperties {
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: Option<u32>,
    pub load_balancer_names: Vec<String>,
}

impl GroupProperties {
    /// Extract group properties from a resolved snippet.
    pub fn from_snippet(snippet: &Value) -> ValidationResult<Self> {
        let props = properties(snippet)?;
        let required = |key: &str| -> ValidationResult<u32> {
            props
                .get(key)
                .and_then(value_as_u32)
                .ok_or_else(|| ValidationError::MalformedSnippet(format!("missing or non-numeric {key}")))
        };

        let min_size = required("MinSize")?;
        let max_size = required("MaxSize")?;
        if min_size > max_size {
            return Err(ValidationError::MalformedSnippet(format!(
                "MinSize {min_size} exceeds MaxSize {max_size}"
            )));
        }

        let desired_capacity = props.get("DesiredCapacity").and_then(value_as_u32);
        let load_balancer_names = props
            .get("LoadBalancerNames")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            min_size,
            max_size,
            desired_capacity,
            load_balancer_names,
        })
    }

    /// The member count the group must reconcile to during an update:
    /// the requested desired capacity (falling back to the current
    /// capacity) clamped to the configured size bounds.
    pub fn effective_capacity(&self, current: u32) -> u32 {
        self.desired_capacity
            .unwrap_or(current)
            .clamp(self.min_size, self.max_size)
    }
}

/// Fingerprint of a resolved launch configuration.
///
/// Members record the fingerprint they were created from, so an update
/// can tell which members still need replacement after a partial run.
/// serde_json orders object keys, so serialization is canonical.
pub fn launch_config_fingerprint(launch_config: &Value) -> String {
    let canonical = serde_json::to_string(launch_config).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}
