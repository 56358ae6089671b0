//! Rolling-update policy validation and defaults.
//!
//! A group's `UpdatePolicy` mapping recognizes exactly one key,
//! `AutoScalingRollingUpdate`. An empty body enables rolling updates
//! with defaults; absence of the mapping disables them entirely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::duration::IsoDuration;
use crate::error::{ValidationError, ValidationResult};
use crate::snippet::value_as_i64;

/// The sole recognized key of an `UpdatePolicy` mapping.
pub const ROLLING_UPDATE_KEY: &str = "AutoScalingRollingUpdate";

const MIN_INSTANCES_IN_SERVICE_KEY: &str = "MinInstancesInService";
const MAX_BATCH_SIZE_KEY: &str = "MaxBatchSize";
const PAUSE_TIME_KEY: &str = "PauseTime";

/// Validated rolling-update policy for an autoscaling group.
///
/// Field names serialize in their template form, so the persisted
/// group record exposes the same surface operators wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingUpdatePolicy {
    /// Members that must stay in service while a batch runs.
    #[serde(rename = "MinInstancesInService")]
    pub min_instances_in_service: u32,
    /// Upper bound on members processed per batch.
    #[serde(rename = "MaxBatchSize")]
    pub max_batch_size: u32,
    /// Pause between batches.
    #[serde(rename = "PauseTime")]
    pub pause_time: IsoDuration,
}

impl Default for RollingUpdatePolicy {
    fn default() -> Self {
        Self {
            min_instances_in_service: 0,
            max_batch_size: 1,
            pause_time: IsoDuration::ZERO,
        }
    }
}

impl RollingUpdatePolicy {
    /// Validate a full `UpdatePolicy` mapping.
    ///
    /// Returns `Ok(None)` when the mapping does not carry
    /// `AutoScalingRollingUpdate` (rolling updates not enabled), and a
    /// defaulted policy for an empty body. Pure; no side effects.
    pub fn from_update_policy(raw: &Value) -> ValidationResult<Option<Self>> {
        let mapping = raw.as_object().ok_or_else(|| {
            ValidationError::MalformedSnippet("UpdatePolicy must be a mapping".into())
        })?;

        for key in mapping.keys() {
            if key != ROLLING_UPDATE_KEY {
                return Err(ValidationError::UnknownPolicyKey(key.clone()));
            }
        }

        match mapping.get(ROLLING_UPDATE_KEY) {
            Some(body) => Self::from_body(body).map(Some),
            None => Ok(None),
        }
    }

    /// Validate the `AutoScalingRollingUpdate` body itself.
    pub fn from_body(body: &Value) -> ValidationResult<Self> {
        let fields = body.as_object().ok_or_else(|| {
            ValidationError::MalformedSnippet(format!("{ROLLING_UPDATE_KEY} must be a mapping"))
        })?;

        let mut policy = Self::default();
        for (field, value) in fields {
            match field.as_str() {
                MIN_INSTANCES_IN_SERVICE_KEY => {
                    policy.min_instances_in_service =
                        non_negative(MIN_INSTANCES_IN_SERVICE_KEY, value)?;
                }
                MAX_BATCH_SIZE_KEY => {
                    let batch = non_negative(MAX_BATCH_SIZE_KEY, value)?;
                    if batch == 0 {
                        return Err(invalid_value(MAX_BATCH_SIZE_KEY, value, "must be positive"));
                    }
                    policy.max_batch_size = batch;
                }
                PAUSE_TIME_KEY => {
                    let text = value.as_str().ok_or_else(|| {
                        ValidationError::InvalidDuration(value.to_string())
                    })?;
                    policy.pause_time = IsoDuration::parse(text)?;
                }
                other => return Err(ValidationError::UnknownPolicyKey(other.to_string())),
            }
        }
        Ok(policy)
    }

    /// Render the policy as the persisted `UpdatePolicy` mapping surface.
    pub fn as_update_policy(&self) -> Value {
        serde_json::json!({ ROLLING_UPDATE_KEY: self })
    }
}

fn non_negative(field: &str, value: &Value) -> ValidationResult<u32> {
    let parsed = value_as_i64(value)
        .ok_or_else(|| invalid_value(field, value, "expected an integer"))?;
    if parsed < 0 {
        return Err(invalid_value(field, value, "must be non-negative"));
    }
    u32::try_from(parsed).map_err(|_| invalid_value(field, value, "out of range"))
}

fn invalid_value(field: &str, value: &Value, reason: &str) -> ValidationError {
    ValidationError::InvalidPolicyValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_expands_to_defaults() {
        let raw = json!({ "AutoScalingRollingUpdate": {} });
        let policy = RollingUpdatePolicy::from_update_policy(&raw)
            .unwrap()
            .unwrap();
        assert_eq!(policy.min_instances_in_service, 0);
        assert_eq!(policy.max_batch_size, 1);
        assert_eq!(policy.pause_time, IsoDuration::ZERO);
    }

    #[test]
    fn absent_rolling_update_key_is_none() {
        let raw = json!({});
        assert!(RollingUpdatePolicy::from_update_policy(&raw)
            .unwrap()
            .is_none());
    }

    #[test]
    fn unknown_top_level_key_names_the_offender() {
        let raw = json!({ "foo": {} });
        let err = RollingUpdatePolicy::from_update_policy(&raw).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownPolicyKey(ref k) if k == "foo"));
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn unknown_body_field_names_the_offender() {
        let raw = json!({ "AutoScalingRollingUpdate": { "MaxBatchSz": 2 } });
        let err = RollingUpdatePolicy::from_update_policy(&raw).unwrap_err();
        assert!(err.to_string().contains("MaxBatchSz"));
    }

    #[test]
    fn parses_quoted_template_values() {
        let raw = json!({
            "AutoScalingRollingUpdate": {
                "MinInstancesInService": "1",
                "MaxBatchSize": "2",
                "PauseTime": "PT1S"
            }
        });
        let policy = RollingUpdatePolicy::from_update_policy(&raw)
            .unwrap()
            .unwrap();
        assert_eq!(policy.min_instances_in_service, 1);
        assert_eq!(policy.max_batch_size, 2);
        assert_eq!(policy.pause_time.as_secs(), 1);
    }

    #[test]
    fn negative_values_are_rejected() {
        let raw = json!({ "AutoScalingRollingUpdate": { "MinInstancesInService": -1 } });
        let err = RollingUpdatePolicy::from_update_policy(&raw).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPolicyValue { ref field, .. }
                if field == "MinInstancesInService"
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let raw = json!({ "AutoScalingRollingUpdate": { "MaxBatchSize": "0" } });
        assert!(RollingUpdatePolicy::from_update_policy(&raw).is_err());
    }

    #[test]
    fn bad_pause_time_is_rejected() {
        let raw = json!({ "AutoScalingRollingUpdate": { "PauseTime": "P1YT1H" } });
        let err = RollingUpdatePolicy::from_update_policy(&raw).unwrap_err();
        assert!(err.to_string().contains("Only ISO 8601 duration format"));
    }

    #[test]
    fn policy_mapping_surface_round_trips() {
        let policy = RollingUpdatePolicy {
            min_instances_in_service: 1,
            max_batch_size: 2,
            pause_time: IsoDuration::parse("PT1M30S").unwrap(),
        };
        let mapping = policy.as_update_policy();
        let back = RollingUpdatePolicy::from_update_policy(&mapping)
            .unwrap()
            .unwrap();
        assert_eq!(back, policy);
    }
}
