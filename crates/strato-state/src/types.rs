//! Domain types for persisted autoscaling-group state.
//!
//! A `GroupRecord` is the diffing baseline for the next update: the
//! resolved definition the group was last reconciled to, its validated
//! rolling-update policy, and its insertion-ordered member list. All
//! types JSON-serialize into redb value columns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use strato_core::RollingUpdatePolicy;

/// Unique identifier of a group within a stack.
pub type GroupName = String;

/// Unique identifier of a member's underlying compute instance.
pub type MemberId = String;

// ── Group ─────────────────────────────────────────────────────────

/// Persisted state of one autoscaling group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupRecord {
    /// Name of the stack owning this group.
    pub stack: String,
    pub name: GroupName,
    /// Current member count the group is reconciled to.
    pub capacity: u32,
    pub min_size: u32,
    pub max_size: u32,
    /// Validated rolling-update policy. `None` means the definition
    /// carries no `AutoScalingRollingUpdate` key, which is distinct
    /// from an empty (defaulted) policy body.
    pub rolling_update: Option<RollingUpdatePolicy>,
    /// The fully-resolved snippet this group was last reconciled to.
    pub definition: Value,
    /// Resolved launch-configuration properties members are built from.
    pub launch_config: Value,
    /// SHA-256 fingerprint of `launch_config`.
    pub launch_config_fingerprint: String,
    /// Load-balancer wiring, when the group is attached to one.
    pub load_balancer: Option<LoadBalancerAttachment>,
    /// Members in insertion order; order is significant (oldest-first
    /// batch selection). Mutated only by the update executor.
    pub members: Vec<MemberRecord>,
    /// Unix timestamp (seconds) when this record was created.
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last reconciliation.
    pub updated_at: u64,
}

impl GroupRecord {
    /// Build the composite key for the groups table.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.stack, self.name)
    }

    /// Render the persisted `UpdatePolicy` mapping surface: a mapping
    /// whose sole possible key is `AutoScalingRollingUpdate`, or an
    /// empty mapping when rolling updates are not enabled.
    pub fn update_policy_mapping(&self) -> Value {
        match &self.rolling_update {
            Some(policy) => policy.as_update_policy(),
            None => Value::Object(serde_json::Map::new()),
        }
    }

    /// Members that have not been destroyed, in insertion order.
    pub fn live_members(&self) -> impl Iterator<Item = &MemberRecord> {
        self.members
            .iter()
            .filter(|m| !matches!(m.lifecycle_state, LifecycleState::Deleted))
    }
}

// ── Members ───────────────────────────────────────────────────────

/// One underlying compute instance of a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberRecord {
    pub id: MemberId,
    pub address: String,
    pub port: u16,
    /// Fingerprint of the launch configuration this member was created
    /// from; members whose fingerprint trails the group's need churn.
    pub launch_config_fingerprint: String,
    pub lifecycle_state: LifecycleState,
}

/// Lifecycle state of a group member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Pending,
    Active,
    Resizing,
    Deleting,
    Deleted,
}

// ── Load balancer ─────────────────────────────────────────────────

/// Wiring between a group and its load-balancer collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadBalancerAttachment {
    /// Logical name of the load-balancer resource in the stack.
    pub name: String,
    /// Listener mappings the balancer serves for this group.
    pub listeners: Vec<ListenerMapping>,
}

/// One frontend-to-backend port mapping on the load balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenerMapping {
    pub lb_port: u16,
    pub instance_port: u16,
    pub protocol: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strato_core::IsoDuration;

    fn record(policy: Option<RollingUpdatePolicy>) -> GroupRecord {
        GroupRecord {
            stack: "test_stack".to_string(),
            name: "WebServerGroup".to_string(),
            capacity: 2,
            min_size: 1,
            max_size: 4,
            rolling_update: policy,
            definition: serde_json::json!({}),
            launch_config: serde_json::json!({"ImageId": "F20"}),
            launch_config_fingerprint: "abc".to_string(),
            load_balancer: None,
            members: vec![
                MemberRecord {
                    id: "inst-0".to_string(),
                    address: "10.0.0.1".to_string(),
                    port: 80,
                    launch_config_fingerprint: "abc".to_string(),
                    lifecycle_state: LifecycleState::Active,
                },
                MemberRecord {
                    id: "inst-1".to_string(),
                    address: "10.0.0.2".to_string(),
                    port: 80,
                    launch_config_fingerprint: "abc".to_string(),
                    lifecycle_state: LifecycleState::Deleted,
                },
            ],
            created_at: 1000,
            updated_at: 1000,
        }
    }

    #[test]
    fn update_policy_mapping_has_single_key() {
        let policy = RollingUpdatePolicy {
            min_instances_in_service: 1,
            max_batch_size: 2,
            pause_time: IsoDuration::from_secs(1),
        };
        let mapping = record(Some(policy)).update_policy_mapping();
        let keys: Vec<_> = mapping.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["AutoScalingRollingUpdate"]);
    }

    #[test]
    fn update_policy_mapping_empty_without_policy() {
        let mapping = record(None).update_policy_mapping();
        assert!(mapping.as_object().unwrap().is_empty());
    }

    #[test]
    fn live_members_skip_deleted() {
        let rec = record(None);
        let live: Vec<_> = rec.live_members().map(|m| m.id.as_str()).collect();
        assert_eq!(live, vec!["inst-0"]);
    }

    #[test]
    fn record_serde_round_trips() {
        let rec = record(Some(RollingUpdatePolicy::default()));
        let json = serde_json::to_vec(&rec).unwrap();
        let back: GroupRecord = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, rec);
    }
}
