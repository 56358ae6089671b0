//! Group update driver.
//!
//! Ties one update attempt together: validate the incoming policy,
//! classify the definition change, plan batches, check feasibility
//! against the stack's remaining timeout, then execute. Validation and
//! the feasibility check both complete before the first mutating call,
//! and every outcome is typed; there is no hidden default-success path.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::sync::watch;
use tracing::info;

use strato_core::{
    ChangeClassification, GroupProperties, RollingUpdatePolicy, classify_launch_change,
    diff_snippets, launch_config_fingerprint, snippet,
};
use strato_state::{GroupRecord, StateStore};

use crate::clients::{InstanceClient, LoadBalancerClient};
use crate::error::RolloutResult;
use crate::executor::{BatchStats, GroupUpdateExecutor};
use crate::plan;
use crate::timeout::check_feasible;

/// One update attempt against a group.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// The updated group snippet, fully resolved.
    pub snippet: Value,
    /// The updated launch-configuration properties, fully resolved.
    pub launch_config: Value,
    /// Stack timeout budget remaining at the moment the update begins.
    pub remaining_timeout: Duration,
}

/// What an update attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The definitions are structurally identical; nothing happened.
    Unchanged,
    /// Metadata changed but membership did not: the record was
    /// persisted and collaborators refreshed with one reload.
    Refreshed { stats: BatchStats },
    /// Only the member count changed; the group was grown or shrunk.
    CapacityAdjusted { from: u32, to: u32, stats: BatchStats },
    /// Members were churned through the batch plan.
    RolledBatches { batches: usize, stats: BatchStats },
    /// Properties changed but the group carries no rolling-update
    /// policy; wholesale resource replacement is the enclosing
    /// engine's job and is signalled, not performed.
    NeedsReplacement { changed_keys: BTreeSet<String> },
}

/// Applies definition updates to groups.
///
/// The enclosing engine serializes updates per stack; the driver takes
/// `&mut GroupRecord`, making the single-writer assumption explicit.
pub struct GroupUpdater<C, L> {
    store: StateStore,
    instances: C,
    load_balancer: Option<L>,
    shutdown: watch::Receiver<bool>,
    resize_poll_interval: Duration,
    resize_poll_budget: u32,
}

impl<C, L> GroupUpdater<C, L>
where
    C: InstanceClient,
    L: LoadBalancerClient,
{
    pub fn new(store: StateStore, instances: C, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            store,
            instances,
            load_balancer: None,
            shutdown,
            resize_poll_interval: Duration::from_secs(2),
            resize_poll_budget: 30,
        }
    }

    /// Attach the group's load-balancer collaborator.
    pub fn with_load_balancer(mut self, balancer: L) -> Self {
        self.load_balancer = Some(balancer);
        self
    }

    /// Override resize polling cadence and budget.
    pub fn with_resize_polling(mut self, interval: Duration, budget: u32) -> Self {
        self.resize_poll_interval = interval;
        self.resize_poll_budget = budget;
        self
    }

    /// Apply one definition update to a group.
    pub async fn apply_update(
        &mut self,
        group: &mut GroupRecord,
        request: &UpdateRequest,
    ) -> RolloutResult<UpdateOutcome> {
        // Validation first: a bad policy fails the update before any
        // classification or mutation.
        let new_policy = match snippet::update_policy(&request.snippet) {
            Some(raw) => RollingUpdatePolicy::from_update_policy(raw)?,
            None => None,
        };

        match diff_snippets(&group.definition, &request.snippet) {
            ChangeClassification::NoChange => {
                info!(group = %group.name, "definition unchanged");
                Ok(UpdateOutcome::Unchanged)
            }

            ChangeClassification::PolicyOnly => {
                // Membership is untouched, but the policy metadata must
                // be persisted and collaborators refreshed.
                group.rolling_update = new_policy;
                group.definition = request.snippet.clone();
                group.updated_at = epoch_secs();
                self.store.put_group(group)?;

                let mut stats = BatchStats::default();
                let mut executor = self.executor();
                executor.reload_balancer(group, &mut stats).await?;
                info!(group = %group.name, "update policy refreshed without churn");
                Ok(UpdateOutcome::Refreshed { stats })
            }

            ChangeClassification::PropertiesChanged(changed_keys) => {
                let props = GroupProperties::from_snippet(&request.snippet)?;
                let effective = props.effective_capacity(group.capacity);
                let churn = classify_launch_change(&group.launch_config, &request.launch_config);

                let Some(churn) = churn else {
                    return self
                        .reconcile_capacity(group, request, new_policy, props, effective)
                        .await;
                };

                let Some(policy) = new_policy else {
                    info!(
                        group = %group.name,
                        ?changed_keys,
                        "launch change without rolling-update policy, deferring to replacement"
                    );
                    return Ok(UpdateOutcome::NeedsReplacement { changed_keys });
                };

                // Accept the new definition up front: even when the
                // feasibility check rejects the plan, the record shows
                // the policy the operator asked for.
                group.rolling_update = Some(policy.clone());
                group.definition = request.snippet.clone();
                group.min_size = props.min_size;
                group.max_size = props.max_size;
                group.launch_config = request.launch_config.clone();
                group.launch_config_fingerprint = launch_config_fingerprint(&request.launch_config);
                group.updated_at = epoch_secs();
                self.store.put_group(group)?;

                // Members still on an older launch configuration are
                // the churn set for this attempt; a partially completed
                // earlier update leaves some members already current.
                let pending: Vec<_> = group
                    .live_members()
                    .filter(|m| m.launch_config_fingerprint != group.launch_config_fingerprint)
                    .cloned()
                    .collect();
                let already_current = group.live_members().count() as u32 - pending.len() as u32;
                let churn_target = effective.saturating_sub(already_current);

                let plan = plan::plan(&pending, churn, &policy, churn_target);
                check_feasible(&plan, request.remaining_timeout)?;

                info!(
                    group = %group.name,
                    batches = plan.batch_count(),
                    members = pending.len(),
                    target = effective,
                    "executing rolling update"
                );

                let mut executor = self.executor();
                let mut stats = executor.execute(group, &plan).await?;

                // In-place churn leaves the member count untouched, so a
                // simultaneous capacity change still needs reconciling.
                let live = group.live_members().count() as u32;
                if live != effective {
                    executor.resize_to(group, effective, &mut stats).await?;
                }

                group.capacity = effective;
                group.updated_at = epoch_secs();
                self.store.put_group(group)?;
                Ok(UpdateOutcome::RolledBatches {
                    batches: plan.batch_count(),
                    stats,
                })
            }
        }
    }

    /// Handle a property change that leaves the launch configuration
    /// untouched: adjust capacity if requested, otherwise just persist
    /// and refresh collaborators.
    async fn reconcile_capacity(
        &mut self,
        group: &mut GroupRecord,
        request: &UpdateRequest,
        new_policy: Option<RollingUpdatePolicy>,
        props: GroupProperties,
        effective: u32,
    ) -> RolloutResult<UpdateOutcome> {
        let from = group.capacity;
        group.rolling_update = new_policy;
        group.definition = request.snippet.clone();
        group.min_size = props.min_size;
        group.max_size = props.max_size;
        group.updated_at = epoch_secs();
        self.store.put_group(group)?;

        let mut stats = BatchStats::default();
        let mut executor = self.executor();
        if effective != from {
            executor.resize_to(group, effective, &mut stats).await?;
            Ok(UpdateOutcome::CapacityAdjusted { from, to: effective, stats })
        } else {
            executor.reload_balancer(group, &mut stats).await?;
            Ok(UpdateOutcome::Refreshed { stats })
        }
    }

    fn executor(&self) -> GroupUpdateExecutor<'_, C, L> {
        GroupUpdateExecutor::new(
            &self.instances,
            self.load_balancer.as_ref(),
            &self.store,
            self.shutdown.clone(),
        )
        .with_resize_polling(self.resize_poll_interval, self.resize_poll_budget)
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
