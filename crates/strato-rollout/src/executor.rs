//! Group update executor.
//!
//! Drives a batch plan sequentially: batches never overlap, which is
//! the mechanism that bounds availability loss. Within a replacement
//! batch, creates complete before any destroy is issued. After every
//! batch the group record is re-persisted and the load balancer (if
//! attached) is reloaded exactly once, so a partially failed update
//! leaves a consistent baseline for the next attempt.
//!
//! Every suspension point (Active-waits, resize polls, inter-batch
//! pauses) honors the stack shutdown signal and aborts with
//! `Cancelled`. Already-created members are left in place, never
//! rolled back.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use strato_core::ChurnKind;
use strato_state::{GroupRecord, LifecycleState, MemberRecord, StateStore};

use crate::clients::{InstanceClient, LoadBalancerClient, MemberEndpoint, RESIZE_PENDING_STATUS};
use crate::error::{RolloutError, RolloutResult};
use crate::plan::{Batch, BatchPlan};

/// Mutation counts accumulated over one update, surfaced in status
/// reporting and asserted on by tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub created: u32,
    pub destroyed: u32,
    pub resized: u32,
    pub reloads: u32,
}

/// Executes batch plans against one group.
///
/// Assumes the enclosing engine serializes updates per group; the
/// member list is mutated only here, under that single-writer lease.
pub struct GroupUpdateExecutor<'a, C, L> {
    instances: &'a C,
    load_balancer: Option<&'a L>,
    store: &'a StateStore,
    shutdown: watch::Receiver<bool>,
    resize_poll_interval: Duration,
    resize_poll_budget: u32,
}

impl<'a, C, L> GroupUpdateExecutor<'a, C, L>
where
    C: InstanceClient,
    L: LoadBalancerClient,
{
    pub fn new(
        instances: &'a C,
        load_balancer: Option<&'a L>,
        store: &'a StateStore,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            instances,
            load_balancer,
            store,
            shutdown,
            resize_poll_interval: Duration::from_secs(2),
            resize_poll_budget: 30,
        }
    }

    /// Override resize polling cadence and budget.
    pub fn with_resize_polling(mut self, interval: Duration, budget: u32) -> Self {
        self.resize_poll_interval = interval;
        self.resize_poll_budget = budget;
        self
    }

    /// Run the plan to completion, batch by batch.
    pub async fn execute(
        &mut self,
        group: &mut GroupRecord,
        plan: &BatchPlan,
    ) -> RolloutResult<BatchStats> {
        let mut stats = BatchStats::default();
        let total = plan.batch_count();

        for (index, batch) in plan.batches.iter().enumerate() {
            info!(
                group = %group.name,
                batch = index + 1,
                total,
                creates = batch.create_count,
                deletes = batch.delete_count,
                "starting batch"
            );

            match &plan.churn {
                ChurnKind::Replace => self.run_replace_batch(group, batch, &mut stats).await?,
                ChurnKind::ResizeInPlace { flavor } => {
                    self.run_resize_batch(group, batch, flavor, &mut stats).await?
                }
            }

            group.updated_at = epoch_secs();
            self.store.put_group(group)?;
            self.reload_balancer(group, &mut stats).await?;
            self.sleep_through(batch.pause_after).await?;
        }

        info!(
            group = %group.name,
            created = stats.created,
            destroyed = stats.destroyed,
            resized = stats.resized,
            "update plan completed"
        );
        Ok(stats)
    }

    /// Reconcile the member count to `target`: grow with fresh members
    /// on the current launch configuration, or retire newest-first.
    /// Issues a single reload when membership actually changed.
    pub async fn resize_to(
        &mut self,
        group: &mut GroupRecord,
        target: u32,
        stats: &mut BatchStats,
    ) -> RolloutResult<()> {
        let current = group.members.len() as u32;
        if target == current {
            return Ok(());
        }

        if target > current {
            for _ in 0..target - current {
                let member = self.create_member(group).await?;
                group.members.push(member);
                stats.created += 1;
            }
            info!(group = %group.name, from = current, to = target, "group grown");
        } else {
            // The rolling planner owns oldest-first churn; plain size
            // reduction retires the newest members.
            for _ in 0..current - target {
                let Some(mut member) = group.members.pop() else {
                    break;
                };
                member.lifecycle_state = LifecycleState::Deleting;
                self.instances.destroy(&member.id).await.map_err(|e| {
                    RolloutError::DestroyFailed {
                        member: member.id.clone(),
                        source: e,
                    }
                })?;
                stats.destroyed += 1;
            }
            info!(group = %group.name, from = current, to = target, "group shrunk");
        }

        group.capacity = target;
        group.updated_at = epoch_secs();
        self.store.put_group(group)?;
        self.reload_balancer(group, stats).await?;
        Ok(())
    }

    /// Push the group's current membership to the load balancer.
    ///
    /// One call per batch boundary; the balancer observes exactly the
    /// membership state after this batch's mutations.
    pub async fn reload_balancer(
        &mut self,
        group: &GroupRecord,
        stats: &mut BatchStats,
    ) -> RolloutResult<()> {
        let Some(balancer) = self.load_balancer else {
            return Ok(());
        };
        if group.load_balancer.is_none() {
            return Ok(());
        }

        let endpoints: Vec<MemberEndpoint> = group
            .live_members()
            .map(|m| MemberEndpoint {
                id: m.id.clone(),
                address: m.address.clone(),
                port: m.port,
            })
            .collect();

        balancer
            .reload(&endpoints)
            .await
            .map_err(|e| RolloutError::ReloadFailed {
                group: group.name.clone(),
                source: e,
            })?;
        stats.reloads += 1;
        debug!(group = %group.name, backends = endpoints.len(), "load balancer reloaded");
        Ok(())
    }

    async fn run_replace_batch(
        &mut self,
        group: &mut GroupRecord,
        batch: &Batch,
        stats: &mut BatchStats,
    ) -> RolloutResult<()> {
        // Replacements come up before any original goes down; that is
        // the invariant keeping in-service membership above the floor.
        for _ in 0..batch.create_count {
            let member = self.create_member(group).await?;
            group.members.push(member);
            stats.created += 1;
        }

        for id in &batch.members {
            if let Some(member) = group.members.iter_mut().find(|m| m.id == *id) {
                member.lifecycle_state = LifecycleState::Deleting;
            }
            self.instances
                .destroy(id)
                .await
                .map_err(|e| RolloutError::DestroyFailed {
                    member: id.clone(),
                    source: e,
                })?;
            group.members.retain(|m| m.id != *id);
            stats.destroyed += 1;
            debug!(group = %group.name, member = %id, "member retired");
        }
        Ok(())
    }

    async fn run_resize_batch(
        &mut self,
        group: &mut GroupRecord,
        batch: &Batch,
        flavor: &str,
        stats: &mut BatchStats,
    ) -> RolloutResult<()> {
        for id in &batch.members {
            set_state(group, id, LifecycleState::Resizing);
            self.instances
                .resize(id, flavor)
                .await
                .map_err(|e| RolloutError::ResizeFailed {
                    member: id.clone(),
                    source: e,
                })?;

            self.await_resize_pending(id).await?;

            self.instances
                .confirm_resize(id)
                .await
                .map_err(|e| RolloutError::ResizeFailed {
                    member: id.clone(),
                    source: e,
                })?;
            set_state(group, id, LifecycleState::Active);
            if let Some(member) = group.members.iter_mut().find(|m| m.id == *id) {
                member.launch_config_fingerprint = group.launch_config_fingerprint.clone();
            }
            stats.resized += 1;
            debug!(group = %group.name, member = %id, %flavor, "member resized");
        }
        Ok(())
    }

    async fn create_member(&mut self, group: &GroupRecord) -> RolloutResult<MemberRecord> {
        let handle = self.instances.create(&group.launch_config).await.map_err(|e| {
            RolloutError::CreateFailed {
                group: group.name.clone(),
                source: e,
            }
        })?;

        let mut member = MemberRecord {
            id: handle.id.clone(),
            address: handle.address.clone(),
            port: handle.port,
            launch_config_fingerprint: group.launch_config_fingerprint.clone(),
            lifecycle_state: LifecycleState::Pending,
        };

        let active = tokio::select! {
            biased;
            _ = self.shutdown.changed() => return Err(RolloutError::Cancelled),
            result = self.instances.await_active(&handle) => {
                result.map_err(|e| RolloutError::ActivationFailed {
                    member: handle.id.clone(),
                    source: e,
                })?
            }
        };
        if !active {
            return Err(RolloutError::ActivationFailed {
                member: handle.id.clone(),
                source: anyhow::anyhow!("instance settled in a non-active state"),
            });
        }

        member.lifecycle_state = LifecycleState::Active;
        debug!(group = %group.name, member = %member.id, "member active");
        Ok(member)
    }

    /// Poll the compute service until the member reports the
    /// resize-pending status, within the configured budget.
    async fn await_resize_pending(&mut self, id: &str) -> RolloutResult<()> {
        let mut attempts = 0;
        loop {
            let status = self
                .instances
                .get_status(id)
                .await
                .map_err(|e| RolloutError::ResizeFailed {
                    member: id.to_string(),
                    source: e,
                })?;
            if status == RESIZE_PENDING_STATUS {
                return Ok(());
            }

            attempts += 1;
            if attempts >= self.resize_poll_budget {
                warn!(member = %id, attempts, last_status = %status, "resize never confirmed");
                return Err(RolloutError::ResizeStuck {
                    member: id.to_string(),
                    attempts,
                });
            }
            self.sleep_through(self.resize_poll_interval).await?;
        }
    }

    /// Cancellable sleep; the shutdown signal wins over the timer.
    async fn sleep_through(&mut self, duration: Duration) -> RolloutResult<()> {
        if duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = self.shutdown.changed() => Err(RolloutError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

fn set_state(group: &mut GroupRecord, id: &str, state: LifecycleState) {
    if let Some(member) = group.members.iter_mut().find(|m| m.id == id) {
        member.lifecycle_state = state;
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
