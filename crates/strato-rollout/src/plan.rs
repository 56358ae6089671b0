//! Rolling batch planner.
//!
//! Turns a validated policy plus the group's current membership into an
//! ordered batch plan. Plans are transient: recomputed on every update
//! attempt, consumed by the executor, never cached.

use std::time::Duration;

use tracing::debug;

use strato_core::{ChurnKind, RollingUpdatePolicy};
use strato_state::{MemberId, MemberRecord};

/// One unit of a rolling update: members processed together, followed
/// by an optional pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Existing members retired or resized in this batch, oldest first.
    pub members: Vec<MemberId>,
    /// Replacement instances created in this batch.
    pub create_count: u32,
    /// Original instances destroyed in this batch.
    pub delete_count: u32,
    /// Pause before the next batch starts; always zero on the last.
    pub pause_after: Duration,
}

/// An ordered batch sequence for one update attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub churn: ChurnKind,
    pub batches: Vec<Batch>,
}

impl BatchPlan {
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Sum of inter-batch pauses — the guaranteed floor on how long the
    /// plan takes, excluding per-instance provisioning latency.
    pub fn pause_overhead(&self) -> Duration {
        self.batches.iter().map(|b| b.pause_after).sum()
    }
}

/// Compute the batch plan for a group update.
///
/// `batch_size = min(max_batch_size, effective_capacity)` (minimum 1);
/// `batch_count = ceil(effective_capacity / batch_size)`; the final
/// batch takes the remainder. Member selection walks `members` in
/// insertion order, so a full pass touches every original exactly once,
/// oldest first. Members beyond `effective_capacity` (a shrinking
/// group) are retired in a trailing delete-only batch.
///
/// Replacement batches carry equal create and delete counts; the
/// executor creates before destroying, which is what keeps in-service
/// membership above `min_instances_in_service`.
pub fn plan(
    members: &[MemberRecord],
    churn: ChurnKind,
    policy: &RollingUpdatePolicy,
    effective_capacity: u32,
) -> BatchPlan {
    let batch_size = policy.max_batch_size.min(effective_capacity).max(1);
    let batch_count = effective_capacity.div_ceil(batch_size);
    let pause = policy.pause_time.as_duration();

    let mut queue = members.iter().map(|m| m.id.clone());
    let mut batches = Vec::with_capacity(batch_count as usize);

    for index in 0..batch_count {
        let slots = if index == batch_count - 1 {
            effective_capacity - batch_size * (batch_count - 1)
        } else {
            batch_size
        };
        let selected: Vec<MemberId> = queue.by_ref().take(slots as usize).collect();

        let (create_count, delete_count) = match churn {
            ChurnKind::Replace => (slots, selected.len() as u32),
            ChurnKind::ResizeInPlace { .. } => (0, 0),
        };

        batches.push(Batch {
            members: selected,
            create_count,
            delete_count,
            pause_after: pause,
        });
    }

    // Shrinking below the original membership: leftover members are
    // retired without replacements.
    let leftover: Vec<MemberId> = queue.collect();
    if !leftover.is_empty() {
        let delete_count = leftover.len() as u32;
        batches.push(Batch {
            members: leftover,
            create_count: 0,
            delete_count,
            pause_after: pause,
        });
    }

    if let Some(last) = batches.last_mut() {
        last.pause_after = Duration::ZERO;
    }

    debug!(
        batches = batches.len(),
        batch_size,
        effective_capacity,
        pause_secs = pause.as_secs(),
        "batch plan computed"
    );

    BatchPlan { churn, batches }
}
