//! Stack-timeout feasibility check.
//!
//! Runs after planning and strictly before the first mutating call.
//! The estimate counts only the inter-batch pauses, a conservative
//! lower bound that excludes provisioning latency. If the pause
//! overhead alone exceeds the stack's remaining timeout, the update is
//! certain to fail, so it is rejected immediately with no instance
//! mutation or load-balancer reload issued.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{RolloutError, RolloutResult};
use crate::plan::BatchPlan;

/// Verify the plan can complete within the stack's remaining timeout.
pub fn check_feasible(plan: &BatchPlan, stack_remaining: Duration) -> RolloutResult<()> {
    let estimated = plan.pause_overhead();
    if estimated > stack_remaining {
        warn!(
            estimated_secs = estimated.as_secs(),
            remaining_secs = stack_remaining.as_secs(),
            batches = plan.batch_count(),
            "update policy pause overhead exceeds remaining stack timeout"
        );
        return Err(RolloutError::UpdateTimeout);
    }
    debug!(
        estimated_secs = estimated.as_secs(),
        remaining_secs = stack_remaining.as_secs(),
        "update plan fits remaining stack timeout"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Batch;
    use strato_core::ChurnKind;

    fn plan_with_pauses(count: usize, pause: Duration) -> BatchPlan {
        let mut batches: Vec<Batch> = (0..count)
            .map(|i| Batch {
                members: vec![format!("inst-{i}")],
                create_count: 1,
                delete_count: 1,
                pause_after: pause,
            })
            .collect();
        if let Some(last) = batches.last_mut() {
            last.pause_after = Duration::ZERO;
        }
        BatchPlan {
            churn: ChurnKind::Replace,
            batches,
        }
    }

    #[test]
    fn six_batches_of_fourteen_minutes_exceed_one_hour() {
        // (6 - 1) * 14 * 60 = 4200 > 3600.
        let plan = plan_with_pauses(6, Duration::from_secs(14 * 60));
        let err = check_feasible(&plan, Duration::from_secs(3600)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The current UpdatePolicy will result in stack update timeout."
        );
    }

    #[test]
    fn overhead_equal_to_remaining_is_feasible() {
        let plan = plan_with_pauses(3, Duration::from_secs(10));
        assert!(check_feasible(&plan, Duration::from_secs(20)).is_ok());
    }

    #[test]
    fn zero_pause_is_always_feasible() {
        let plan = plan_with_pauses(10, Duration::ZERO);
        assert!(check_feasible(&plan, Duration::ZERO).is_ok());
    }

    #[test]
    fn empty_plan_is_feasible() {
        let plan = BatchPlan {
            churn: ChurnKind::Replace,
            batches: vec![],
        };
        assert!(check_feasible(&plan, Duration::ZERO).is_ok());
    }
}
