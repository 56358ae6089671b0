//! strato-rollout — policy-driven rolling updates for autoscaling groups.
//!
//! When a group's definition changes, this crate decides whether and
//! how to replace or adjust its members without violating availability
//! and time constraints: validate the update policy, classify the
//! change, plan bounded batches, prove the plan fits the stack's
//! remaining timeout, then execute batch by batch with the load
//! balancer kept consistent at every boundary.
//!
//! # Components
//!
//! - **`plan`** — batch/timing computation (size, remainder, pauses)
//! - **`timeout`** — feasibility pre-check against the stack timeout
//! - **`clients`** — compute and load-balancer collaborator contracts
//! - **`executor`** — batch execution, create-before-destroy ordering
//! - **`updater`** — the validate → diff → plan → guard → execute driver

pub mod clients;
pub mod error;
pub mod executor;
pub mod plan;
pub mod timeout;
pub mod updater;

pub use clients::{
    InstanceClient, InstanceHandle, LoadBalancerClient, MemberEndpoint, NoLoadBalancer,
    RESIZE_PENDING_STATUS,
};
pub use error::{RolloutError, RolloutResult};
pub use executor::{BatchStats, GroupUpdateExecutor};
pub use plan::{Batch, BatchPlan};
pub use timeout::check_feasible;
pub use updater::{GroupUpdater, UpdateOutcome, UpdateRequest};
