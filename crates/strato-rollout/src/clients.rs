//! Collaborator interfaces consumed by the update executor.
//!
//! The compute and load-balancer clients are external resources; only
//! their contracts live here. Implementations are injected by the
//! enclosing engine (and by hand-rolled fakes in tests).

use serde_json::Value;

/// Status a resized instance reports while waiting for confirmation.
pub const RESIZE_PENDING_STATUS: &str = "VERIFY_RESIZE";

/// Handle for a newly created instance, used to await activation.
#[derive(Debug, Clone)]
pub struct InstanceHandle {
    pub id: String,
    pub address: String,
    pub port: u16,
}

/// One backend entry passed to the load balancer on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEndpoint {
    pub id: String,
    pub address: String,
    pub port: u16,
}

/// Lifecycle operations on a single compute instance.
#[allow(async_fn_in_trait)]
pub trait InstanceClient {
    /// Provision an instance from the resolved launch configuration.
    async fn create(&self, launch_config: &Value) -> anyhow::Result<InstanceHandle>;

    /// Block until the instance behind `handle` reaches Active.
    /// Returns `false` if it settled in a non-active state instead.
    async fn await_active(&self, handle: &InstanceHandle) -> anyhow::Result<bool>;

    async fn destroy(&self, id: &str) -> anyhow::Result<()>;

    /// Begin an in-place flavor adjustment.
    async fn resize(&self, id: &str, flavor: &str) -> anyhow::Result<()>;

    /// Commit a resize the instance reports as pending.
    async fn confirm_resize(&self, id: &str) -> anyhow::Result<()>;

    /// Current lifecycle status string as reported by the compute service.
    async fn get_status(&self, id: &str) -> anyhow::Result<String>;
}

/// Membership reload on the group's load-balancer collaborator.
///
/// Called exactly once per batch boundary with the group's current
/// members; implementations must be idempotent.
#[allow(async_fn_in_trait)]
pub trait LoadBalancerClient {
    async fn reload(&self, members: &[MemberEndpoint]) -> anyhow::Result<()>;
}

/// Placeholder balancer for groups without a load-balancer resource.
pub struct NoLoadBalancer;

impl LoadBalancerClient for NoLoadBalancer {
    async fn reload(&self, _members: &[MemberEndpoint]) -> anyhow::Result<()> {
        Ok(())
    }
}
