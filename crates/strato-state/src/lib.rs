//! strato-state — embedded state store for Strato groups.
//!
//! Backed by [redb](https://docs.rs/redb), holds the persisted surface
//! of each autoscaling group: its validated update policy, the resolved
//! definition it was last reconciled to, and its member list, which is
//! the diffing baseline for the next update.
//!
//! Records are JSON-serialized into redb's `&[u8]` value columns under
//! `{stack}/{group}` keys. The `StateStore` is `Clone` + `Send` + `Sync`
//! (backed by `Arc<Database>`) and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
