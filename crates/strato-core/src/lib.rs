//! strato-core — shared types for the Strato rolling-update engine.
//!
//! Holds everything the update pipeline agrees on before any instance
//! is touched: the ISO 8601 pause-time grammar, rolling-update policy
//! validation, snippet accessors, and the structural template differ.
//!
//! # Components
//!
//! - **`duration`** — ISO 8601 duration subset (`PnDTnHnMnS`)
//! - **`policy`** — `AutoScalingRollingUpdate` validation and defaults
//! - **`snippet`** — resolved-snippet accessors and launch fingerprints
//! - **`diff`** — top-level structural diff and churn classification

pub mod diff;
pub mod duration;
pub mod error;
pub mod policy;
pub mod snippet;

pub use diff::{ChangeClassification, ChurnKind, classify_launch_change, diff_snippets};
pub use duration::IsoDuration;
pub use error::{ValidationError, ValidationResult};
pub use policy::{ROLLING_UPDATE_KEY, RollingUpdatePolicy};
pub use snippet::{GroupProperties, launch_config_fingerprint};
