//! redb table definitions for the Strato state store.
//!
//! Tables use `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Group records are keyed by `{stack}/{group}`.

use redb::TableDefinition;

/// Group records keyed by `{stack}/{group}`.
pub const GROUPS: TableDefinition<&str, &[u8]> = TableDefinition::new("groups");
