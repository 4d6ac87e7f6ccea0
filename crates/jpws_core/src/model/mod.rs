//! Domain model for password records and their display decorations.
//!
//! # Responsibility
//! - Define the record shape, header fields and recency lists.
//! - Provide the sortable wrapper consumed by the ordered list.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - Wrapper identity is record identity.

pub mod header;
pub mod recent;
pub mod record;
pub mod wrapper;
