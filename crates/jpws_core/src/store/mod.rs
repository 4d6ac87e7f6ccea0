//! In-memory record store boundary.
//!
//! # Responsibility
//! - Hold the authoritative record set and header of one open database.
//! - Signal duplicate and missing-record conditions as typed errors.
//!
//! # Invariants
//! - Mutations are synchronous and in-memory.
//! - Every successful mutation marks the store modified.

mod record_list;

pub use record_list::{RecordList, StoreError, StoreResult};
