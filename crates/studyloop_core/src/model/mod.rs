//! Domain model for study topics, units and the practice journal.
//!
//! # Responsibility
//! - Define canonical data structures used by store, scheduler and
//!   session generators.
//! - Keep record-level invariants next to the records.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Records are only appended; nothing is deleted.

pub mod practice;
pub mod topic;
