//! Persistence collaborators for the content store.
//!
//! # Responsibility
//! - Define the load/save contract the service layer depends on.
//! - Isolate SQLite details from store and scheduling logic.
//!
//! # Invariants
//! - Repository reads validate every record before handing out a snapshot.
//! - Repository writes are whole-snapshot and atomic.

pub mod snapshot_repo;
