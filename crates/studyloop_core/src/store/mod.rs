//! In-memory content store.
//!
//! # Responsibility
//! - Hold topics, units and the practice journal as versioned snapshots.
//! - Expose the only mutation paths for that state.

pub mod content_store;
mod seed;

pub use content_store::{
    ContentStore, SnapshotParts, StoreError, StoreResult, StoreSnapshot, TopicProgress,
};
pub use seed::seed_topics;
