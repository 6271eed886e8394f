//! Ad-hoc practice set generators.
//!
//! # Responsibility
//! - Sample store snapshots into short practice sets.
//!
//! # Invariants
//! - Generators never mutate state; randomness is injected by the caller.

pub mod interleave;
pub mod quick_wins;
pub mod quiz;

pub use interleave::{mixed_session, MixedSessionEntry};
pub use quick_wins::{quick_wins, QuickWinEntry};
pub use quiz::pick_quiz_card;
