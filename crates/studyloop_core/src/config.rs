//! Planner configuration.
//!
//! # Responsibility
//! - Hold tunables for scheduling, session generation and dashboard limits.
//! - Validate them once so downstream code can rely on the shape.
//!
//! # Invariants
//! - `review_offsets_days` is non-empty, strictly ascending and starts >= 1.
//! - `initial_spread_days >= 1`, `default_estimated_minutes >= 1`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Spaced-repetition breakpoints, in days since last study.
pub const DEFAULT_REVIEW_OFFSETS_DAYS: [u32; 5] = [1, 3, 7, 14, 30];

/// Which units a mixed/interleaved session samples from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterleavePool {
    /// Units not yet studied. Practice pushes new material forward.
    #[default]
    Incomplete,
    /// Units already studied at least once. Practice revisits material.
    Studied,
}

/// Configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyReviewOffsets,
    /// Offsets must be >= 1 and strictly ascending; carries the bad index.
    InvalidReviewOffset { index: usize, value: u32 },
    ZeroSpreadDays,
    ZeroDefaultMinutes,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyReviewOffsets => write!(f, "review_offsets_days must not be empty"),
            Self::InvalidReviewOffset { index, value } => write!(
                f,
                "review_offsets_days[{index}] = {value} must be >= 1 and greater than the previous offset"
            ),
            Self::ZeroSpreadDays => write!(f, "initial_spread_days must be >= 1"),
            Self::ZeroDefaultMinutes => write!(f, "default_estimated_minutes must be >= 1"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub review_offsets_days: Vec<u32>,
    /// Days over which never-studied units are spread in the calendar.
    pub initial_spread_days: u32,
    /// Estimate assigned to units added without one.
    pub default_estimated_minutes: u32,
    pub micro_win_minutes: u32,
    pub short_win_minutes: u32,
    pub calendar_preview_sessions: usize,
    pub review_preview_limit: usize,
    pub interleave_pool: InterleavePool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            review_offsets_days: DEFAULT_REVIEW_OFFSETS_DAYS.to_vec(),
            initial_spread_days: 7,
            default_estimated_minutes: 5,
            micro_win_minutes: 5,
            short_win_minutes: 15,
            calendar_preview_sessions: 7,
            review_preview_limit: 5,
            interleave_pool: InterleavePool::Incomplete,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.review_offsets_days.is_empty() {
            return Err(ConfigError::EmptyReviewOffsets);
        }

        let mut previous = 0;
        for (index, &value) in self.review_offsets_days.iter().enumerate() {
            if value <= previous {
                return Err(ConfigError::InvalidReviewOffset { index, value });
            }
            previous = value;
        }

        if self.initial_spread_days == 0 {
            return Err(ConfigError::ZeroSpreadDays);
        }
        if self.default_estimated_minutes == 0 {
            return Err(ConfigError::ZeroDefaultMinutes);
        }
        Ok(())
    }
}
