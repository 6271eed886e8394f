//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations, persistence and derived views.
//! - Keep UI/CLI layers decoupled from storage details.

pub mod planner_service;
