//! # Resonance Common
//!
//! Shared identifiers and error types for the Resonance combat core.
//!
//! This crate provides foundational types used across all Resonance crates:
//! - ID types (UnitId, EnemyUid, SkillId, etc.)
//! - The error taxonomy (content, command, config)
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;
