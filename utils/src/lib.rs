//! Shared infrastructure utilities for mjml-bridge.
//!
//! This crate provides cross-cutting utilities that more than one mjml-bridge
//! crate needs but that don't belong in the pure `mjml-types` crate:
//!
//! - **`materialize`**: Write embedded script text to a scoped temp file that is
//!   removed when the handle drops
//! - **`env`**: `${VAR}` expansion for configuration values

pub mod env;
pub mod materialize;

pub use env::{expand_env_vars, expand_with};
pub use materialize::{MaterializeOptions, MaterializedScript, PersistMode, materialize};
