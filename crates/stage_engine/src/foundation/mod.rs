//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Typed identifiers and their generator
//! - Math types and operations
//! - Time management
//! - Logging utilities
//! - Per-node user data

pub mod ids;
pub mod math;
pub mod time;
pub mod logging;
pub mod user_data;
