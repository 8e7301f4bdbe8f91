//! Frame task scheduling

pub mod idle;

pub use idle::{IdleSender, IdleTaskManager};
