//! Logging helpers.

pub mod pii;
