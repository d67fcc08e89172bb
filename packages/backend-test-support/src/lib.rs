//! Test support utilities for the user service
//!
//! Shared helpers for unit and integration tests: unified logging
//! initialization, unique test data, and problem-details assertions.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
