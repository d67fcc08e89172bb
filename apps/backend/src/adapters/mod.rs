//! Adapters for external dependencies.

pub mod users_sea;
