//! Web-boundary helpers shared by middleware and error rendering.

pub mod trace_ctx;
