//! Process configuration: connection-string normalization and env settings.

pub mod app;
pub mod db;
