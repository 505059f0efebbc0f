//! Core domain types
//!
//! These types describe an analysis job as the client sees it. They are
//! shared between the HTTP client (which produces them from responses) and
//! the controller (which owns the active job).

pub mod job;
pub mod upload;
