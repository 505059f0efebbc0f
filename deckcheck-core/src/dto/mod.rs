//! Data Transfer Objects for the analysis server API
//!
//! Lightweight representations of the JSON bodies returned by the
//! create-job and poll-status endpoints.

pub mod job;
