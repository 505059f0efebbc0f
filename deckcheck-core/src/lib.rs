//! Deckcheck Core
//!
//! Core types shared by the deckcheck client, controller and CLI.
//!
//! This crate contains:
//! - Domain types: the analysis Job, its lifecycle Phase and the upload
//! - DTOs: wire shapes of the analysis server's JSON responses

pub mod domain;
pub mod dto;
