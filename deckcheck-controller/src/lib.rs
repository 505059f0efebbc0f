//! Deckcheck Controller
//!
//! Client-side lifecycle of a pitch-deck analysis job.
//!
//! Architecture:
//! - Configuration: poll interval and upload limits, from environment or defaults
//! - View: the rendering collaborator the controller reports every state to
//! - Controller: the job state machine, its poll timer and its cancellation rules
//!
//! A single `JobController` owns the active job and the poll timer. It moves
//! through `Idle -> Submitting -> Polling -> (Completed | Failed)` and can be
//! reset to `Idle` from any phase.

pub mod config;
pub mod controller;
pub mod error;
pub mod view;

pub use config::ControllerConfig;
pub use controller::JobController;
pub use error::{ControllerError, Result};
pub use view::View;
