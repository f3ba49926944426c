//! Core type definitions for the Wardlink device agent.
//!
//! Shared between the store and agent crates:
//! - **Command**: a server-issued instruction delivered on poll
//! - **EnrollmentFlags**: the persisted progress record of the enrollment
//!   workflow, from which the current step is always derived

mod command;
mod flags;

pub use command::{Command, CommandKind};
pub use flags::{EnrollmentFlags, EnrollmentStep};
