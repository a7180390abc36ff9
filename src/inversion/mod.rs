//! Inversion controller: outer-loop orchestration, beta scheduling, and
//! termination for the regularized Gauss-Newton inversion.

pub mod config;
pub mod controller;

pub use config::InversionConfig;
pub use controller::{Inversion, InversionOutcome, IterationRecord, TerminationStatus};
