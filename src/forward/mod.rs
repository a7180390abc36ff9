//! Layered-earth DC resistivity forward modeling.
//!
//! The forward operator maps a [`LayeredModel`](crate::model::LayeredModel)
//! to predicted voltages or apparent resistivities for a fixed survey, and
//! provides the analytic Jacobian used by the Gauss-Newton optimizer.

pub mod filter;
pub mod kernel;
pub mod simulation;

pub use filter::HankelFilter;
pub use kernel::{transform, transform_with_sensitivities, KernelSensitivity};
pub use simulation::{DataType, Simulation1d};
