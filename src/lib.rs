//! # vesinv
//!
//! `vesinv` inverts 1-D direct-current resistivity sounding data for a
//! layered-earth model: layer resistivities and thicknesses over a terminal
//! half-space.
//!
//! The library provides:
//! - A semi-analytic forward operator for arbitrary four-electrode surface
//!   arrays (apparent resistivity or voltage data)
//! - Analytic sensitivities propagated through the layered-earth recursion
//! - A damped Gauss-Newton inversion with log-parameter positivity, truncated
//!   conjugate-gradient steps, and an adaptive beta cooling schedule
//! - Synthetic data generation for testing and survey design
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use vesinv::{Inversion, InversionConfig, LogMap, Survey};
//!
//! # fn main() -> vesinv::Result<()> {
//! // Wenner sounding with four electrode spacings.
//! let survey = Survey::wenner(&[10.0, 20.0, 40.0, 80.0])?;
//! let d_obs = Array1::from(vec![95.0, 70.0, 40.0, 25.0]);
//! let uncertainties = d_obs.mapv(|v: f64| 0.025 * v.abs());
//!
//! // Invert for a three-layer model from a homogeneous start.
//! let n_layers = 3;
//! let mut inversion = Inversion::new(
//!     InversionConfig::default(),
//!     survey,
//!     d_obs,
//!     uncertainties,
//!     n_layers,
//! )?;
//! let m0 = Array1::from_elem(LogMap::new(n_layers)?.n_params(), 50.0f64.ln());
//! let outcome = inversion.run(m0)?;
//! println!("{:?}: phi_d = {:.2}", outcome.status, outcome.phi_d);
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod error;
pub mod forward;
pub mod inversion;
pub mod misfit;
pub mod model;
pub mod objective;
pub mod optimizer;
pub mod regularization;
pub mod survey;
pub mod synthetic;
pub mod transform;
pub mod utils;

// Re-exports for convenience
pub use error::{Result, VesInvError};
pub use forward::{DataType, Simulation1d};
pub use inversion::{
    Inversion, InversionConfig, InversionOutcome, IterationRecord, TerminationStatus,
};
pub use misfit::DataMisfit;
pub use model::LayeredModel;
pub use objective::{ObjectiveTerm, TermEval};
pub use optimizer::InexactGaussNewton;
pub use regularization::Regularization;
pub use survey::{ElectrodeConfiguration, Survey};
pub use synthetic::{assign_uncertainties, make_synthetic_data};
pub use transform::LogMap;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
