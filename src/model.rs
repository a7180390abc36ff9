//! The physical layered-earth model.

use ndarray::Array1;

use crate::error::{Result, VesInvError};

/// A 1D layered-earth resistivity model.
///
/// The model has `L` layer resistivities in Ohm-metres and `L - 1` layer
/// thicknesses in metres. The bottom layer is a half-space of infinite
/// thickness and carries no thickness parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredModel {
    resistivities: Array1<f64>,
    thicknesses: Array1<f64>,
}

impl LayeredModel {
    /// Create a layered model, validating shape and positivity.
    ///
    /// # Errors
    ///
    /// * `Configuration` if `thicknesses.len() + 1 != resistivities.len()`.
    /// * `Numerical` if any resistivity or thickness is non-positive or
    ///   non-finite.
    pub fn new(resistivities: Array1<f64>, thicknesses: Array1<f64>) -> Result<Self> {
        if resistivities.is_empty() {
            return Err(VesInvError::Configuration(
                "model must have at least one layer".to_string(),
            ));
        }
        if thicknesses.len() + 1 != resistivities.len() {
            return Err(VesInvError::Configuration(format!(
                "expected {} thicknesses for {} layers, got {}",
                resistivities.len() - 1,
                resistivities.len(),
                thicknesses.len()
            )));
        }
        for (i, &rho) in resistivities.iter().enumerate() {
            if !rho.is_finite() || rho <= 0.0 {
                return Err(VesInvError::Numerical(format!(
                    "layer {} resistivity is {} (must be finite and positive)",
                    i, rho
                )));
            }
        }
        for (i, &t) in thicknesses.iter().enumerate() {
            if !t.is_finite() || t <= 0.0 {
                return Err(VesInvError::Numerical(format!(
                    "layer {} thickness is {} (must be finite and positive)",
                    i, t
                )));
            }
        }
        Ok(Self {
            resistivities,
            thicknesses,
        })
    }

    /// A homogeneous model of `n_layers` equal layers, useful as a starting
    /// guess.
    pub fn homogeneous(rho: f64, n_layers: usize, thickness: f64) -> Result<Self> {
        if n_layers == 0 {
            return Err(VesInvError::Configuration(
                "model must have at least one layer".to_string(),
            ));
        }
        Self::new(
            Array1::from_elem(n_layers, rho),
            Array1::from_elem(n_layers - 1, thickness),
        )
    }

    pub fn n_layers(&self) -> usize {
        self.resistivities.len()
    }

    pub fn resistivities(&self) -> &Array1<f64> {
        &self.resistivities
    }

    pub fn thicknesses(&self) -> &Array1<f64> {
        &self.thicknesses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_valid_model() {
        let model = LayeredModel::new(array![100.0, 10.0, 100.0], array![20.0, 20.0]).unwrap();
        assert_eq!(model.n_layers(), 3);
    }

    #[test]
    fn test_halfspace_model() {
        let model = LayeredModel::new(array![50.0], array![]).unwrap();
        assert_eq!(model.n_layers(), 1);
        assert!(model.thicknesses().is_empty());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = LayeredModel::new(array![100.0, 10.0], array![20.0, 20.0]);
        assert!(matches!(
            result,
            Err(crate::error::VesInvError::Configuration(_))
        ));
    }

    #[test]
    fn test_nonpositive_resistivity_rejected() {
        let result = LayeredModel::new(array![100.0, -10.0], array![20.0]);
        assert!(matches!(result, Err(crate::error::VesInvError::Numerical(_))));

        let result = LayeredModel::new(array![100.0, f64::NAN], array![20.0]);
        assert!(matches!(result, Err(crate::error::VesInvError::Numerical(_))));
    }

    #[test]
    fn test_nonpositive_thickness_rejected() {
        let result = LayeredModel::new(array![100.0, 10.0], array![0.0]);
        assert!(matches!(result, Err(crate::error::VesInvError::Numerical(_))));
    }
}
