//! Log-parameter transform between optimizer space and physical space.
//!
//! The optimizer works on an unconstrained vector of length `2L - 1`: the
//! log-resistivities of all `L` layers followed by the log-thicknesses of the
//! top `L - 1` layers. Exponentiating per block guarantees the forward
//! operator only ever sees strictly positive resistivities and thicknesses.

use ndarray::{s, Array1};

use crate::error::{Result, VesInvError};
use crate::model::LayeredModel;

/// Bijective map between the optimizer vector and a [`LayeredModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogMap {
    n_layers: usize,
}

impl LogMap {
    pub fn new(n_layers: usize) -> Result<Self> {
        if n_layers == 0 {
            return Err(VesInvError::Configuration(
                "transform requires at least one layer".to_string(),
            ));
        }
        Ok(Self { n_layers })
    }

    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    /// Length of the optimizer vector: `2L - 1`.
    pub fn n_params(&self) -> usize {
        2 * self.n_layers - 1
    }

    fn check_len(&self, m: &Array1<f64>) -> Result<()> {
        if m.len() != self.n_params() {
            return Err(VesInvError::DimensionMismatch(format!(
                "expected model vector of length {}, got {}",
                self.n_params(),
                m.len()
            )));
        }
        Ok(())
    }

    /// Split the optimizer vector into blocks and exponentiate each.
    ///
    /// # Errors
    ///
    /// `Numerical` if any exponentiated entry is non-positive or non-finite
    /// (e.g. log-parameter overflow).
    pub fn apply(&self, m: &Array1<f64>) -> Result<LayeredModel> {
        self.check_len(m)?;
        let rho = m.slice(s![..self.n_layers]).mapv(f64::exp);
        let thick = m.slice(s![self.n_layers..]).mapv(f64::exp);
        LayeredModel::new(rho, thick)
    }

    /// Map a physical model back to the optimizer vector.
    pub fn invert(&self, model: &LayeredModel) -> Result<Array1<f64>> {
        if model.n_layers() != self.n_layers {
            return Err(VesInvError::DimensionMismatch(format!(
                "expected {} layers, got {}",
                self.n_layers,
                model.n_layers()
            )));
        }
        let mut m = Array1::zeros(self.n_params());
        for (i, &rho) in model.resistivities().iter().enumerate() {
            m[i] = rho.ln();
        }
        for (j, &t) in model.thicknesses().iter().enumerate() {
            m[self.n_layers + j] = t.ln();
        }
        Ok(m)
    }

    /// Diagonal of the transform derivative `d exp(m) / dm`, which by the
    /// exponential's derivative identity equals the transformed vector
    /// itself.
    pub fn deriv(&self, m: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_len(m)?;
        let d = m.mapv(f64::exp);
        if d.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(VesInvError::Numerical(
                "transform derivative is non-finite or non-positive".to_string(),
            ));
        }
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_round_trip() {
        let map = LogMap::new(3).unwrap();
        let m = array![4.6, 2.3, 4.6, 3.0, 3.0];
        let model = map.apply(&m).unwrap();
        let back = map.invert(&model).unwrap();
        for (a, b) in m.iter().zip(back.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_apply_splits_blocks() {
        let map = LogMap::new(2).unwrap();
        let m = array![100.0_f64.ln(), 10.0_f64.ln(), 20.0_f64.ln()];
        let model = map.apply(&m).unwrap();
        assert_relative_eq!(model.resistivities()[0], 100.0, epsilon = 1e-10);
        assert_relative_eq!(model.resistivities()[1], 10.0, epsilon = 1e-10);
        assert_relative_eq!(model.thicknesses()[0], 20.0, epsilon = 1e-10);
    }

    #[test]
    fn test_deriv_equals_output() {
        let map = LogMap::new(2).unwrap();
        let m = array![1.5, -0.5, 0.7];
        let d = map.deriv(&m).unwrap();
        for (di, mi) in d.iter().zip(m.iter()) {
            assert_relative_eq!(*di, mi.exp(), epsilon = 1e-14);
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let map = LogMap::new(3).unwrap();
        let m = array![1.0, 2.0, 3.0];
        assert!(matches!(
            map.apply(&m),
            Err(crate::error::VesInvError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_overflow_rejected() {
        let map = LogMap::new(1).unwrap();
        let m = array![1e4];
        assert!(matches!(
            map.apply(&m),
            Err(crate::error::VesInvError::Numerical(_))
        ));
    }
}
