//! Smallness + smoothness regularization over blocks of the model vector.
//!
//! Each block (resistivities, thicknesses) carries its own smallness weight
//! `α_s` and first-derivative smoothness weight `α_x`, because the two
//! parameter types have different natural scales and smoothness behavior:
//!
//! `φ_m(x) = α_s ‖x − x_ref‖² + α_x ‖D (x − x_ref)‖²`
//!
//! with `D` the first-difference operator between adjacent cells. Blocks are
//! summed additively into the total regularization term; the quadratic form
//! has a constant positive-semidefinite Hessian.

use ndarray::{s, Array1, Array2};

use crate::error::{Result, VesInvError};
use crate::objective::{ObjectiveTerm, TermEval};

/// Smallness + smoothness penalty on one contiguous block of the model
/// vector, addressed by a fixed index offset.
#[derive(Debug, Clone)]
pub struct BlockRegularization {
    offset: usize,
    len: usize,
    n_params: usize,
    alpha_s: f64,
    alpha_x: f64,
    m_ref: Array1<f64>,
}

impl BlockRegularization {
    pub fn new(
        offset: usize,
        len: usize,
        n_params: usize,
        alpha_s: f64,
        alpha_x: f64,
    ) -> Result<Self> {
        if len == 0 || offset + len > n_params {
            return Err(VesInvError::Configuration(format!(
                "regularization block [{}, {}) does not fit in {} parameters",
                offset,
                offset + len,
                n_params
            )));
        }
        if !alpha_s.is_finite() || !alpha_x.is_finite() || alpha_s < 0.0 || alpha_x < 0.0 {
            return Err(VesInvError::Configuration(format!(
                "regularization weights must be finite and non-negative, got alpha_s = {}, alpha_x = {}",
                alpha_s, alpha_x
            )));
        }
        if alpha_s == 0.0 && alpha_x == 0.0 {
            return Err(VesInvError::Configuration(
                "regularization block has both weights zero".to_string(),
            ));
        }
        Ok(Self {
            offset,
            len,
            n_params,
            alpha_s,
            alpha_x,
            m_ref: Array1::zeros(len),
        })
    }

    /// Set the block's reference values from a full-length model vector.
    pub fn set_reference(&mut self, m_ref: &Array1<f64>) -> Result<()> {
        if m_ref.len() != self.n_params {
            return Err(VesInvError::DimensionMismatch(format!(
                "expected reference model of length {}, got {}",
                self.n_params,
                m_ref.len()
            )));
        }
        self.m_ref = m_ref
            .slice(s![self.offset..self.offset + self.len])
            .to_owned();
        Ok(())
    }

    fn block_of<'a>(&self, m: &'a Array1<f64>) -> Result<ndarray::ArrayView1<'a, f64>> {
        if m.len() != self.n_params {
            return Err(VesInvError::DimensionMismatch(format!(
                "expected model vector of length {}, got {}",
                self.n_params,
                m.len()
            )));
        }
        Ok(m.slice(s![self.offset..self.offset + self.len]))
    }
}

impl ObjectiveTerm for BlockRegularization {
    fn n_params(&self) -> usize {
        self.n_params
    }

    fn evaluate(&self, m: &Array1<f64>) -> Result<TermEval> {
        let x = self.block_of(m)?;
        let dx = &x - &self.m_ref;

        let mut value = self.alpha_s * dx.iter().map(|v| v * v).sum::<f64>();
        let mut grad_block = 2.0 * self.alpha_s * &dx;

        // First-difference smoothness between adjacent cells; a single-cell
        // block has no differences.
        for i in 0..self.len.saturating_sub(1) {
            let d = dx[i + 1] - dx[i];
            value += self.alpha_x * d * d;
            grad_block[i] -= 2.0 * self.alpha_x * d;
            grad_block[i + 1] += 2.0 * self.alpha_x * d;
        }

        let mut gradient = Array1::zeros(self.n_params);
        gradient
            .slice_mut(s![self.offset..self.offset + self.len])
            .assign(&grad_block);

        let mut hessian = Array2::zeros((self.n_params, self.n_params));
        for i in 0..self.len {
            hessian[[self.offset + i, self.offset + i]] += 2.0 * self.alpha_s;
        }
        for i in 0..self.len.saturating_sub(1) {
            let a = self.offset + i;
            let b = a + 1;
            hessian[[a, a]] += 2.0 * self.alpha_x;
            hessian[[b, b]] += 2.0 * self.alpha_x;
            hessian[[a, b]] -= 2.0 * self.alpha_x;
            hessian[[b, a]] -= 2.0 * self.alpha_x;
        }

        Ok(TermEval {
            value,
            gradient,
            hessian,
        })
    }

    fn value(&self, m: &Array1<f64>) -> Result<f64> {
        let x = self.block_of(m)?;
        let dx = &x - &self.m_ref;
        let mut value = self.alpha_s * dx.iter().map(|v| v * v).sum::<f64>();
        for i in 0..self.len.saturating_sub(1) {
            let d = dx[i + 1] - dx[i];
            value += self.alpha_x * d * d;
        }
        Ok(value)
    }
}

/// Additive composite of the per-block penalties.
#[derive(Debug, Clone)]
pub struct Regularization {
    blocks: Vec<BlockRegularization>,
    n_params: usize,
}

impl Regularization {
    /// The standard two-block layout for a layered model: resistivities at
    /// offset 0, thicknesses at offset L. A half-space-only model has no
    /// thickness block at all.
    pub fn layered(
        n_layers: usize,
        alpha_s_rho: f64,
        alpha_x_rho: f64,
        alpha_s_t: f64,
        alpha_x_t: f64,
    ) -> Result<Self> {
        if n_layers == 0 {
            return Err(VesInvError::Configuration(
                "regularization requires at least one layer".to_string(),
            ));
        }
        let n_params = 2 * n_layers - 1;
        let mut blocks = vec![BlockRegularization::new(
            0,
            n_layers,
            n_params,
            alpha_s_rho,
            alpha_x_rho,
        )?];
        if n_layers > 1 {
            blocks.push(BlockRegularization::new(
                n_layers,
                n_layers - 1,
                n_params,
                alpha_s_t,
                alpha_x_t,
            )?);
        }
        Ok(Self { blocks, n_params })
    }

    /// Set the reference model for every block.
    pub fn set_reference(&mut self, m_ref: &Array1<f64>) -> Result<()> {
        for block in &mut self.blocks {
            block.set_reference(m_ref)?;
        }
        Ok(())
    }

    pub fn blocks(&self) -> &[BlockRegularization] {
        &self.blocks
    }
}

impl ObjectiveTerm for Regularization {
    fn n_params(&self) -> usize {
        self.n_params
    }

    fn evaluate(&self, m: &Array1<f64>) -> Result<TermEval> {
        let mut total = TermEval {
            value: 0.0,
            gradient: Array1::zeros(self.n_params),
            hessian: Array2::zeros((self.n_params, self.n_params)),
        };
        for block in &self.blocks {
            let eval = block.evaluate(m)?;
            total.value += eval.value;
            total.gradient += &eval.gradient;
            total.hessian += &eval.hessian;
        }
        Ok(total)
    }

    fn value(&self, m: &Array1<f64>) -> Result<f64> {
        let mut value = 0.0;
        for block in &self.blocks {
            value += block.value(m)?;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_zero_at_reference_model() {
        let mut reg = Regularization::layered(3, 1.0, 1e-4, 1.0, 1e-2).unwrap();
        let m_ref = array![4.6, 2.3, 4.6, 3.0, 3.0];
        reg.set_reference(&m_ref).unwrap();
        assert_relative_eq!(reg.value(&m_ref).unwrap(), 0.0, epsilon = 1e-16);
        let eval = reg.evaluate(&m_ref).unwrap();
        for g in eval.gradient.iter() {
            assert_relative_eq!(*g, 0.0, epsilon = 1e-16);
        }
    }

    #[test]
    fn test_smallness_value() {
        let mut reg = Regularization::layered(2, 1.0, 0.0, 1.0, 0.0).unwrap();
        reg.set_reference(&array![0.0, 0.0, 0.0]).unwrap();
        // φ = Σ m_i² with unit smallness and no smoothness.
        let m = array![1.0, 2.0, 3.0];
        assert_relative_eq!(reg.value(&m).unwrap(), 14.0, epsilon = 1e-12);
    }

    #[test]
    fn test_smoothness_value() {
        let mut reg = Regularization::layered(3, 0.0, 1.0, 1.0, 0.0).unwrap();
        reg.set_reference(&array![0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        // Resistivity block [1, 4, 9]: differences 3 and 5 give 9 + 25.
        // Thickness block [1, 1]: pure smallness, 1 + 1.
        let m = array![1.0, 4.0, 9.0, 1.0, 1.0];
        assert_relative_eq!(reg.value(&m).unwrap(), 34.0 + 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_and_hessian_consistent() {
        let mut reg = Regularization::layered(3, 0.7, 0.3, 1.2, 0.5).unwrap();
        let m_ref = array![1.0, 1.0, 1.0, 0.5, 0.5];
        reg.set_reference(&m_ref).unwrap();

        let m = array![2.0, 0.5, 1.5, 1.0, 0.2];
        let eval = reg.evaluate(&m).unwrap();

        // Quadratic form: gradient = H (m − m_ref).
        let dm = &m - &m_ref;
        let hg = eval.hessian.dot(&dm);
        for (a, b) in eval.gradient.iter().zip(hg.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }

        // And value = ½ (m − m_ref)ᵀ H (m − m_ref).
        assert_relative_eq!(eval.value, 0.5 * dm.dot(&hg), epsilon = 1e-12);
    }

    #[test]
    fn test_halfspace_has_single_block() {
        let reg = Regularization::layered(1, 1.0, 1e-4, 1.0, 1e-2).unwrap();
        assert_eq!(reg.blocks().len(), 1);
        assert_eq!(reg.n_params(), 1);
    }

    #[test]
    fn test_both_weights_zero_rejected() {
        let result = Regularization::layered(2, 0.0, 0.0, 1.0, 1.0);
        assert!(matches!(result, Err(VesInvError::Configuration(_))));
    }
}
