//! Configuration record for an inversion run.
//!
//! Every recognized option is an explicit field, validated at construction;
//! unknown options are unrepresentable.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VesInvError};
use crate::forward::DataType;

/// Configuration options for the inversion controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InversionConfig {
    /// Unit convention of predicted data and residuals.
    /// Default: ApparentResistivity
    pub data_type: DataType,

    /// Smallness weight on the resistivity block. Default: 1.0
    pub alpha_s_rho: f64,

    /// Smoothness weight on the resistivity block. Default: 1e-4
    pub alpha_x_rho: f64,

    /// Smallness weight on the thickness block. Default: 1.0
    pub alpha_s_t: f64,

    /// Smoothness weight on the thickness block. Default: 1e-2
    pub alpha_x_t: f64,

    /// Scale applied to the eigenvalue ratio when estimating the initial
    /// beta. Default: 10.0
    pub beta0_ratio: f64,

    /// Factor beta is divided by at each cooling event. Default: 5.0
    pub cooling_factor: f64,

    /// Number of outer iterations between cooling events. Default: 3
    pub cooling_rate: usize,

    /// Target chi-factor: the run stops once `φ_d ≤ chi_factor · N_d`.
    /// Default: 1.0
    pub chi_factor: f64,

    /// Maximum number of outer iterations. Default: 50
    pub max_outer_iters: usize,

    /// Inner CG iteration budget per outer iteration. Default: 30
    pub max_cg_iters: usize,
}

impl Default for InversionConfig {
    fn default() -> Self {
        Self {
            data_type: DataType::ApparentResistivity,
            alpha_s_rho: 1.0,
            alpha_x_rho: 1e-4,
            alpha_s_t: 1.0,
            alpha_x_t: 1e-2,
            beta0_ratio: 10.0,
            cooling_factor: 5.0,
            cooling_rate: 3,
            chi_factor: 1.0,
            max_outer_iters: 50,
            max_cg_iters: 30,
        }
    }
}

impl InversionConfig {
    /// Validate the configuration before any iteration runs.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("alpha_s_rho", self.alpha_s_rho),
            ("alpha_x_rho", self.alpha_x_rho),
            ("alpha_s_t", self.alpha_s_t),
            ("alpha_x_t", self.alpha_x_t),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(VesInvError::Configuration(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        if !self.beta0_ratio.is_finite() || self.beta0_ratio <= 0.0 {
            return Err(VesInvError::Configuration(format!(
                "beta0_ratio must be positive, got {}",
                self.beta0_ratio
            )));
        }
        if !self.cooling_factor.is_finite() || self.cooling_factor <= 1.0 {
            return Err(VesInvError::Configuration(format!(
                "cooling_factor must be greater than 1, got {}",
                self.cooling_factor
            )));
        }
        if self.cooling_rate == 0 {
            return Err(VesInvError::Configuration(
                "cooling_rate must be at least 1".to_string(),
            ));
        }
        if !self.chi_factor.is_finite() || self.chi_factor <= 0.0 {
            return Err(VesInvError::Configuration(format!(
                "chi_factor must be positive, got {}",
                self.chi_factor
            )));
        }
        if self.max_outer_iters == 0 {
            return Err(VesInvError::Configuration(
                "max_outer_iters must be at least 1".to_string(),
            ));
        }
        if self.max_cg_iters == 0 {
            return Err(VesInvError::Configuration(
                "max_cg_iters must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(InversionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_cooling_factor_rejected() {
        let config = InversionConfig {
            cooling_factor: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VesInvError::Configuration(_))
        ));
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let config = InversionConfig {
            alpha_x_t: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VesInvError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = InversionConfig {
            max_outer_iters: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VesInvError::Configuration(_))
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = InversionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"apparent_resistivity\""));
        let back: InversionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_outer_iters, config.max_outer_iters);
    }
}
