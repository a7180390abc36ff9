//! Survey geometry for DC resistivity soundings.
//!
//! A survey is an ordered list of current-electrode sources, each carrying an
//! ordered list of potential-electrode receivers. The receiver ordering fixes
//! the ordering of the data vector and is stable across forward evaluations.
//! Geometry is immutable for the life of an inversion run.

use crate::error::{Result, VesInvError};

/// A surface electrode location in metres.
pub type Position = [f64; 3];

fn distance(p: &Position, q: &Position) -> f64 {
    let dx = p[0] - q[0];
    let dy = p[1] - q[1];
    let dz = p[2] - q[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// A potential-electrode pair (M, N).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleReceiver {
    pub m: Position,
    pub n: Position,
}

impl DipoleReceiver {
    pub fn new(m: Position, n: Position) -> Self {
        Self { m, n }
    }
}

/// A current-electrode pair (A, B) with its receivers.
#[derive(Debug, Clone, PartialEq)]
pub struct DipoleSource {
    pub a: Position,
    pub b: Position,
    pub receivers: Vec<DipoleReceiver>,
}

impl DipoleSource {
    pub fn new(a: Position, b: Position, receivers: Vec<DipoleReceiver>) -> Self {
        Self { a, b, receivers }
    }
}

/// One four-electrode configuration, flattened out of the source/receiver
/// nesting. The flattened ordering is the data-vector ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectrodeConfiguration {
    pub a: Position,
    pub b: Position,
    pub m: Position,
    pub n: Position,
}

impl ElectrodeConfiguration {
    /// The four source-to-potential electrode separations (AM, AN, BM, BN).
    pub fn separations(&self) -> [f64; 4] {
        [
            distance(&self.a, &self.m),
            distance(&self.a, &self.n),
            distance(&self.b, &self.m),
            distance(&self.b, &self.n),
        ]
    }

    /// Geometric factor `g = 1/AM - 1/AN - 1/BM + 1/BN`.
    ///
    /// For a homogeneous half-space of resistivity rho and unit current,
    /// the measured voltage is `rho * g / (2 pi)`.
    pub fn geometric_factor(&self) -> f64 {
        let [am, an, bm, bn] = self.separations();
        1.0 / am - 1.0 / an - 1.0 / bm + 1.0 / bn
    }
}

/// An immutable DC resistivity survey.
#[derive(Debug, Clone, PartialEq)]
pub struct Survey {
    sources: Vec<DipoleSource>,
    flat: Vec<ElectrodeConfiguration>,
}

impl Survey {
    /// Create a survey from a list of sources, validating the geometry.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the survey is empty, a source has no
    /// receivers, a coordinate is non-finite, a current electrode coincides
    /// with a potential electrode, or a geometric factor vanishes.
    pub fn new(sources: Vec<DipoleSource>) -> Result<Self> {
        if sources.is_empty() {
            return Err(VesInvError::Configuration(
                "survey must contain at least one source".to_string(),
            ));
        }

        let mut flat = Vec::new();
        for (si, src) in sources.iter().enumerate() {
            if src.receivers.is_empty() {
                return Err(VesInvError::Configuration(format!(
                    "source {} has no receivers",
                    si
                )));
            }
            for rx in &src.receivers {
                let config = ElectrodeConfiguration {
                    a: src.a,
                    b: src.b,
                    m: rx.m,
                    n: rx.n,
                };
                let seps = config.separations();
                if seps.iter().any(|r| !r.is_finite()) {
                    return Err(VesInvError::Configuration(format!(
                        "source {} has a non-finite electrode coordinate",
                        si
                    )));
                }
                if seps.iter().any(|&r| r <= 0.0) {
                    return Err(VesInvError::Configuration(format!(
                        "source {} has a current electrode coincident with a potential electrode",
                        si
                    )));
                }
                let g = config.geometric_factor();
                if !g.is_finite() || g.abs() < 1e-12 {
                    return Err(VesInvError::Configuration(format!(
                        "source {} has a vanishing geometric factor",
                        si
                    )));
                }
                flat.push(config);
            }
        }

        Ok(Self { sources, flat })
    }

    /// Build a collinear Wenner-array survey along the x axis, centred on the
    /// origin, with one datum per electrode spacing.
    ///
    /// For spacing `a` the electrodes sit at A = -1.5a, M = -0.5a, N = +0.5a,
    /// B = +1.5a.
    pub fn wenner(spacings: &[f64]) -> Result<Self> {
        let sources = spacings
            .iter()
            .map(|&a| {
                let rx = DipoleReceiver::new([-0.5 * a, 0.0, 0.0], [0.5 * a, 0.0, 0.0]);
                DipoleSource::new([-1.5 * a, 0.0, 0.0], [1.5 * a, 0.0, 0.0], vec![rx])
            })
            .collect();
        Self::new(sources)
    }

    /// Build a survey from 12-column electrode rows
    /// `[ax, ay, az, bx, by, bz, mx, my, mz, nx, ny, nz]`, grouping
    /// consecutive rows that share the same (A, B) pair into one source.
    pub fn from_electrode_rows(rows: &[[f64; 12]]) -> Result<Self> {
        let mut sources: Vec<DipoleSource> = Vec::new();
        for row in rows {
            let a: Position = [row[0], row[1], row[2]];
            let b: Position = [row[3], row[4], row[5]];
            let rx = DipoleReceiver::new([row[6], row[7], row[8]], [row[9], row[10], row[11]]);
            match sources.last_mut() {
                Some(src) if src.a == a && src.b == b => src.receivers.push(rx),
                _ => sources.push(DipoleSource::new(a, b, vec![rx])),
            }
        }
        Self::new(sources)
    }

    pub fn sources(&self) -> &[DipoleSource] {
        &self.sources
    }

    /// The flattened four-electrode configurations in data-vector order.
    pub fn flat_geometry(&self) -> &[ElectrodeConfiguration] {
        &self.flat
    }

    /// Number of data predicted by this survey.
    pub fn n_data(&self) -> usize {
        self.flat.len()
    }

    /// Geometric factor per datum, in data-vector order.
    pub fn geometric_factors(&self) -> Vec<f64> {
        self.flat.iter().map(|c| c.geometric_factor()).collect()
    }

    /// |MN| electrode separation per datum, used as the abscissa of
    /// sounding curves.
    pub fn electrode_separations(&self) -> Vec<f64> {
        self.flat.iter().map(|c| distance(&c.m, &c.n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wenner_geometry() {
        let survey = Survey::wenner(&[10.0, 20.0]).unwrap();
        assert_eq!(survey.n_data(), 2);

        // Wenner geometric factor is 1/a.
        let g = survey.geometric_factors();
        assert_relative_eq!(g[0], 1.0 / 10.0, epsilon = 1e-12);
        assert_relative_eq!(g[1], 1.0 / 20.0, epsilon = 1e-12);

        let mn = survey.electrode_separations();
        assert_relative_eq!(mn[0], 10.0, epsilon = 1e-12);
        assert_relative_eq!(mn[1], 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_survey_rejected() {
        let result = Survey::new(vec![]);
        assert!(matches!(result, Err(VesInvError::Configuration(_))));
    }

    #[test]
    fn test_source_without_receivers_rejected() {
        let src = DipoleSource::new([0.0, 0.0, 0.0], [10.0, 0.0, 0.0], vec![]);
        let result = Survey::new(vec![src]);
        assert!(matches!(result, Err(VesInvError::Configuration(_))));
    }

    #[test]
    fn test_coincident_electrodes_rejected() {
        let rx = DipoleReceiver::new([0.0, 0.0, 0.0], [5.0, 0.0, 0.0]);
        let src = DipoleSource::new([0.0, 0.0, 0.0], [10.0, 0.0, 0.0], vec![rx]);
        let result = Survey::new(vec![src]);
        assert!(matches!(result, Err(VesInvError::Configuration(_))));
    }

    #[test]
    fn test_from_electrode_rows_groups_sources() {
        // Two rows with the same (A, B), one with a different pair.
        let rows = [
            [-15.0, 0.0, 0.0, 15.0, 0.0, 0.0, -5.0, 0.0, 0.0, 5.0, 0.0, 0.0],
            [-15.0, 0.0, 0.0, 15.0, 0.0, 0.0, -2.0, 0.0, 0.0, 2.0, 0.0, 0.0],
            [-30.0, 0.0, 0.0, 30.0, 0.0, 0.0, -10.0, 0.0, 0.0, 10.0, 0.0, 0.0],
        ];
        let survey = Survey::from_electrode_rows(&rows).unwrap();
        assert_eq!(survey.sources().len(), 2);
        assert_eq!(survey.sources()[0].receivers.len(), 2);
        assert_eq!(survey.n_data(), 3);
    }
}
