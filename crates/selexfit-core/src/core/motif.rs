use super::constants::RT;
use super::energy::{EnergyModel, ModelError};
use super::occupancy::logit;
use super::utils::roots::{self, RootError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Probability floor applied before the logit transform so that degenerate
/// PWM entries (0 or 1) stay finite.
const PROB_FLOOR: f64 = 1e-3;

/// Bisection bracket for the global energy rescaling factor.
const SCALE_BRACKET: (f64, f64) = (1e-1, 1e6);
const SCALE_XTOL: f64 = 1e-9;

/// Below this raw mean offset the PWM is treated as flat and the rescaling
/// step is skipped (any scale satisfies the mean-energy constraint).
const FLAT_PWM_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum PwmError {
    #[error("PWM must contain at least one position")]
    Empty,

    #[error("PWM row {row} has {len} entries, expected 4")]
    RowLength { row: usize, len: usize },

    #[error("PWM row {row} contains the negative probability {value}")]
    NegativeProbability { row: usize, value: f64 },

    #[error("PWM row {row} has no positive probability mass")]
    DegenerateRow { row: usize },

    #[error("Energy rescaling root not bracketed: {0}")]
    ScaleNotBracketed(#[from] RootError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Thermodynamic calibration targets for PWM-derived models. Raw PWM
/// probabilities carry no energy scale, so the model is anchored to a
/// physically plausible mean binding energy instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PwmOptions {
    /// Desired mean binding energy over uniform random sequences, kcal/mol.
    pub target_mean_energy: f64,
    /// Gap between the mean and the consensus energy, kcal/mol per motif
    /// position; the consensus baseline is
    /// `target_mean_energy - consensus_gap_per_base * motif_len`.
    pub consensus_gap_per_base: f64,
}

impl Default for PwmOptions {
    fn default() -> Self {
        Self {
            target_mean_energy: -2.0,
            consensus_gap_per_base: 1.5,
        }
    }
}

/// A position weight matrix with its pass-through metadata. Rows are treated
/// as proportions and normalized on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pwm {
    pub name: String,
    pub factor: String,
    probabilities: Vec<[f64; 4]>,
}

impl Pwm {
    pub fn new(
        name: impl Into<String>,
        factor: impl Into<String>,
        rows: Vec<[f64; 4]>,
    ) -> Result<Self, PwmError> {
        if rows.is_empty() {
            return Err(PwmError::Empty);
        }
        let mut probabilities = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            if let Some(&value) = row.iter().find(|&&p| p < 0.0) {
                return Err(PwmError::NegativeProbability { row: i, value });
            }
            let total: f64 = row.iter().sum();
            if total <= 0.0 {
                return Err(PwmError::DegenerateRow { row: i });
            }
            probabilities.push([
                row[0] / total,
                row[1] / total,
                row[2] / total,
                row[3] / total,
            ]);
        }
        Ok(Self {
            name: name.into(),
            factor: factor.into(),
            probabilities,
        })
    }

    /// Builds a PWM from unchecked row vectors, validating row lengths.
    pub fn try_from_rows(
        name: impl Into<String>,
        factor: impl Into<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, PwmError> {
        let mut fixed = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let arr: [f64; 4] = row
                .try_into()
                .map_err(|bad: Vec<f64>| PwmError::RowLength { row: i, len: bad.len() })?;
            fixed.push(arr);
        }
        Pwm::new(name, factor, fixed)
    }

    pub fn motif_len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn probabilities(&self) -> &[[f64; 4]] {
        &self.probabilities
    }

    /// Converts the PWM into a calibrated [`EnergyModel`].
    ///
    /// Per position, base energies are `-logit` of the floored probability;
    /// the row minimum is subtracted so the consensus base sits at zero. The
    /// whole table is then rescaled by a factor solved by bisection so that
    /// the mean binding energy over uniform sequences equals the configured
    /// target, and converted to kcal/mol through `R·T`. A flat PWM skips the
    /// rescale and degenerates to all-zero offsets at the consensus baseline.
    pub fn to_energy_model(&self, options: &PwmOptions) -> Result<EnergyModel, PwmError> {
        let motif_len = self.motif_len();
        let baseline = options.target_mean_energy
            - options.consensus_gap_per_base * motif_len as f64;

        // Min-normalized logit energies per row; consensus base at 0.
        let mut normalized = Vec::with_capacity(motif_len);
        let mut mean_offset = 0.0;
        for row in &self.probabilities {
            let energies: [f64; 4] = std::array::from_fn(|b| {
                -logit(PROB_FLOOR / 2.0 + (1.0 - PROB_FLOOR) * row[b])
            });
            let row_min = energies.iter().copied().fold(f64::INFINITY, f64::min);
            let shifted: [f64; 4] = std::array::from_fn(|b| energies[b] - row_min);
            mean_offset += shifted.iter().sum::<f64>() / 4.0;
            normalized.push(shifted);
        }

        let unit = if mean_offset < FLAT_PWM_EPSILON {
            RT
        } else {
            let target = options.target_mean_energy;
            let scale = roots::bisect(
                |s| baseline + RT * mean_offset / s - target,
                SCALE_BRACKET.0,
                SCALE_BRACKET.1,
                SCALE_XTOL,
            )?;
            RT / scale
        };

        let mut reference_energy = baseline;
        let mut offsets = Vec::with_capacity(3 * motif_len);
        for row in &normalized {
            reference_energy += row[0] * unit;
            for rank in 1..4 {
                offsets.push((row[rank] - row[0]) * unit);
            }
        }

        Ok(EnergyModel::new(reference_energy, offsets)?)
    }
}
