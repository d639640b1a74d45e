use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::config::PartitionConfig;
use super::error::EngineError;
use crate::core::constants::RT;
use crate::core::energy::EnergyModel;
use crate::core::occupancy::logistic;

/// Discretized distribution of binding energies over uniform random
/// sequences. `mass[k]` is the probability of the energy
/// `min_energy + k * step`; the masses sum to 1 up to floating-point error.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGrid {
    min_energy: f64,
    step: f64,
    mass: Vec<f64>,
}

impl EnergyGrid {
    pub fn min_energy(&self) -> f64 {
        self.min_energy
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    pub fn energy_at(&self, bin: usize) -> f64 {
        self.min_energy + bin as f64 * self.step
    }

    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    /// Probability-weighted mean energy of the grid.
    pub fn mean_energy(&self) -> f64 {
        self.mass
            .iter()
            .enumerate()
            .map(|(k, &m)| m * self.energy_at(k))
            .sum::<f64>()
            / self.total_mass()
    }

    /// Applies one round of selection at the given chemical potential: each
    /// bin is weighted by its Fermi occupancy and the grid is renormalized to
    /// describe the surviving pool.
    pub fn reweight(&self, chem_potential: f64) -> Result<EnergyGrid, EngineError> {
        let mut mass: Vec<f64> = self
            .mass
            .iter()
            .enumerate()
            .map(|(k, &m)| m * logistic((chem_potential - self.energy_at(k)) / RT))
            .collect();
        let total: f64 = mass.iter().sum();
        if !(total > 0.0) || !total.is_finite() {
            return Err(EngineError::NumericDegenerate(
                "selection reweighting left no probability mass".into(),
            ));
        }
        for m in &mut mass {
            *m /= total;
        }
        Ok(EnergyGrid {
            min_energy: self.min_energy,
            step: self.step,
            mass,
        })
    }
}

/// Estimates the binding energy distribution of uniform random sites by FFT
/// convolution of the per-position base-energy distributions.
///
/// Each motif position contributes a categorical distribution with mass 0.25
/// on each base energy; the distribution of their sum is the product of the
/// position polynomials in the frequency domain. The bin width is chosen so
/// the convolution support fits in `n_bins` without wraparound. For
/// `n_sites > 1` the grid is corrected to describe the minimum energy among
/// `n_sites` independent sites via the order statistic of the cumulative
/// distribution.
pub fn estimate_partition_fn(
    model: &EnergyModel,
    config: &PartitionConfig,
) -> Result<EnergyGrid, EngineError> {
    let n_bins = config.n_bins;
    let motif_len = model.motif_len();
    if !n_bins.is_power_of_two() {
        return Err(EngineError::InvalidConfiguration(format!(
            "n_bins must be a power of two, got {n_bins}"
        )));
    }
    if n_bins <= motif_len {
        return Err(EngineError::InvalidConfiguration(format!(
            "n_bins ({n_bins}) must exceed the motif length ({motif_len})"
        )));
    }

    let min_energy = model.min_energy();
    let max_energy = model.max_energy();
    let step = (max_energy - min_energy + 1e-6) / (n_bins - motif_len) as f64;

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_bins);
    let ifft = planner.plan_fft_inverse(n_bins);

    let mut product = vec![Complex::new(1.0, 0.0); n_bins];
    let mut position = vec![Complex::new(0.0, 0.0); n_bins];
    for row in model.base_contributions() {
        let row_min = row.iter().copied().fold(f64::INFINITY, f64::min);
        position.fill(Complex::new(0.0, 0.0));
        for &energy in &row {
            // Coinciding base energies accumulate in a shared bin. Rounding
            // to the nearest bin stays inside the grid: the step leaves one
            // spare bin per position.
            let bin = ((energy - row_min) / step).round() as usize;
            position[bin].re += 0.25;
        }
        fft.process(&mut position);
        for (p, q) in product.iter_mut().zip(&position) {
            *p *= *q;
        }
    }
    ifft.process(&mut product);

    // rustfft leaves the inverse transform unnormalized.
    let scale = 1.0 / n_bins as f64;
    let mut mass: Vec<f64> = product.iter().map(|c| (c.re * scale).max(0.0)).collect();

    if config.n_sites > 1 {
        apply_min_site_correction(&mut mass, config.n_sites);
    }

    let total: f64 = mass.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(EngineError::NumericDegenerate(format!(
            "partition function mass {total} deviates from 1"
        )));
    }

    Ok(EnergyGrid {
        min_energy,
        step,
        mass,
    })
}

/// Converts the single-site energy pdf into the pdf of the minimum energy
/// among `n_sites` independent sites:
/// `cdf_min = 1 - (1 - cdf)^n_sites`, differenced back to a pdf.
fn apply_min_site_correction(mass: &mut [f64], n_sites: usize) {
    let mut cumulative = 0.0;
    let mut previous = 0.0;
    for m in mass.iter_mut() {
        cumulative = (cumulative + *m).min(1.0);
        let corrected = 1.0 - (1.0 - cumulative).powi(n_sites as i32);
        *m = (corrected - previous).max(0.0);
        previous = corrected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::motif::{Pwm, PwmOptions};

    fn partition(n_bins: usize, n_sites: usize) -> PartitionConfig {
        PartitionConfig { n_bins, n_sites }
    }

    fn example_model() -> EnergyModel {
        let pwm = Pwm::new(
            "m",
            "TF",
            vec![
                [0.9, 0.05, 0.03, 0.02],
                [0.1, 0.7, 0.1, 0.1],
                [0.05, 0.05, 0.85, 0.05],
            ],
        )
        .unwrap();
        pwm.to_energy_model(&PwmOptions::default()).unwrap()
    }

    #[test]
    fn grid_mass_sums_to_one() {
        let grid = estimate_partition_fn(&example_model(), &partition(512, 1)).unwrap();
        assert!((grid.total_mass() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn grid_mean_matches_the_model_mean_energy() {
        let model = example_model();
        let grid = estimate_partition_fn(&model, &partition(4096, 1)).unwrap();
        // Discretization error is bounded by one bin width per position.
        let slack = grid.step() * model.motif_len() as f64;
        assert!((grid.mean_energy() - model.mean_energy()).abs() < slack);
    }

    #[test]
    fn single_position_model_with_distinct_energies_fills_four_bins() {
        let pwm = Pwm::new("m", "TF", vec![[0.9, 0.05, 0.03, 0.02]]).unwrap();
        let model = pwm.to_energy_model(&PwmOptions::default()).unwrap();
        let grid = estimate_partition_fn(&model, &partition(512, 1)).unwrap();
        let nonzero: Vec<f64> = grid.mass().iter().copied().filter(|&m| m > 1e-12).collect();
        assert_eq!(nonzero.len(), 4);
        for m in nonzero {
            assert!((m - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn coinciding_base_energies_collapse_into_a_shared_bin() {
        // The three non-consensus bases have identical probability, so their
        // energies coincide and 0.75 of the mass lands in one bin.
        let pwm = Pwm::new("m", "TF", vec![[0.97, 0.01, 0.01, 0.01]]).unwrap();
        let model = pwm.to_energy_model(&PwmOptions::default()).unwrap();
        let grid = estimate_partition_fn(&model, &partition(512, 1)).unwrap();
        let mut nonzero: Vec<f64> =
            grid.mass().iter().copied().filter(|&m| m > 1e-12).collect();
        nonzero.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(nonzero.len(), 2);
        assert!((nonzero[0] - 0.25).abs() < 1e-9);
        assert!((nonzero[1] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn base_energies_land_in_their_nearest_bin() {
        // One position with energies {0, 1, 2, 4} on an 8-bin grid with step
        // (4 + 1e-6) / 7. The top energy sits a hair below 7 steps and must
        // round up into the last usable bin rather than truncate below it.
        let model = EnergyModel::new(0.0, vec![1.0, 2.0, 4.0]).unwrap();
        let grid = estimate_partition_fn(&model, &partition(8, 1)).unwrap();
        assert!((grid.mass()[7] - 0.25).abs() < 1e-9);
        assert!((grid.energy_at(7) - 4.0).abs() < 1e-3);
    }

    #[test]
    fn single_site_correction_is_the_identity() {
        let grid = estimate_partition_fn(&example_model(), &partition(512, 1)).unwrap();
        let mut corrected = grid.mass().to_vec();
        apply_min_site_correction(&mut corrected, 1);
        for (a, b) in grid.mass().iter().zip(&corrected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn multi_site_correction_shifts_mass_toward_lower_energies() {
        let model = example_model();
        let single = estimate_partition_fn(&model, &partition(1024, 1)).unwrap();
        let multi = estimate_partition_fn(&model, &partition(1024, 8)).unwrap();
        assert!((multi.total_mass() - 1.0).abs() < 1e-6);
        assert!(multi.mean_energy() < single.mean_energy());
    }

    #[test]
    fn reweighting_favors_lower_energy_bins() {
        let model = example_model();
        let grid = estimate_partition_fn(&model, &partition(1024, 1)).unwrap();
        let selected = grid.reweight(model.mean_energy()).unwrap();
        assert!((selected.total_mass() - 1.0).abs() < 1e-9);
        assert!(selected.mean_energy() < grid.mean_energy());
    }

    #[test]
    fn non_power_of_two_bin_count_is_rejected() {
        let err = estimate_partition_fn(&example_model(), &partition(1000, 1)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }
}
