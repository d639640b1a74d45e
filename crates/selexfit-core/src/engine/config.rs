use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub const DEFAULT_N_BINS: usize = 4096;
pub const DEFAULT_N_SITES: usize = 1;
pub const DEFAULT_MAX_ITERATIONS: usize = 500;
pub const DEFAULT_INITIAL_TOLERANCE: f64 = 1e-2;
pub const DEFAULT_TOLERANCE_FLOOR: f64 = 1e-4;
pub const DEFAULT_MOMENTUM: f64 = 0.1;
pub const DEFAULT_COORDINATE_BOUNDS: f64 = 5.0;
pub const DEFAULT_TARGET_MEAN_ENERGY: f64 = -3.0;
pub const DEFAULT_MAX_BASE_ENERGY_SPREAD: f64 = 8.0;
pub const DEFAULT_POOL_SIZE: usize = 10_000;
pub const DEFAULT_BOOTSTRAP_SAMPLES: usize = 100;

/// Experimental conditions of one selection round, in mol/L.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BindingConditions {
    pub dna_concentration: f64,
    pub protein_concentration: f64,
}

/// Discretization of the sequence energy distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Number of energy bins; must be a power of two.
    pub n_bins: usize,
    /// Binding sites per molecule for the order-statistic correction.
    pub n_sites: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub max_iterations: usize,
    /// Starting bracket tolerance for the scalar line searches; annealed
    /// by factors of 100 down to `tolerance_floor`.
    pub initial_tolerance: f64,
    pub tolerance_floor: f64,
    /// Blend factor for the coordinate weight update, in [0, 1).
    pub momentum: f64,
    /// Half-width of the search bracket around each coordinate, kcal/mol.
    pub coordinate_bounds: f64,
    /// Mean-energy penalty target, kcal/mol.
    pub target_mean_energy: f64,
    /// Per-position base-energy spread above which a penalty applies.
    pub max_base_energy_spread: f64,
    /// Fixed RNG seed for reproducible coordinate selection.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Size of the random-read pool the resampler draws from.
    pub pool_size: usize,
    pub n_samples: usize,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            n_samples: DEFAULT_BOOTSTRAP_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    pub conditions: BindingConditions,
    pub partition: PartitionConfig,
    pub optimization: OptimizationConfig,
}

#[derive(Default)]
pub struct FitConfigBuilder {
    dna_concentration: Option<f64>,
    protein_concentration: Option<f64>,
    n_bins: Option<usize>,
    n_sites: Option<usize>,
    max_iterations: Option<usize>,
    initial_tolerance: Option<f64>,
    tolerance_floor: Option<f64>,
    momentum: Option<f64>,
    coordinate_bounds: Option<f64>,
    target_mean_energy: Option<f64>,
    max_base_energy_spread: Option<f64>,
    seed: Option<u64>,
}

impl FitConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dna_concentration(mut self, molar: f64) -> Self {
        self.dna_concentration = Some(molar);
        self
    }
    pub fn protein_concentration(mut self, molar: f64) -> Self {
        self.protein_concentration = Some(molar);
        self
    }
    pub fn n_bins(mut self, n: usize) -> Self {
        self.n_bins = Some(n);
        self
    }
    pub fn n_sites(mut self, n: usize) -> Self {
        self.n_sites = Some(n);
        self
    }
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }
    pub fn initial_tolerance(mut self, tol: f64) -> Self {
        self.initial_tolerance = Some(tol);
        self
    }
    pub fn tolerance_floor(mut self, tol: f64) -> Self {
        self.tolerance_floor = Some(tol);
        self
    }
    pub fn momentum(mut self, momentum: f64) -> Self {
        self.momentum = Some(momentum);
        self
    }
    pub fn coordinate_bounds(mut self, half_width: f64) -> Self {
        self.coordinate_bounds = Some(half_width);
        self
    }
    pub fn target_mean_energy(mut self, energy: f64) -> Self {
        self.target_mean_energy = Some(energy);
        self
    }
    pub fn max_base_energy_spread(mut self, spread: f64) -> Self {
        self.max_base_energy_spread = Some(spread);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<FitConfig, ConfigError> {
        let dna = self
            .dna_concentration
            .ok_or(ConfigError::MissingParameter("dna_concentration"))?;
        let protein = self
            .protein_concentration
            .ok_or(ConfigError::MissingParameter("protein_concentration"))?;
        if dna <= 0.0 || !dna.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "dna_concentration",
                reason: format!("must be a positive concentration, got {dna}"),
            });
        }
        if protein <= 0.0 || !protein.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "protein_concentration",
                reason: format!("must be a positive concentration, got {protein}"),
            });
        }

        let n_bins = self.n_bins.unwrap_or(DEFAULT_N_BINS);
        if !n_bins.is_power_of_two() || n_bins < 4 {
            return Err(ConfigError::InvalidParameter {
                name: "n_bins",
                reason: format!("must be a power of two >= 4, got {n_bins}"),
            });
        }
        let n_sites = self.n_sites.unwrap_or(DEFAULT_N_SITES);
        if n_sites == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "n_sites",
                reason: "must be at least 1".into(),
            });
        }

        let initial_tolerance = self.initial_tolerance.unwrap_or(DEFAULT_INITIAL_TOLERANCE);
        let tolerance_floor = self.tolerance_floor.unwrap_or(DEFAULT_TOLERANCE_FLOOR);
        if !(tolerance_floor > 0.0 && tolerance_floor <= initial_tolerance) {
            return Err(ConfigError::InvalidParameter {
                name: "tolerance_floor",
                reason: format!(
                    "must be in (0, initial_tolerance]; got {tolerance_floor} with initial {initial_tolerance}"
                ),
            });
        }
        let momentum = self.momentum.unwrap_or(DEFAULT_MOMENTUM);
        if !(0.0..1.0).contains(&momentum) {
            return Err(ConfigError::InvalidParameter {
                name: "momentum",
                reason: format!("must be in [0, 1), got {momentum}"),
            });
        }
        let coordinate_bounds = self.coordinate_bounds.unwrap_or(DEFAULT_COORDINATE_BOUNDS);
        if coordinate_bounds <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "coordinate_bounds",
                reason: format!("must be positive, got {coordinate_bounds}"),
            });
        }
        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        if max_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_iterations",
                reason: "must be at least 1".into(),
            });
        }

        Ok(FitConfig {
            conditions: BindingConditions {
                dna_concentration: dna,
                protein_concentration: protein,
            },
            partition: PartitionConfig { n_bins, n_sites },
            optimization: OptimizationConfig {
                max_iterations,
                initial_tolerance,
                tolerance_floor,
                momentum,
                coordinate_bounds,
                target_mean_energy: self
                    .target_mean_energy
                    .unwrap_or(DEFAULT_TARGET_MEAN_ENERGY),
                max_base_energy_spread: self
                    .max_base_energy_spread
                    .unwrap_or(DEFAULT_MAX_BASE_ENERGY_SPREAD),
                seed: self.seed,
            },
        })
    }
}
