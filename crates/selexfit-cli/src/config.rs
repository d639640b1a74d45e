use crate::error::{CliError, Result};
use selexfit::core::energy::EnergyModel;
use selexfit::core::motif::{Pwm, PwmOptions};
use selexfit::engine::config::{FitConfig, FitConfigBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk experiment description, deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub experiment: ExperimentSection,
    #[serde(default)]
    pub fit: FitSection,
    /// Required by `fit` and `simulate`; `bootstrap` reads the model from
    /// its own file instead.
    pub pwm: Option<PwmSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentSection {
    /// Total DNA concentration, mol/L.
    pub dna_concentration: f64,
    /// Total protein concentration, mol/L.
    pub protein_concentration: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitSection {
    pub n_bins: Option<usize>,
    pub n_sites: Option<usize>,
    pub max_iterations: Option<usize>,
    pub initial_tolerance: Option<f64>,
    pub tolerance_floor: Option<f64>,
    pub momentum: Option<f64>,
    pub coordinate_bounds: Option<f64>,
    pub target_mean_energy: Option<f64>,
    pub max_base_energy_spread: Option<f64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PwmSection {
    pub name: String,
    pub factor: Option<String>,
    /// One row of four base probabilities per motif position, ACGT order.
    pub rows: Vec<Vec<f64>>,
    /// Calibration targets for the PWM-to-energy-model conversion.
    pub target_mean_energy: Option<f64>,
    pub consensus_gap_per_base: Option<f64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: anyhow::Error::new(e),
        })
    }

    /// Assembles the engine configuration, applying file values over the
    /// builder defaults. A seed passed on the command line wins over the
    /// file.
    pub fn fit_config(&self, seed_override: Option<u64>) -> Result<FitConfig> {
        let mut builder = FitConfigBuilder::new()
            .dna_concentration(self.experiment.dna_concentration)
            .protein_concentration(self.experiment.protein_concentration);

        if let Some(n) = self.fit.n_bins {
            builder = builder.n_bins(n);
        }
        if let Some(n) = self.fit.n_sites {
            builder = builder.n_sites(n);
        }
        if let Some(n) = self.fit.max_iterations {
            builder = builder.max_iterations(n);
        }
        if let Some(t) = self.fit.initial_tolerance {
            builder = builder.initial_tolerance(t);
        }
        if let Some(t) = self.fit.tolerance_floor {
            builder = builder.tolerance_floor(t);
        }
        if let Some(m) = self.fit.momentum {
            builder = builder.momentum(m);
        }
        if let Some(b) = self.fit.coordinate_bounds {
            builder = builder.coordinate_bounds(b);
        }
        if let Some(e) = self.fit.target_mean_energy {
            builder = builder.target_mean_energy(e);
        }
        if let Some(s) = self.fit.max_base_energy_spread {
            builder = builder.max_base_energy_spread(s);
        }
        if let Some(seed) = seed_override.or(self.fit.seed) {
            builder = builder.seed(seed);
        }

        Ok(builder.build()?)
    }

    fn pwm_section(&self) -> Result<&PwmSection> {
        self.pwm.as_ref().ok_or_else(|| {
            CliError::Argument("configuration file has no [pwm] section".to_string())
        })
    }

    pub fn pwm(&self) -> Result<Pwm> {
        let section = self.pwm_section()?;
        let factor = section.factor.clone().unwrap_or_else(|| section.name.clone());
        Ok(Pwm::try_from_rows(
            section.name.clone(),
            factor,
            section.rows.clone(),
        )?)
    }

    pub fn pwm_options(&self) -> Result<PwmOptions> {
        let section = self.pwm_section()?;
        let defaults = PwmOptions::default();
        Ok(PwmOptions {
            target_mean_energy: section
                .target_mean_energy
                .unwrap_or(defaults.target_mean_energy),
            consensus_gap_per_base: section
                .consensus_gap_per_base
                .unwrap_or(defaults.consensus_gap_per_base),
        })
    }
}

/// A fitted model as written by `fit` and read back by `bootstrap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub name: String,
    pub factor: String,
    pub consensus: String,
    pub log_likelihood: f64,
    pub chem_potentials: Vec<f64>,
    pub model: EnergyModel,
}

impl ModelFile {
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: anyhow::Error::new(e),
        })?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: anyhow::Error::new(e),
        })
    }
}
