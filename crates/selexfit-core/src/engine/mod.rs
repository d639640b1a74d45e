//! Likelihood machinery for sequential selection experiments.
//!
//! The engine turns an [`EnergyModel`](crate::core::energy::EnergyModel) and
//! the observed reads of each selection round into a log-likelihood, and
//! optimizes the model against it:
//!
//! - [`partition`] discretizes the energy distribution of random sequences,
//! - [`chemical_potential`] solves the protein conservation relation per
//!   round,
//! - [`scorer`] and [`likelihood`] evaluate models against observed reads,
//! - [`fitter`] runs the weighted coordinate descent,
//! - [`bootstrap`] resamples replicate likelihoods for model assessment.

pub mod bootstrap;
pub mod chemical_potential;
pub mod config;
pub mod error;
pub mod fitter;
pub mod likelihood;
pub mod partition;
pub mod progress;
pub mod scorer;
