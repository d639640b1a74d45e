//! # SELEXFIT Core Library
//!
//! A library for fitting thermodynamic models of transcription factor (TF)
//! DNA-binding affinity from SELEX sequencing data.
//!
//! A binding motif is represented as a position-specific energy model: a
//! reference energy plus per-position, per-base energy offsets (ΔΔG). The
//! library computes the exact distribution of binding energies over all
//! possible fixed-length sequences via frequency-domain convolution, solves
//! per-round chemical potentials (free TF concentration) from mass
//! conservation, and fits the energy model to observed sequence pools across
//! selection rounds by maximizing a multi-round log-likelihood.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   (`EnergyModel`, `Pwm`), pure thermodynamic math (`occupancy`), the
//!   sequence encoding, and numeric utilities.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates the
//!   numeric estimation: the partition-function estimator, the
//!   chemical-potential solver, the log-likelihood evaluator, the
//!   coordinate-wise model fitter, and the bootstrap estimator.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute complete procedures
//!   such as fitting a model to multi-round read pools or simulating a SELEX
//!   experiment from a known model.

pub mod core;
pub mod engine;
pub mod workflows;
