//! # Core Module
//!
//! Stateless data models and pure math underlying the SELEX fitting engine.
//!
//! ## Architecture
//!
//! - **Thermodynamic constants** ([`constants`]) - the `R·T` product used
//!   throughout the occupancy calculations
//! - **Occupancy math** ([`occupancy`]) - logit/logistic functions and the
//!   Langmuir occupancy law in a single, overflow-safe formulation
//! - **Sequence encoding** ([`sequence`]) - bases, reads, and the sparse
//!   indicator encoding of binding sites consumed by the scorer
//! - **Energy model** ([`energy`]) - the reference-energy / ΔΔG-offset pair
//! - **Motif construction** ([`motif`]) - thermodynamically calibrated
//!   conversion of a position weight matrix into an [`energy::EnergyModel`]
//! - **Numeric utilities** ([`utils`]) - bracketed root finding

pub mod constants;
pub mod energy;
pub mod motif;
pub mod occupancy;
pub mod sequence;
pub mod utils;
