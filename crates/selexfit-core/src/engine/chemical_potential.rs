use super::config::BindingConditions;
use super::error::EngineError;
use super::partition::EnergyGrid;
use crate::core::occupancy::logistic;
use crate::core::utils::roots;

/// Lower edge of the chemical potential bracket; deep enough that the bound
/// fraction is numerically zero.
const CHEM_POTENTIAL_FLOOR: f64 = -1000.0;

/// Margin added above `ln(protein)` for the upper bracket edge.
const CHEM_POTENTIAL_HEADROOM: f64 = 100.0;

const XTOL: f64 = 1e-4;

/// Free protein concentration unaccounted for by the conservation relation at
/// chemical potential `u`: total protein minus free protein minus protein
/// bound to the DNA pool described by `grid`.
fn conservation_residual(grid: &EnergyGrid, conditions: &BindingConditions, u: f64) -> f64 {
    let bound_fraction: f64 = grid
        .mass()
        .iter()
        .enumerate()
        .map(|(k, &m)| m * logistic(u - grid.energy_at(k)))
        .sum();
    conditions.protein_concentration - u.exp() - conditions.dna_concentration * bound_fraction
}

/// Solves the protein conservation relation for the chemical potential of one
/// selection round by bisection. The residual is positive at the floor (all
/// protein free and unbound) and negative once `exp(u)` alone exceeds the
/// total protein, so the root is always bracketed for positive
/// concentrations.
pub fn solve_round(grid: &EnergyGrid, conditions: &BindingConditions) -> Result<f64, EngineError> {
    let hi = CHEM_POTENTIAL_HEADROOM + conditions.protein_concentration.ln();
    roots::bisect(
        |u| conservation_residual(grid, conditions, u),
        CHEM_POTENTIAL_FLOOR,
        hi,
        XTOL,
    )
    .map_err(|e| EngineError::from_root("chemical potential", e))
}

/// Chemical potentials for a series of sequential rounds. After each round
/// the pool is depleted by Fermi reweighting before the next round is solved.
pub fn solve_series(
    grid: &EnergyGrid,
    conditions: &BindingConditions,
    n_rounds: usize,
) -> Result<Vec<f64>, EngineError> {
    let mut potentials = Vec::with_capacity(n_rounds);
    let mut pool = grid.clone();
    for round in 0..n_rounds {
        let u = solve_round(&pool, conditions)?;
        potentials.push(u);
        if round + 1 < n_rounds {
            pool = pool.reweight(u)?;
        }
    }
    Ok(potentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::motif::{Pwm, PwmOptions};
    use crate::engine::config::PartitionConfig;
    use crate::engine::partition::estimate_partition_fn;

    fn conditions() -> BindingConditions {
        BindingConditions {
            dna_concentration: 2e-8,
            protein_concentration: 5e-10,
        }
    }

    fn example_grid() -> EnergyGrid {
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
        let model = pwm.to_energy_model(&PwmOptions::default()).unwrap();
        estimate_partition_fn(&model, &PartitionConfig { n_bins: 1024, n_sites: 1 }).unwrap()
    }

    #[test]
    fn solved_potential_satisfies_protein_conservation() {
        let grid = example_grid();
        let conditions = conditions();
        let u = solve_round(&grid, &conditions).unwrap();
        let residual = conservation_residual(&grid, &conditions, u);
        assert!(residual.abs() < conditions.protein_concentration * 1e-2);
    }

    #[test]
    fn potential_never_exceeds_the_free_protein_ceiling() {
        let grid = example_grid();
        let conditions = conditions();
        let u = solve_round(&grid, &conditions).unwrap();
        // exp(u) is the free protein concentration, bounded by the total up
        // to the bisection's abscissa tolerance.
        assert!(u.exp() <= conditions.protein_concentration * (1.0 + 1e-3));
    }

    #[test]
    fn sequential_rounds_deplete_the_pool_monotonically() {
        let grid = example_grid();
        let potentials = solve_series(&grid, &conditions(), 4).unwrap();
        assert_eq!(potentials.len(), 4);
        // Each round enriches for low-energy binders, so more protein is
        // consumed and the free chemical potential falls.
        for pair in potentials.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-3);
        }
    }
}
