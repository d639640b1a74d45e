use super::constants::RT;

/// Log-odds of a probability. Diverges at 0 and 1; callers clamp first.
#[inline]
pub fn logit(p: f64) -> f64 {
    p.ln() - (1.0 - p).ln()
}

/// The logistic function, computed via the sign-stable branch so that
/// neither `exp` overflows for large `|x|`.
#[inline]
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e_x = x.exp();
        e_x / (1.0 + e_x)
    }
}

/// Langmuir occupancy of a site with binding energy `energy` (kcal/mol) at
/// log free-TF concentration `chem_pot`. Lower energy means higher occupancy.
#[inline]
pub fn occupancy(energy: f64, chem_pot: f64) -> f64 {
    logistic((chem_pot - energy) / RT)
}

/// `ln(occupancy(energy, chem_pot))`, i.e. `-ln(1 + exp((energy - chem_pot)/RT))`,
/// evaluated without overflow for either sign of the argument.
#[inline]
pub fn log_occupancy(energy: f64, chem_pot: f64) -> f64 {
    let x = (energy - chem_pot) / RT;
    if x > 0.0 {
        -x - (-x).exp().ln_1p()
    } else {
        -x.exp().ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn logit_is_zero_at_one_half() {
        assert!(f64_approx_equal(logit(0.5), 0.0));
    }

    #[test]
    fn logit_and_logistic_are_inverses() {
        for &p in &[0.01, 0.25, 0.5, 0.9, 0.999] {
            assert!((logistic(logit(p)) - p).abs() < 1e-12);
        }
    }

    #[test]
    fn logistic_is_stable_for_extreme_arguments() {
        assert!(f64_approx_equal(logistic(1e4), 1.0));
        assert!(f64_approx_equal(logistic(-1e4), 0.0));
        assert!(logistic(-1e4) >= 0.0);
    }

    #[test]
    fn lower_energy_gives_higher_occupancy() {
        let chem_pot = -6.0;
        assert!(occupancy(-10.0, chem_pot) > occupancy(-2.0, chem_pot));
    }

    #[test]
    fn occupancy_is_one_half_when_energy_equals_chemical_potential() {
        assert!(f64_approx_equal(occupancy(-6.0, -6.0), 0.5));
    }

    #[test]
    fn log_occupancy_matches_log_of_occupancy() {
        for &(e, u) in &[(-10.0, -6.0), (-2.0, -6.0), (3.0, -8.0), (-6.0, -6.0)] {
            let direct = occupancy(e, u).ln();
            assert!((log_occupancy(e, u) - direct).abs() < 1e-9);
        }
    }

    #[test]
    fn log_occupancy_does_not_overflow_for_very_unfavorable_energies() {
        let v = log_occupancy(1e4, -6.0);
        assert!(v.is_finite());
        assert!(v < -1e4);
    }
}
