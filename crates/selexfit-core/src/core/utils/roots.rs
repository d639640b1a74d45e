use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RootError {
    #[error("Function does not change sign over [{lo}, {hi}]")]
    NotBracketed { lo: f64, hi: f64 },

    #[error("Bracket [{lo}, {hi}] is empty or not finite")]
    InvalidBracket { lo: f64, hi: f64 },
}

const MAX_BISECT_ITERATIONS: usize = 200;

/// Bracketed bisection: finds `x` in `[lo, hi]` with `f(x) ~ 0` to within
/// `xtol` on the abscissa. The bracket is never widened; a sign agreement at
/// the endpoints is an error surfaced to the caller, not retried.
pub fn bisect(
    mut f: impl FnMut(f64) -> f64,
    lo: f64,
    hi: f64,
    xtol: f64,
) -> Result<f64, RootError> {
    if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
        return Err(RootError::InvalidBracket { lo, hi });
    }

    let f_lo = f(lo);
    if f_lo == 0.0 {
        return Ok(lo);
    }
    let f_hi = f(hi);
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(RootError::NotBracketed { lo, hi });
    }

    let (mut lo, mut hi) = (lo, hi);
    let mut f_lo = f_lo;
    for _ in 0..MAX_BISECT_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if hi - lo < xtol {
            return Ok(mid);
        }
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return Ok(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

const INV_GOLDEN_RATIO: f64 = 0.618_033_988_749_894_8;

/// Golden-section search for a local minimum of `f` on `[lo, hi]`, stopping
/// when the bracket width falls below `xatol`. Returns the best abscissa and
/// its function value.
pub fn minimize_scalar_bounded(
    mut f: impl FnMut(f64) -> f64,
    lo: f64,
    hi: f64,
    xatol: f64,
) -> (f64, f64) {
    let (mut lo, mut hi) = (lo.min(hi), lo.max(hi));
    let mut x1 = hi - INV_GOLDEN_RATIO * (hi - lo);
    let mut x2 = lo + INV_GOLDEN_RATIO * (hi - lo);
    let mut f1 = f(x1);
    let mut f2 = f(x2);

    while hi - lo > xatol {
        if f1 <= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_GOLDEN_RATIO * (hi - lo);
            f1 = f(x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_GOLDEN_RATIO * (hi - lo);
            f2 = f(x2);
        }
    }

    if f1 <= f2 { (x1, f1) } else { (x2, f2) }
}
