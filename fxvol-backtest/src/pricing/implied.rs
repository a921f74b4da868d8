//! Implied volatility inversion.

use super::types::{OptionKind, OptionParams, Pricing};
use super::vanilla::{PricingError, VanillaOption};

/// Search interval for the volatility.
pub const MIN_IMPLIED_VOL: f64 = 0.05;
pub const MAX_IMPLIED_VOL: f64 = 1.0;

const MAX_ITER: usize = 100;
const TOLERANCE: f64 = 1e-8;

fn premium_at(kind: OptionKind, params: OptionParams, vol: f64) -> Result<f64, PricingError> {
    Ok(VanillaOption::new(kind, params.with_volatility(vol))?.price())
}

/// Volatility in `[MIN_IMPLIED_VOL, MAX_IMPLIED_VOL]` that reproduces
/// `target_premium` (currency units). The volatility in `params` is ignored.
///
/// Newton-Raphson from the Brenner-Subrahmanyam guess, falling back to
/// bisection when a step leaves the interval or vega vanishes.
pub fn implied_volatility(
    kind: OptionKind,
    params: OptionParams,
    target_premium: f64,
) -> Result<f64, PricingError> {
    if !(target_premium > 0.0) {
        return Err(PricingError::InvalidParameter {
            name: "premium",
            value: target_premium,
        });
    }

    let low_premium = premium_at(kind, params, MIN_IMPLIED_VOL)?;
    let high_premium = premium_at(kind, params, MAX_IMPLIED_VOL)?;
    if target_premium < low_premium - TOLERANCE || target_premium > high_premium + TOLERANCE {
        return Err(PricingError::NoConvergence {
            premium: target_premium,
        });
    }

    // Initial guess using Brenner-Subrahmanyam approximation
    let mut vol = (target_premium / params.spot) * (2.0 * std::f64::consts::PI / params.term).sqrt();
    vol = vol.clamp(MIN_IMPLIED_VOL, MAX_IMPLIED_VOL);

    for _ in 0..MAX_ITER {
        let option = VanillaOption::new(kind, params.with_volatility(vol))?;
        let diff = option.price() - target_premium;
        if diff.abs() < TOLERANCE {
            return Ok(vol);
        }

        let vega = option.vega();
        if vega.abs() < 1e-10 {
            break;
        }

        let next = vol - diff / vega;
        if !(MIN_IMPLIED_VOL..=MAX_IMPLIED_VOL).contains(&next) {
            break;
        }
        vol = next;
    }

    // Premium is increasing in volatility, so bisection always brackets.
    let mut lo = MIN_IMPLIED_VOL;
    let mut hi = MAX_IMPLIED_VOL;
    for _ in 0..MAX_ITER {
        let mid = 0.5 * (lo + hi);
        let diff = premium_at(kind, params, mid)? - target_premium;
        if diff.abs() < TOLERANCE || (hi - lo) < 1e-12 {
            return Ok(mid);
        }
        if diff > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    Err(PricingError::NoConvergence {
        premium: target_premium,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(vol: f64) -> OptionParams {
        OptionParams {
            term: 30.0 / 252.0,
            volatility: vol,
            spot: 76.0,
            initial_spot: 75.0,
            rate: 0.021,
            strike: 75.0,
        }
    }

    #[test]
    fn test_recovers_volatility() {
        for kind in [OptionKind::Call, OptionKind::Put] {
            for &vol in &[0.07, 0.15, 0.42, 0.9] {
                let premium = VanillaOption::new(kind, params(vol)).unwrap().price();
                let implied = implied_volatility(kind, params(0.3), premium).unwrap();
                assert_relative_eq!(implied, vol, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_out_of_range_premium() {
        let too_rich = VanillaOption::call(params(1.5)).unwrap().price();
        assert!(matches!(
            implied_volatility(OptionKind::Call, params(0.2), too_rich),
            Err(PricingError::NoConvergence { .. })
        ));
        assert!(matches!(
            implied_volatility(OptionKind::Call, params(0.2), 0.0),
            Err(PricingError::InvalidParameter { name: "premium", .. })
        ));
    }
}
