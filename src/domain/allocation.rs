//! Enumeration of discretized allocation vectors.
//!
//! An allocation over `n` assets at granularity `g` assigns each asset a
//! non-negative multiple of `1/g` such that the weights sum to one. The set of
//! such vectors is the set of weak compositions of `g` into `n` parts, of which
//! there are `C(g + n - 1, n - 1)`.
//!
//! Traversal order: the last weight starts at 1.0 and descends; for each value
//! of the last weight the preceding weights are enumerated the same way. For
//! two assets at `g = 10` this yields `(0.0, 1.0), (0.1, 0.9), ..., (1.0, 0.0)`.

use crate::domain::error::AllocError;

pub const DEFAULT_GRANULARITY_STEPS: u32 = 10;

/// Tolerance used when checking that a weight vector sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Lazily generate every allocation vector of length `n` whose entries are
/// multiples of `1 / granularity_steps`.
pub fn enumerate_allocations(n: usize, granularity_steps: u32) -> Result<Allocations, AllocError> {
    if n < 1 {
        return Err(AllocError::invalid("asset count must be at least 1"));
    }
    if granularity_steps < 1 {
        return Err(AllocError::invalid("granularity steps must be at least 1"));
    }

    let mut units = vec![0u32; n];
    units[n - 1] = granularity_steps;

    Ok(Allocations {
        units,
        steps: granularity_steps,
        exhausted: false,
    })
}

/// Number of vectors [`enumerate_allocations`] yields, `C(g + n - 1, n - 1)`.
/// `None` if the count overflows `u128` or the arguments are out of range.
pub fn composition_count(n: usize, granularity_steps: u32) -> Option<u128> {
    if n < 1 || granularity_steps < 1 {
        return None;
    }
    let total = granularity_steps as u128 + n as u128 - 1;
    let k = (n as u128 - 1).min(granularity_steps as u128);

    let mut count: u128 = 1;
    for i in 1..=k {
        // count * (total - k + i) is always divisible by i
        count = count.checked_mul(total - k + i)? / i;
    }
    Some(count)
}

/// Validate a weight vector against a symbol count.
pub fn check_weights(weights: &[f64], expected_len: usize) -> Result<(), AllocError> {
    if weights.len() != expected_len {
        return Err(AllocError::invalid(format!(
            "{} weights given for {} symbols",
            weights.len(),
            expected_len
        )));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(AllocError::invalid(format!(
            "weights must be finite and non-negative, got {w}"
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(AllocError::invalid(format!(
            "weights must sum to 1.0, got {sum}"
        )));
    }
    Ok(())
}

/// Iterator over allocation vectors. Holds a single integer composition and
/// advances it in place; the sequence is finite and deterministic.
#[derive(Debug, Clone)]
pub struct Allocations {
    units: Vec<u32>,
    steps: u32,
    exhausted: bool,
}

impl Allocations {
    fn advance(&mut self) {
        // units[1..p] are all zero, so everything before p collapses onto p - 1
        match (1..self.units.len()).find(|&p| self.units[p] > 0) {
            Some(p) => {
                let carried = self.units[0] + 1;
                self.units[0] = 0;
                self.units[p] -= 1;
                self.units[p - 1] = carried;
            }
            None => self.exhausted = true,
        }
    }
}

impl Iterator for Allocations {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let steps = self.steps as f64;
        let weights = self.units.iter().map(|&u| u as f64 / steps).collect();
        self.advance();
        Some(weights)
    }
}

impl std::iter::FusedIterator for Allocations {}
