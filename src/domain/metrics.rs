//! Return-series math and the summary statistics of a portfolio evaluation.

use std::fmt;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary statistics for one allocation over one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceMetrics {
    /// Population standard deviation of daily returns.
    pub volatility: f64,
    pub avg_daily_return: f64,
    /// Annualized, zero risk-free rate. NaN when volatility is zero.
    pub sharpe_ratio: f64,
    /// Final portfolio value relative to day zero.
    pub cumulative_return: f64,
}

impl PerformanceMetrics {
    pub fn from_daily_returns(returns: &[f64]) -> Self {
        let avg_daily_return = mean(returns);
        let volatility = population_stddev(returns);
        Self {
            volatility,
            avg_daily_return,
            sharpe_ratio: sharpe_ratio(avg_daily_return, volatility),
            cumulative_return: returns.iter().map(|r| 1.0 + r).product(),
        }
    }

    /// Strictly better Sharpe ratio. NaN never beats anything.
    pub fn beats(&self, sharpe: f64) -> bool {
        self.sharpe_ratio > sharpe
    }
}

impl fmt::Display for PerformanceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "volatility={:.6} avg_daily_return={:.6} sharpe={:.4} cumulative_return={:.4}",
            self.volatility, self.avg_daily_return, self.sharpe_ratio, self.cumulative_return
        )
    }
}

/// Divide every value by the first so the series starts at 1.0.
pub fn normalize(series: &[f64]) -> Vec<f64> {
    match series.first() {
        Some(&first) => series.iter().map(|v| v / first).collect(),
        None => Vec::new(),
    }
}

/// Weighted sum of normalized series at each session.
pub fn portfolio_values(normalized: &[Vec<f64>], weights: &[f64]) -> Vec<f64> {
    let len = normalized.first().map_or(0, Vec::len);
    (0..len)
        .map(|t| {
            normalized
                .iter()
                .zip(weights)
                .map(|(series, w)| w * series[t])
                .sum()
        })
        .collect()
}

/// Simple daily returns with day zero pinned to 0.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(values.len());
    if values.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(values.windows(2).map(|w| w[1] / w[0] - 1.0));
    returns
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with ddof = 0.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn sharpe_ratio(avg_daily_return: f64, volatility: f64) -> f64 {
    if volatility == 0.0 {
        return f64::NAN;
    }
    TRADING_DAYS_PER_YEAR.sqrt() * avg_daily_return / volatility
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_starts_at_one() {
        let n = normalize(&[50.0, 55.0, 45.0]);
        assert_relative_eq!(n[0], 1.0);
        assert_relative_eq!(n[1], 1.1);
        assert_relative_eq!(n[2], 0.9);
    }

    #[test]
    fn normalize_empty() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn portfolio_values_weighted_sum() {
        let normalized = vec![vec![1.0, 1.2, 1.5], vec![1.0, 0.8, 1.0]];
        let values = portfolio_values(&normalized, &[0.25, 0.75]);
        assert_relative_eq!(values[0], 1.0);
        assert_relative_eq!(values[1], 0.25 * 1.2 + 0.75 * 0.8);
        assert_relative_eq!(values[2], 0.25 * 1.5 + 0.75 * 1.0);
    }

    #[test]
    fn daily_returns_pins_day_zero() {
        let r = daily_returns(&[1.0, 1.1, 0.99]);
        assert_eq!(r.len(), 3);
        assert_eq!(r[0], 0.0);
        assert_relative_eq!(r[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(r[2], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn daily_returns_single_value() {
        assert_eq!(daily_returns(&[1.0]), vec![0.0]);
        assert!(daily_returns(&[]).is_empty());
    }

    #[test]
    fn stddev_is_population() {
        // mean 5, squared deviations sum to 32 over 8 values
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(population_stddev(&values), 2.0);
    }

    #[test]
    fn metrics_for_steady_growth() {
        // returns [0, 0.1, 0.1]
        let m = PerformanceMetrics::from_daily_returns(&daily_returns(&[1.0, 1.1, 1.21]));
        assert_relative_eq!(m.avg_daily_return, 0.2 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.volatility, 2.0_f64.sqrt() / 30.0, epsilon = 1e-12);
        assert_relative_eq!(m.sharpe_ratio, 504.0_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(m.cumulative_return, 1.21, epsilon = 1e-12);
    }

    #[test]
    fn flat_returns_give_nan_sharpe() {
        let m = PerformanceMetrics::from_daily_returns(&[0.0, 0.0, 0.0]);
        assert_eq!(m.volatility, 0.0);
        assert_eq!(m.avg_daily_return, 0.0);
        assert!(m.sharpe_ratio.is_nan());
        assert_eq!(m.cumulative_return, 1.0);
    }

    #[test]
    fn nan_sharpe_never_beats() {
        let nan = PerformanceMetrics::from_daily_returns(&[0.0, 0.0]);
        assert!(!nan.beats(f64::NEG_INFINITY));
        let good = PerformanceMetrics::from_daily_returns(&daily_returns(&[1.0, 1.1, 1.3]));
        assert!(good.beats(f64::NEG_INFINITY));
        assert!(!good.beats(f64::NAN));
        assert!(!good.beats(good.sharpe_ratio));
    }

    #[test]
    fn losing_portfolio_has_negative_sharpe() {
        let m = PerformanceMetrics::from_daily_returns(&daily_returns(&[1.0, 0.95, 0.92, 0.9]));
        assert!(m.sharpe_ratio < 0.0);
        assert!(m.cumulative_return < 1.0);
    }
}
