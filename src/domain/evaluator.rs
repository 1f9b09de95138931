//! Portfolio performance evaluation for a fixed allocation.

use crate::domain::allocation::check_weights;
use crate::domain::error::AllocError;
use crate::domain::metrics::{daily_returns, normalize, portfolio_values, PerformanceMetrics};
use crate::domain::portfolio::PortfolioSpec;
use crate::domain::price_history::PriceHistory;
use crate::ports::calendar_port::CalendarPort;
use crate::ports::data_port::DataPort;

/// Day-zero normalized closes, computed once and reused for every allocation.
#[derive(Debug, Clone)]
pub struct PortfolioEvaluator {
    normalized: Vec<Vec<f64>>,
}

impl PortfolioEvaluator {
    pub fn new(history: &PriceHistory) -> Self {
        Self {
            normalized: history.all_closes().iter().map(|s| normalize(s)).collect(),
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.normalized.len()
    }

    pub fn evaluate(&self, weights: &[f64]) -> Result<PerformanceMetrics, AllocError> {
        check_weights(weights, self.symbol_count())?;
        let values = portfolio_values(&self.normalized, weights);
        Ok(PerformanceMetrics::from_daily_returns(&daily_returns(&values)))
    }
}

/// Evaluate one allocation against an already loaded price history.
pub fn evaluate(history: &PriceHistory, weights: &[f64]) -> Result<PerformanceMetrics, AllocError> {
    PortfolioEvaluator::new(history).evaluate(weights)
}

/// Fetch prices for the portfolio and evaluate `weights` on them.
pub fn simulate(
    data_port: &dyn DataPort,
    calendar: &dyn CalendarPort,
    spec: &PortfolioSpec,
    weights: &[f64],
) -> Result<PerformanceMetrics, AllocError> {
    check_weights(weights, spec.symbol_count())?;
    let history = PriceHistory::load(data_port, calendar, spec)?;
    evaluate(&history, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn sessions(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                (start + chrono::Duration::days(i as i64))
                    .and_hms_opt(16, 0, 0)
                    .unwrap()
            })
            .collect()
    }

    fn history(closes: Vec<Vec<f64>>) -> PriceHistory {
        let n = closes[0].len();
        let symbols = (0..closes.len()).map(|i| format!("S{i}")).collect();
        PriceHistory::from_closes(sessions(n), symbols, closes).unwrap()
    }

    #[test]
    fn single_symbol_cumulative_is_price_ratio() {
        let h = history(vec![vec![40.0, 42.0, 39.0, 44.0]]);
        let m = evaluate(&h, &[1.0]).unwrap();
        assert_relative_eq!(m.cumulative_return, 44.0 / 40.0, epsilon = 1e-12);
    }

    #[test]
    fn scale_of_prices_does_not_matter() {
        let a = evaluate(&history(vec![vec![1.0, 1.1, 1.05]]), &[1.0]).unwrap();
        let b = evaluate(&history(vec![vec![1000.0, 1100.0, 1050.0]]), &[1.0]).unwrap();
        assert_relative_eq!(a.sharpe_ratio, b.sharpe_ratio, epsilon = 1e-9);
        assert_relative_eq!(a.volatility, b.volatility, epsilon = 1e-12);
    }

    #[test]
    fn flat_series_has_zero_volatility_and_nan_sharpe() {
        let m = evaluate(&history(vec![vec![25.0; 5]]), &[1.0]).unwrap();
        assert_eq!(m.volatility, 0.0);
        assert!(m.sharpe_ratio.is_nan());
        assert_relative_eq!(m.cumulative_return, 1.0);
    }

    #[test]
    fn mixed_portfolio_blends_normalized_prices() {
        let h = history(vec![vec![100.0, 110.0, 121.0], vec![50.0, 50.0, 50.0]]);
        let m = evaluate(&h, &[0.5, 0.5]).unwrap();
        // values 1.0, 1.05, 1.105
        assert_relative_eq!(m.cumulative_return, 1.105, epsilon = 1e-12);
    }

    #[test]
    fn rejects_weight_length_mismatch() {
        let h = history(vec![vec![1.0, 2.0], vec![1.0, 2.0]]);
        let err = evaluate(&h, &[1.0]).unwrap_err();
        assert!(matches!(err, AllocError::InvalidArgument { .. }));
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let h = history(vec![vec![1.0, 2.0], vec![1.0, 2.0]]);
        let err = evaluate(&h, &[0.5, 0.4]).unwrap_err();
        assert!(matches!(err, AllocError::InvalidArgument { .. }));
    }

    #[test]
    fn evaluator_is_reusable() {
        let h = history(vec![vec![10.0, 11.0, 12.0], vec![20.0, 19.0, 21.0]]);
        let evaluator = PortfolioEvaluator::new(&h);
        let first = evaluator.evaluate(&[0.3, 0.7]).unwrap();
        let second = evaluator.evaluate(&[0.3, 0.7]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, evaluate(&h, &[0.3, 0.7]).unwrap());
    }
}
