//! Exhaustive Sharpe-ratio search over discretized allocations.
//!
//! Prices are loaded once into a [`PriceHistory`] and every candidate is
//! evaluated against that shared, read-only arena on a rayon pool. Results are
//! reduced in enumeration order, so the winner is the first allocation with the
//! strictly highest Sharpe ratio regardless of thread count.

use crate::domain::allocation::{composition_count, enumerate_allocations, DEFAULT_GRANULARITY_STEPS};
pub use crate::domain::cancel::CancelToken;
use crate::domain::error::AllocError;
use crate::domain::evaluator::PortfolioEvaluator;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::portfolio::PortfolioSpec;
use crate::domain::price_history::PriceHistory;
use crate::ports::calendar_port::CalendarPort;
use crate::ports::data_port::DataPort;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub granularity_steps: u32,
    /// Worker threads; 0 lets rayon decide.
    pub threads: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            granularity_steps: DEFAULT_GRANULARITY_STEPS,
            threads: 0,
        }
    }
}

/// One evaluated allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub allocation: Vec<f64>,
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    pub best: PerformanceMetrics,
    pub allocation: Vec<f64>,
    pub evaluated: usize,
    /// Grid the allocation was drawn from; weights are multiples of its inverse.
    pub granularity_steps: u32,
    /// False when no candidate had a finite Sharpe ratio; `best` is then the
    /// first candidate evaluated.
    pub improved: bool,
}

/// Progress side channel. Callbacks arrive in enumeration order.
pub trait OptimizationObserver {
    fn on_candidate(&mut self, _candidate: &Candidate) {}
    fn on_improvement(&mut self, _candidate: &Candidate) {}
}

pub struct NoopObserver;

impl OptimizationObserver for NoopObserver {}

/// Logs every candidate at debug level.
pub struct TracingObserver;

impl OptimizationObserver for TracingObserver {
    fn on_candidate(&mut self, candidate: &Candidate) {
        debug!(
            index = candidate.index,
            allocation = ?candidate.allocation,
            "{}",
            candidate.metrics
        );
    }

    fn on_improvement(&mut self, candidate: &Candidate) {
        debug!(
            index = candidate.index,
            sharpe = candidate.metrics.sharpe_ratio,
            "new best allocation"
        );
    }
}

struct BestSoFar {
    sharpe: f64,
    best: Option<Candidate>,
    first: Option<Candidate>,
    evaluated: usize,
}

impl BestSoFar {
    fn new() -> Self {
        Self {
            sharpe: f64::NEG_INFINITY,
            best: None,
            first: None,
            evaluated: 0,
        }
    }

    /// Returns true if `candidate` became the new best.
    fn offer(&mut self, candidate: &Candidate) -> bool {
        self.evaluated += 1;
        if self.first.is_none() {
            self.first = Some(candidate.clone());
        }
        if candidate.metrics.beats(self.sharpe) {
            self.sharpe = candidate.metrics.sharpe_ratio;
            self.best = Some(candidate.clone());
            return true;
        }
        false
    }

    fn finish(self, granularity_steps: u32) -> Result<OptimizationOutcome, AllocError> {
        let (winner, improved) = match (self.best, self.first) {
            (Some(best), _) => (best, true),
            (None, Some(first)) => {
                warn!("no allocation produced a finite Sharpe ratio, reporting the first candidate");
                (first, false)
            }
            (None, None) => return Err(AllocError::invalid("no candidate allocations")),
        };
        Ok(OptimizationOutcome {
            best: winner.metrics,
            allocation: winner.allocation,
            evaluated: self.evaluated,
            granularity_steps,
            improved,
        })
    }
}

/// Candidates evaluated per parallel batch. Observer callbacks and
/// cancellation checks happen between batches.
pub const CHUNK_SIZE: usize = 4096;

/// Search every allocation of `history`'s symbols for the best Sharpe ratio.
pub fn optimize(
    history: &PriceHistory,
    config: &OptimizerConfig,
    cancel: &CancelToken,
    observer: &mut dyn OptimizationObserver,
) -> Result<OptimizationOutcome, AllocError> {
    optimize_in_chunks(history, config, cancel, observer, CHUNK_SIZE)
}

pub(crate) fn optimize_in_chunks(
    history: &PriceHistory,
    config: &OptimizerConfig,
    cancel: &CancelToken,
    observer: &mut dyn OptimizationObserver,
    chunk_size: usize,
) -> Result<OptimizationOutcome, AllocError> {
    let symbols = history.symbol_count();
    let mut allocations = enumerate_allocations(symbols, config.granularity_steps)?;
    let total = composition_count(symbols, config.granularity_steps).ok_or_else(|| {
        AllocError::invalid(format!(
            "too many allocations for {symbols} symbols at {} steps",
            config.granularity_steps
        ))
    })?;

    info!(
        candidates = %total,
        symbols = ?history.symbols(),
        sessions = history.session_count(),
        first_session = ?history.sessions().first(),
        last_session = ?history.sessions().last(),
        steps = config.granularity_steps,
        "starting allocation search"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| AllocError::invalid(format!("failed to build thread pool: {e}")))?;

    let evaluator = PortfolioEvaluator::new(history);
    let mut tracker = BestSoFar::new();
    let chunk_size = chunk_size.max(1);

    loop {
        cancel.check()?;
        let chunk: Vec<Vec<f64>> = allocations.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }

        let results: Vec<PerformanceMetrics> = pool.install(|| {
            chunk
                .par_iter()
                .map(|weights| {
                    cancel.check()?;
                    evaluator.evaluate(weights)
                })
                .collect::<Result<Vec<_>, AllocError>>()
        })?;

        for (allocation, metrics) in chunk.into_iter().zip(results) {
            let candidate = Candidate {
                index: tracker.evaluated,
                allocation,
                metrics,
            };
            observer.on_candidate(&candidate);
            if tracker.offer(&candidate) {
                observer.on_improvement(&candidate);
            }
        }
    }

    let outcome = tracker.finish(config.granularity_steps)?;
    info!(
        evaluated = outcome.evaluated,
        allocation = ?outcome.allocation,
        sharpe = outcome.best.sharpe_ratio,
        "allocation search complete"
    );
    Ok(outcome)
}

/// Load the portfolio's prices once, then run [`optimize`]. Data problems
/// surface before any candidate is evaluated.
pub fn optimize_portfolio(
    data_port: &dyn DataPort,
    calendar: &dyn CalendarPort,
    spec: &PortfolioSpec,
    config: &OptimizerConfig,
    cancel: &CancelToken,
    observer: &mut dyn OptimizationObserver,
) -> Result<OptimizationOutcome, AllocError> {
    let history = PriceHistory::load_cancellable(data_port, calendar, spec, cancel)
        .inspect_err(|e| {
            if e.is_data_error() {
                error!(error = %e, "price data unusable, no allocation evaluated");
            }
        })?;
    optimize(&history, config, cancel, observer)
}
