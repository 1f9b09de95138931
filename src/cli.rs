//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::weekday_calendar::WeekdayCalendar;
use crate::domain::allocation::composition_count;
use crate::domain::config_validation::{
    read_data_source, read_date, read_granularity_steps, read_non_negative, read_session_time,
    read_symbols, validate_config, validate_data_config, validate_optimizer_config,
};
use crate::domain::date_range::DateRange;
use crate::domain::error::AllocError;
use crate::domain::evaluator::simulate;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::optimizer::{
    optimize_portfolio, CancelToken, OptimizationOutcome, OptimizerConfig, TracingObserver,
};
use crate::domain::portfolio::PortfolioSpec;
use crate::domain::symbols::parse_symbols;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "allocopt", about = "Sharpe-optimal portfolio allocation search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Flags that override the `[portfolio]` section.
#[derive(Args, Debug, Clone, Default)]
pub struct PortfolioOverrides {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last day of the window (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Comma-separated symbols, e.g. AAPL,GLD,GOOG
    #[arg(long)]
    pub symbols: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search every allocation for the best Sharpe ratio
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        portfolio: PortfolioOverrides,
        /// Weight steps per unit (10 means multiples of 0.1)
        #[arg(long)]
        steps: Option<u32>,
        #[arg(long)]
        threads: Option<usize>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Evaluate a single allocation
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated weights in symbol order, e.g. 0.4,0.6
        #[arg(short, long)]
        weights: String,
        #[command(flatten)]
        portfolio: PortfolioOverrides,
    },
    /// List symbols known to the data source
    Symbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Optimize {
            config,
            portfolio,
            steps,
            threads,
            timeout_secs,
        } => run_optimize(&config, &portfolio, steps, threads, timeout_secs),
        Command::Evaluate {
            config,
            weights,
            portfolio,
        } => run_evaluate(&config, &weights, &portfolio),
        Command::Symbols { config } => run_symbols(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn fail(err: &AllocError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Window, symbols and session time from `[portfolio]`, with CLI overrides
/// taking precedence.
pub fn build_portfolio_spec(
    config: &dyn ConfigPort,
    overrides: &PortfolioOverrides,
) -> Result<PortfolioSpec, AllocError> {
    let start = match overrides.start {
        Some(d) => d,
        None => read_date(config, "portfolio", "start_date")?,
    };
    let end = match overrides.end {
        Some(d) => d,
        None => read_date(config, "portfolio", "end_date")?,
    };
    let range = DateRange::new(start, end)?;
    let symbols = resolve_symbols(overrides.symbols.as_deref(), config)?;
    let session_time = read_session_time(config)?;

    Ok(PortfolioSpec::new(range, symbols)?.with_session_time(session_time))
}

pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, AllocError> {
    match symbols_override {
        Some(raw) => parse_symbols(raw).map_err(|e| AllocError::invalid(e.to_string())),
        None => read_symbols(config),
    }
}

pub fn build_optimizer_config(
    config: &dyn ConfigPort,
    steps: Option<u32>,
    threads: Option<usize>,
) -> Result<OptimizerConfig, AllocError> {
    let granularity_steps = match steps {
        Some(0) => return Err(AllocError::invalid("--steps must be at least 1")),
        Some(s) => s,
        None => read_granularity_steps(config)?,
    };
    let threads = match threads {
        Some(t) => t,
        None => read_non_negative(config, "optimizer", "threads")? as usize,
    };
    Ok(OptimizerConfig {
        granularity_steps,
        threads,
    })
}

/// A zero timeout means no deadline.
pub fn build_cancel_token(
    config: &dyn ConfigPort,
    timeout_secs: Option<u64>,
) -> Result<CancelToken, AllocError> {
    let secs = match timeout_secs {
        Some(s) => s,
        None => read_non_negative(config, "optimizer", "timeout_secs")?,
    };
    Ok(if secs == 0 {
        CancelToken::new()
    } else {
        CancelToken::with_timeout(Duration::from_secs(secs))
    })
}

pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, AllocError> {
    match read_data_source(config)?.as_str() {
        "sqlite" => open_sqlite(config),
        _ => Ok(Box::new(CsvAdapter::from_config(config)?)),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, AllocError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    Ok(Box::new(SqliteAdapter::from_config(config)?))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, AllocError> {
    Err(AllocError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "sqlite feature is required for source = sqlite".into(),
    })
}

/// Parse `0.4,0.6` into weights. Range and sum checks happen at evaluation.
pub fn parse_weights(raw: &str) -> Result<Vec<f64>, AllocError> {
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<f64>()
                .map_err(|_| AllocError::invalid(format!("invalid weight {token:?}")))
        })
        .collect()
}

/// Everything `optimize` does short of printing.
pub fn optimize_from_config(
    config: &dyn ConfigPort,
    overrides: &PortfolioOverrides,
    steps: Option<u32>,
    threads: Option<usize>,
    timeout_secs: Option<u64>,
) -> Result<(PortfolioSpec, OptimizationOutcome), AllocError> {
    validate_optimizer_config(config)?;
    validate_data_config(config)?;

    let spec = build_portfolio_spec(config, overrides)?;
    let optimizer_config = build_optimizer_config(config, steps, threads)?;
    let cancel = build_cancel_token(config, timeout_secs)?;

    let grid = optimizer_config.granularity_steps;
    if let Some(count) = composition_count(spec.symbol_count(), grid) {
        eprintln!(
            "Searching {} allocations of {} symbols, {}",
            count,
            spec.symbol_count(),
            spec.range
        );
    }

    let calendar = WeekdayCalendar::from_config(config)?;
    let data_port = open_data_port(config)?;

    let outcome = optimize_portfolio(
        data_port.as_ref(),
        &calendar,
        &spec,
        &optimizer_config,
        &cancel,
        &mut TracingObserver,
    )?;
    Ok((spec, outcome))
}

/// Everything `evaluate` does short of printing.
pub fn evaluate_from_config(
    config: &dyn ConfigPort,
    overrides: &PortfolioOverrides,
    weights: &str,
) -> Result<(PortfolioSpec, PerformanceMetrics), AllocError> {
    validate_data_config(config)?;

    let spec = build_portfolio_spec(config, overrides)?;
    let weights = parse_weights(weights)?;
    let calendar = WeekdayCalendar::from_config(config)?;
    let data_port = open_data_port(config)?;

    let metrics = simulate(data_port.as_ref(), &calendar, &spec, &weights)?;
    Ok((spec, metrics))
}

fn print_header(spec: &PortfolioSpec) {
    println!("Start Date:       {}", spec.range.start());
    println!("End Date:         {}", spec.range.end());
    println!("Symbols:          {}", spec.symbols.join(", "));
}

fn print_metrics(metrics: &PerformanceMetrics) {
    println!("Sharpe Ratio:     {:.4}", metrics.sharpe_ratio);
    println!("Volatility:       {:.6}", metrics.volatility);
    println!("Avg Daily Return: {:.6}", metrics.avg_daily_return);
    println!("Cumulative:       {:.4}", metrics.cumulative_return);
}

/// Enough decimals to show every multiple of `1 / granularity_steps` at
/// power-of-ten granularities, and never fewer than two.
pub fn format_allocation(allocation: &[f64], granularity_steps: u32) -> String {
    let mut decimals = 2;
    let mut scale: u64 = 100;
    while scale < u64::from(granularity_steps) {
        scale *= 10;
        decimals += 1;
    }
    allocation
        .iter()
        .map(|w| format!("{w:.decimals$}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_optimize(
    config_path: &Path,
    overrides: &PortfolioOverrides,
    steps: Option<u32>,
    threads: Option<usize>,
    timeout_secs: Option<u64>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let (spec, outcome) =
        match optimize_from_config(&config, overrides, steps, threads, timeout_secs) {
            Ok(r) => r,
            Err(e) => return fail(&e),
        };

    if !outcome.improved {
        eprintln!("warning: no allocation had a finite Sharpe ratio");
    }

    println!("=== Optimal Allocation ===");
    print_header(&spec);
    println!(
        "Allocation:       [{}]",
        format_allocation(&outcome.allocation, outcome.granularity_steps)
    );
    print_metrics(&outcome.best);
    println!("Evaluated:        {}", outcome.evaluated);
    ExitCode::SUCCESS
}

fn run_evaluate(config_path: &Path, weights: &str, overrides: &PortfolioOverrides) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let (spec, metrics) = match evaluate_from_config(&config, overrides, weights) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    println!("=== Allocation Performance ===");
    print_header(&spec);
    print_metrics(&metrics);
    ExitCode::SUCCESS
}

fn run_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match open_data_port(&config).and_then(|port| port.list_symbols()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => match resolve_symbols(None, &config).or_else(|_| data_port.list_symbols()) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        },
    };

    for s in &symbols {
        match data_port.get_data_range(s) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", s, count, first, last);
            }
            Ok(None) => eprintln!("{}: no data found", s),
            Err(e) => eprintln!("error querying {}: {}", s, e),
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&config) {
        return fail(&e);
    }
    if let Err(e) = WeekdayCalendar::from_config(&config) {
        return fail(&e);
    }

    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}
