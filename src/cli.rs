//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::tracing_observer::TracingObserver;
use crate::domain::config_validation::{validate_screener_config, MAX_WORKERS};
use crate::domain::error::ScreenerError;
use crate::domain::result::ScreenResult;
use crate::domain::screener::{BatchReport, Screener};
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::domain::universe::{list_sectors, load_universe, parse_codes, with_suffix};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_SECTOR_DIR: &str = "sectors";
pub const DEFAULT_SUFFIX: &str = ".JK";
pub const DEFAULT_TOP: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "idxscreen", about = "Technical-rule stock screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen a sector or a list of tickers with one strategy
    Screen(ScreenArgs),
    /// List the sector files available for screening
    Sectors {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print every strategy with its rules
    Strategies,
    /// Validate a screener configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct ScreenArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// L, S or G (or liquidity_trend, two_stage, price_gap)
    #[arg(short, long)]
    pub strategy: Option<StrategyKind>,
    #[arg(long)]
    pub sector: Option<String>,
    /// Comma-separated codes, screened instead of a sector file
    #[arg(long)]
    pub tickers: Option<String>,
    /// Read bars from `<dir>/<TICKER>.csv` instead of the configured source
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub top: Option<usize>,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(short, long)]
    pub verbose: bool,
    #[arg(long)]
    pub no_export: bool,
}

/// Settings for one screening run after merging flags over config.
#[derive(Debug, Clone)]
pub struct ScreenOptions {
    pub strategy: StrategyKind,
    pub output_dir: PathBuf,
    pub top: usize,
    pub workers: usize,
    pub export: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Screen(args) => run_screen(&args),
        Command::Sectors { config, dir } => run_sectors(config.as_deref(), dir.as_deref()),
        Command::Strategies => run_strategies(),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `--verbose` and the
/// configured level. Safe to call more than once.
pub fn init_logging(verbose: bool, level: Option<&str>) {
    let default = if verbose {
        "debug"
    } else {
        level.unwrap_or("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenerError> {
    FileConfigAdapter::from_file(path).map_err(|e| ScreenerError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, ScreenerError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn fail(err: &ScreenerError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn resolve_options(
    args: &ScreenArgs,
    config: &dyn ConfigPort,
) -> Result<ScreenOptions, ScreenerError> {
    let strategy = match args.strategy {
        Some(kind) => kind,
        None => match config.get_string("screener", "strategy") {
            Some(s) => s.parse::<StrategyKind>().map_err(|reason| ScreenerError::ConfigInvalid {
                section: "screener".into(),
                key: "strategy".into(),
                reason,
            })?,
            None => StrategyKind::LiquidityTrend,
        },
    };

    let output_dir = args
        .output
        .clone()
        .or_else(|| config.get_string("output", "dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let top = args
        .top
        .unwrap_or_else(|| config.get_int("screener", "top", DEFAULT_TOP as i64).max(0) as usize);
    let workers = match args.workers {
        Some(n) => n as i64,
        None => config.get_int("screener", "workers", 1),
    };
    if !(1..=MAX_WORKERS).contains(&workers) {
        return Err(ScreenerError::ConfigInvalid {
            section: "screener".into(),
            key: "workers".into(),
            reason: format!("workers must be between 1 and {}, got {}", MAX_WORKERS, workers),
        });
    }

    Ok(ScreenOptions {
        strategy,
        output_dir,
        top,
        workers: workers as usize,
        export: !args.no_export && config.get_bool("output", "export", true),
    })
}

/// Tickers from `--tickers`, else from the sector file named by `--sector`
/// or `[screener] sector`.
pub fn resolve_tickers(
    args: &ScreenArgs,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, ScreenerError> {
    let suffix = config
        .get_string("screener", "ticker_suffix")
        .unwrap_or_else(|| DEFAULT_SUFFIX.to_string());

    if let Some(list) = &args.tickers {
        let codes = parse_codes(list)?;
        return Ok(codes.iter().map(|c| with_suffix(c, &suffix)).collect());
    }

    let sector = args
        .sector
        .clone()
        .or_else(|| config.get_string("screener", "sector"))
        .ok_or_else(|| ScreenerError::ConfigMissing {
            section: "screener".into(),
            key: "sector".into(),
        })?;
    let universe = load_universe(&sector_dir(config), &sector, &suffix)?;
    info!(sector = %universe.sector, count = universe.count(), "universe loaded");
    Ok(universe.tickers)
}

fn sector_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("screener", "sector_dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SECTOR_DIR))
}

pub fn build_data_port(
    config: &dyn ConfigPort,
    data_dir: Option<&Path>,
) -> Result<Box<dyn DataPort + Sync>, ScreenerError> {
    if let Some(dir) = data_dir {
        return Ok(Box::new(CsvAdapter::new(dir.to_path_buf())));
    }

    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "yahoo".to_string())
        .to_lowercase();
    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "dir")
                .ok_or_else(|| ScreenerError::ConfigMissing {
                    section: "data".into(),
                    key: "dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "yahoo")]
        "yahoo" => {
            use crate::adapters::yahoo_adapter::{YahooAdapter, YahooConfig};
            Ok(Box::new(YahooAdapter::new(YahooConfig::from_config(config))?))
        }
        #[cfg(not(feature = "yahoo"))]
        "yahoo" => Err(ScreenerError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "built without the yahoo feature".into(),
        }),
        other => Err(ScreenerError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{}'", other),
        }),
    }
}

/// Screens `tickers`, prints the summary and exports a non-empty result set.
/// Returns the batch and the report path, if one was written.
pub fn run_screen_pipeline(
    options: &ScreenOptions,
    tickers: &[String],
    data_port: &(dyn DataPort + Sync),
    report: &dyn ReportPort,
) -> Result<(BatchReport, Option<PathBuf>), ScreenerError> {
    let strategy = Strategy::for_kind(options.strategy);
    eprintln!(
        "Scanning {} stocks with {} ({})...",
        tickers.len(),
        strategy.name,
        strategy.kind.code()
    );

    let observer = TracingObserver;
    let screener =
        Screener::new(strategy, data_port, &observer).with_workers(options.workers);
    let batch = screener.screen_universe(tickers);
    let strategy = screener.strategy();

    if !batch.skipped.is_empty() {
        let summary: Vec<String> = batch
            .skipped_by_kind()
            .iter()
            .map(|(kind, n)| format!("{}={}", kind, n))
            .collect();
        eprintln!("Skipped {} ({})", batch.skipped.len(), summary.join(", "));
    }

    if batch.results.is_empty() {
        println!("No stocks passed the filter.");
        return Ok((batch, None));
    }

    println!("\nTop Results:");
    print!("{}", render_table(&batch.results, strategy, options.top));

    let written = if options.export {
        let path = report.write(&batch.results, strategy, &options.output_dir)?;
        eprintln!("\nResults written to: {}", path.display());
        Some(path)
    } else {
        None
    };
    Ok((batch, written))
}

/// Fixed-width table of the first `top` results with every report column.
pub fn render_table(results: &[ScreenResult], strategy: &Strategy, top: usize) -> String {
    let mut header = vec!["ticker".to_string()];
    header.extend(strategy.columns.iter().map(|c| c.name.clone()));

    let rows: Vec<Vec<String>> = results
        .iter()
        .take(top)
        .map(|r| {
            let mut row = vec![r.ticker.clone()];
            row.extend(strategy.columns.iter().map(|c| {
                r.value(&c.name).map(|v| v.to_string()).unwrap_or_default()
            }));
            row
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:>w$}", cell, w = *w))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(&header[..]);
    for row in &rows {
        out.push_str(&line(&row[..]));
    }
    out
}

fn run_screen(args: &ScreenArgs) -> ExitCode {
    let config = match load_optional_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    init_logging(
        args.verbose,
        config.get_string("logging", "level").as_deref(),
    );

    if args.config.is_some() {
        if let Err(e) = validate_screener_config(&config) {
            return fail(&e);
        }
    }

    let options = match resolve_options(args, &config) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };
    let tickers = match resolve_tickers(args, &config) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let data_port = match build_data_port(&config, args.data_dir.as_deref()) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    match run_screen_pipeline(&options, &tickers, data_port.as_ref(), &CsvReportAdapter::new()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_sectors(config_path: Option<&Path>, dir: Option<&Path>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    init_logging(false, config.get_string("logging", "level").as_deref());

    let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| sector_dir(&config));
    match list_sectors(&dir) {
        Ok(sectors) if sectors.is_empty() => {
            eprintln!("No sector files found in {}", dir.display());
            ExitCode::SUCCESS
        }
        Ok(sectors) => {
            for sector in &sectors {
                println!("{}", sector);
            }
            eprintln!("{} sectors found", sectors.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&ScreenerError::from(e)),
    }
}

fn run_strategies() -> ExitCode {
    print!("{}", describe_strategies());
    ExitCode::SUCCESS
}

pub fn describe_strategies() -> String {
    let mut out = String::new();
    for kind in StrategyKind::ALL {
        let s = Strategy::for_kind(kind);
        out.push_str(&format!("[{}] {} ({})\n", kind.code(), s.name, kind));
        out.push_str(&format!("  {}\n", s.description));
        out.push_str(&format!(
            "  lookback: {} months, minimum history: {} bars, sorted by {}\n",
            s.lookback_months, s.min_history, s.sort_by
        ));
        out.push_str("  indicators:\n");
        for spec in &s.indicators {
            out.push_str(&format!("    {}\n", spec));
        }
        out.push_str("  rules:\n");
        for rule in &s.rules {
            out.push_str(&format!("    {}\n", rule));
        }
        out.push('\n');
    }
    out
}

/// Rejects a strategy whose rules or windows do not fit its own definition.
pub fn check_strategy(strategy: &Strategy) -> Result<(), ScreenerError> {
    strategy
        .validate()
        .map_err(|reason| ScreenerError::ConfigInvalid {
            section: "screener".into(),
            key: "strategy".into(),
            reason: format!("strategy {} is inconsistent: {}", strategy.kind, reason),
        })
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    if let Err(e) = validate_screener_config(&config) {
        return fail(&e);
    }

    let args = ScreenArgs::default();
    let options = match resolve_options(&args, &config) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };
    let strategy = Strategy::for_kind(options.strategy);
    if let Err(e) = check_strategy(&strategy) {
        return fail(&e);
    }
    eprintln!("  strategy: {} ({})", strategy.name, strategy.kind.code());
    eprintln!("  workers:  {}", options.workers);
    eprintln!("  output:   {}", options.output_dir.display());
    eprintln!("  export:   {}", if options.export { "yes" } else { "no" });

    if config.get_string("screener", "sector").is_some() {
        match resolve_tickers(&args, &config) {
            Ok(tickers) => eprintln!("  universe: {} tickers", tickers.len()),
            Err(e) => return fail(&e),
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
