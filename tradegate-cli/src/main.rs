//! TradeGate CLI: run the backtest suite and inspect configuration.
//!
//! Commands:
//! - `backtest`: run baseline + AI modes over CSV or synthetic bars, write artifacts
//! - `status`: print the effective (validated) configuration

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tradegate_core::ai::ProviderKind;
use tradegate_core::domain::SegmentSpec;
use tradegate_core::time::parse_timestamp;
use tradegate_runner::{
    build_provider, load_market_data, run_suite, synthetic_market_data, write_backtest_artifacts,
    BacktestReport, MarketData, SuiteConfig,
};

const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Parser)]
#[command(
    name = "tradegate",
    about = "TradeGate CLI: rules vs AI-gated swing backtests with a go/no-go review"
)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Console, global = true)]
    log_format: LogFormat,

    /// Log level filter (overridden by RUST_LOG when set).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Console,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every experiment mode and evaluate the go/no-go gate.
    Backtest {
        /// Path to a TOML suite config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fast (entry timeframe) OHLCV CSV.
        #[arg(long, requires = "slow", conflicts_with = "synthetic")]
        fast: Option<PathBuf>,

        /// Slow (trend timeframe) OHLCV CSV.
        #[arg(long, requires = "fast")]
        slow: Option<PathBuf>,

        /// Generate this many seeded synthetic fast bars instead of reading CSV.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Named segment, `name=START..END` (repeatable). Replaces config segments.
        #[arg(long = "segment")]
        segments: Vec<String>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Source tag recorded in the report.
        #[arg(long)]
        source: Option<String>,
    },
    /// Print the effective configuration.
    Status {
        /// Path to a TOML suite config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level)?;

    match cli.command {
        Commands::Backtest {
            config,
            fast,
            slow,
            synthetic,
            segments,
            output_dir,
            source,
        } => run_backtest_cmd(
            config.as_deref(),
            fast.as_deref(),
            slow.as_deref(),
            synthetic,
            &segments,
            &output_dir,
            source,
        ),
        Commands::Status { config } => run_status(config.as_deref()),
    }
}

fn init_logging(format: LogFormat, level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{level}'"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Console => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}

fn load_config(path: Option<&Path>) -> Result<SuiteConfig> {
    match path {
        Some(path) => SuiteConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let config = SuiteConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn run_backtest_cmd(
    config_path: Option<&Path>,
    fast: Option<&Path>,
    slow: Option<&Path>,
    synthetic: Option<usize>,
    segment_args: &[String],
    output_dir: &Path,
    source: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;

    let synthetic_run = synthetic.is_some();
    let mut data: MarketData = match (fast, slow, synthetic) {
        (Some(fast), Some(slow), None) => load_market_data(fast, slow)?,
        (None, None, Some(count)) => synthetic_market_data(&config.backtest.symbol, count),
        _ => bail!("provide either --fast and --slow, or --synthetic <bars>"),
    };
    if let Some(source) = source {
        data.source = source;
    }

    let segments = if segment_args.is_empty() {
        config.segments.clone()
    } else {
        segment_args
            .iter()
            .map(|raw| parse_segment_arg(raw))
            .collect::<Result<Vec<_>>>()?
    };

    let api_key = match config.ai.provider {
        ProviderKind::Remote => std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
        ProviderKind::Heuristic => None,
    };
    let provider = build_provider(&config.ai, api_key)?;

    let report = run_suite(&config, &data, &provider, &segments)?;
    print_summary(&report, synthetic_run);

    write_backtest_artifacts(&report, output_dir)?;
    println!("Artifacts saved to: {}", output_dir.display());

    Ok(())
}

/// `name=START..END`, timestamps in any format the CSV loader accepts.
fn parse_segment_arg(raw: &str) -> Result<SegmentSpec> {
    let Some((name, range)) = raw.split_once('=') else {
        bail!("segment '{raw}' must look like name=START..END");
    };
    let Some((start, end)) = range.split_once("..") else {
        bail!("segment '{raw}' must look like name=START..END");
    };
    let start = parse_timestamp(start).with_context(|| format!("segment '{name}' start"))?;
    let end = parse_timestamp(end).with_context(|| format!("segment '{name}' end"))?;
    Ok(SegmentSpec::new(name.trim(), start, end)?)
}

fn run_status(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let key_present = std::env::var(API_KEY_ENV).map(|k| !k.is_empty()).unwrap_or(false);

    println!("=== Effective Configuration ===");
    match config_path {
        Some(path) => println!("Config file:    {}", path.display()),
        None => println!("Config file:    (defaults)"),
    }
    println!("API key:        {}", if key_present { "set" } else { "not set" });
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

fn print_summary(report: &BacktestReport, synthetic: bool) {
    println!();
    println!("=== Backtest Suite ===");
    println!("Symbol:         {}", report.symbol);
    println!("Source:         {}", report.source);
    println!("Dataset hash:   {}", report.dataset_hash);
    println!("Segments:       {}", report.segments.len());
    println!();
    println!("--- Modes ---");
    for (mode, result) in &report.experiments {
        let m = &result.metrics;
        println!(
            "{:<17} trades={:<4} return={:>7.2}% max_dd={:>6.2}% expectancy={:>8.2} win={:>5.1}% degraded={}",
            mode.as_str(),
            m.trade_count,
            m.total_return_pct,
            m.max_drawdown_pct,
            m.expectancy_per_trade,
            m.win_rate_pct,
            result.degraded_decisions(),
        );
    }
    println!();
    let verdict = &report.go_no_go;
    println!("Decision:       {}", if verdict.go { "GO" } else { "NO-GO" });
    if let Some(mode) = verdict.selected_ai_mode {
        println!("Selected mode:  {mode}");
    }
    if let Some(reason) = &verdict.reason {
        println!("Reason:         {reason}");
    }
    if let Some(checks) = &verdict.checks {
        for (key, passed) in checks.entries() {
            println!("  {key}: {}", if passed { "PASS" } else { "FAIL" });
        }
    }
    if synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}
