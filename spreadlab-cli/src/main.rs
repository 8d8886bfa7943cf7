//! SpreadLab CLI: run, sweep and generate commands.
//!
//! Commands:
//! - `run`: backtest one pair from a TOML config and/or flags
//! - `sweep`: grid over z-score windows and thresholds, sorted by Sharpe
//! - `generate`: write synthetic candles into the CSV store

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use spreadlab_core::data::{CsvStore, PriceProvider, SymbolMap, SyntheticProvider};
use spreadlab_runner::{
    build_provider, format_report, format_sweep_table, load_options, load_pair,
    run_backtest_from_data, run_sweep, save_artifacts, BacktestConfig, ParamGrid,
};

#[derive(Parser)]
#[command(name = "spreadlab", about = "SpreadLab pairs-trading spread backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one pair and write artifacts.
    Run(ConfigArgs),
    /// Run a parameter grid on one loaded pair.
    Sweep {
        #[command(flatten)]
        args: ConfigArgs,

        /// Comma-separated z-score periods. Defaults to 1d,3d,7d,14d.
        #[arg(long, value_delimiter = ',')]
        periods: Vec<String>,

        /// Comma-separated upper thresholds. Defaults to 1.5,2.0,2.5.
        #[arg(long, value_delimiter = ',')]
        thresholds: Vec<f64>,

        /// Comma-separated method selectors (3 = ratio, 2 = OLS).
        #[arg(long, value_delimiter = ',')]
        methods: Vec<u8>,
    },
    /// Write synthetic 1-minute candles for a pair into the CSV store.
    Generate {
        #[arg(long, default_value = "BTC")]
        c0: String,

        #[arg(long, default_value = "XMR")]
        c1: String,

        #[arg(short = 'f', long, default_value = "2018-07-01")]
        fromdate: String,

        #[arg(short = 't', long, default_value = "2018-09-01")]
        todate: String,

        /// CSV store root.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// TOML symbol map merged over the built-in one.
        #[arg(long)]
        symbols: Option<PathBuf>,
    },
}

/// Flags shared by `run` and `sweep`. Each one overrides the config file.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset A.
    #[arg(long)]
    c0: Option<String>,

    /// Asset B.
    #[arg(long)]
    c1: Option<String>,

    /// Start date (YYYY-MM-DD).
    #[arg(short = 'f', long)]
    fromdate: Option<String>,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(short = 't', long)]
    todate: Option<String>,

    /// Spread method: 3 = ratio, 2 = OLS regression.
    #[arg(long)]
    ols: Option<u8>,

    /// Bar size in minutes.
    #[arg(long)]
    compression: Option<u32>,

    /// Z-score window as a period, e.g. 7d or 36h.
    #[arg(long, alias = "spread_period")]
    spread_period: Option<String>,

    /// Upper z-score threshold.
    #[arg(long)]
    threshold: Option<f64>,

    /// Lower z-score threshold. Defaults to -threshold.
    #[arg(long, allow_negative_numbers = true)]
    lower: Option<f64>,

    /// Commission as a fraction of traded value.
    #[arg(long)]
    commission: Option<f64>,

    /// Target weight per leg.
    #[arg(long, alias = "order_pct")]
    order_pct: Option<f64>,

    /// Starting cash.
    #[arg(long)]
    cash: Option<f64>,

    /// Annual risk-free rate for the Sharpe ratio.
    #[arg(long, alias = "risk_free")]
    risk_free: Option<f64>,

    /// Steps between order submission and fill.
    #[arg(long, alias = "fill_delay")]
    fill_delay: Option<usize>,

    /// Artifact base name.
    #[arg(long)]
    filename: Option<String>,

    /// Artifact directory.
    #[arg(long, alias = "output_dir")]
    output_dir: Option<PathBuf>,

    /// Skip the per-step CSV.
    #[arg(long)]
    noplot: bool,

    /// Evaluate step by step instead of vectorized.
    #[arg(long)]
    runnext: bool,

    /// Align on A's clock instead of an inner join.
    #[arg(long)]
    oldsync: bool,

    /// Flatten both legs at the last step.
    #[arg(long)]
    liquidate: bool,

    /// CSV store root.
    #[arg(long, alias = "data_dir")]
    data_dir: Option<PathBuf>,

    /// TOML symbol map merged over the built-in one.
    #[arg(long)]
    symbols: Option<PathBuf>,

    /// Use synthetic prices instead of the CSV store.
    #[arg(long)]
    synthetic: bool,

    /// Log every transition at info level.
    #[arg(long)]
    printout: bool,
}

impl ConfigArgs {
    /// Load the config file (or defaults) and apply flags on top.
    fn into_config(self) -> Result<BacktestConfig> {
        let mut config = match &self.config {
            Some(path) => BacktestConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => BacktestConfig::default(),
        };

        let pair = &mut config.pair;
        override_with(&mut pair.c0, self.c0);
        override_with(&mut pair.c1, self.c1);
        override_with(&mut pair.fromdate, self.fromdate);
        override_with(&mut pair.todate, self.todate);
        override_with(&mut pair.compression, self.compression);
        pair.oldsync |= self.oldsync;

        let strategy = &mut config.strategy;
        override_with(&mut strategy.ols, self.ols);
        override_with(&mut strategy.spread_period, self.spread_period);
        override_with(&mut strategy.threshold, self.threshold);
        override_with(&mut strategy.order_pct, self.order_pct);
        if self.lower.is_some() {
            strategy.lower = self.lower;
        }

        let broker = &mut config.broker;
        override_with(&mut broker.cash, self.cash);
        override_with(&mut broker.commission, self.commission);
        override_with(&mut broker.fill_delay, self.fill_delay);

        let run = &mut config.run;
        override_with(&mut run.risk_free, self.risk_free);
        override_with(&mut run.filename, self.filename);
        override_with(&mut run.output_dir, self.output_dir);
        run.noplot |= self.noplot;
        run.runnext |= self.runnext;
        run.liquidate |= self.liquidate;
        run.printout |= self.printout;

        let data = &mut config.data;
        override_with(&mut data.data_dir, self.data_dir);
        if self.symbols.is_some() {
            data.symbols = self.symbols;
        }
        data.synthetic |= self.synthetic;

        Ok(config)
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Run(args) => run_backtest_cmd(args),
        Commands::Sweep {
            args,
            periods,
            thresholds,
            methods,
        } => run_sweep_cmd(args, periods, thresholds, methods),
        Commands::Generate {
            c0,
            c1,
            fromdate,
            todate,
            data_dir,
            symbols,
        } => run_generate_cmd(&c0, &c1, &fromdate, &todate, data_dir, symbols),
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_backtest_cmd(args: ConfigArgs) -> Result<()> {
    let config = args.into_config()?;
    let resolved = config.resolve().context("invalid configuration")?;
    println!("{resolved:#?}");

    let provider = build_provider(&config).context("building price provider")?;
    let loaded = load_pair(
        provider.as_ref(),
        &resolved.c0,
        &resolved.c1,
        &load_options(&resolved),
    )
    .with_context(|| format!("loading {}/{}", resolved.c0, resolved.c1))?;

    let result = run_backtest_from_data(&config, &resolved, &loaded)?;
    print!("{}", format_report(&result));

    let paths = save_artifacts(
        &result,
        &config.run.output_dir,
        &config.run.filename,
        !config.run.noplot,
    )?;
    println!("Summary saved to: {}", paths.summary.display());
    if let Some(steps) = &paths.steps {
        println!("Steps saved to:   {}", steps.display());
    }
    Ok(())
}

fn run_sweep_cmd(
    args: ConfigArgs,
    periods: Vec<String>,
    thresholds: Vec<f64>,
    methods: Vec<u8>,
) -> Result<()> {
    let base = args.into_config()?;
    let resolved = base.resolve().context("invalid configuration")?;

    let mut grid = ParamGrid::default_grid();
    if !periods.is_empty() {
        grid.spread_periods = periods;
    }
    if !thresholds.is_empty() {
        grid.thresholds = thresholds;
    }
    if !methods.is_empty() {
        grid.methods = methods;
    }
    if grid.size() == 0 {
        bail!("empty parameter grid");
    }

    let provider = build_provider(&base).context("building price provider")?;
    let loaded = load_pair(
        provider.as_ref(),
        &resolved.c0,
        &resolved.c1,
        &load_options(&resolved),
    )
    .with_context(|| format!("loading {}/{}", resolved.c0, resolved.c1))?;

    tracing::info!(points = grid.size(), steps = loaded.pair.len(), "starting sweep");
    let results = run_sweep(&grid, &base, &loaded)?;

    print!("{}", format_sweep_table(&results));
    if loaded.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    Ok(())
}

fn run_generate_cmd(
    c0: &str,
    c1: &str,
    fromdate: &str,
    todate: &str,
    data_dir: PathBuf,
    symbols: Option<PathBuf>,
) -> Result<()> {
    let start = NaiveDate::parse_from_str(fromdate, "%Y-%m-%d")
        .with_context(|| format!("invalid --fromdate '{fromdate}'"))?;
    let end = NaiveDate::parse_from_str(todate, "%Y-%m-%d")
        .with_context(|| format!("invalid --todate '{todate}'"))?;
    if end < start {
        bail!("--todate {todate} is before --fromdate {fromdate}");
    }

    let mut map = SymbolMap::default_crypto();
    if let Some(path) = &symbols {
        map.merge(SymbolMap::from_file(path)?);
    }
    let store = CsvStore::new(data_dir, map);
    let synthetic = SyntheticProvider::new();

    for symbol in [c0, c1] {
        let bars = synthetic.fetch(symbol, start, end)?;
        let path = store.write(symbol, &bars)?;
        println!("{symbol}: {} bars -> {}", bars.len(), path.display());
    }
    Ok(())
}
