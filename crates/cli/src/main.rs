//! crypto-bot CLI.
//!
//! Commands:
//! - `backtest`: replay a bar CSV through the SMA/EMA strategy and print
//!   the order journal and profit summary

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cryptobot_backtest::{Backtest, BacktestReport};
use cryptobot_core::{Config, FillTiming};
use cryptobot_ingestion::CsvBarReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cryptobot", about = "Bar-by-bar backtester for an SMA/EMA crypto strategy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a bar file and report orders and profit.
    Backtest(BacktestArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FillTimingArg {
    NextClose,
    NextOpen,
}

impl From<FillTimingArg> for FillTiming {
    fn from(arg: FillTimingArg) -> Self {
        match arg {
            FillTimingArg::NextClose => FillTiming::NextClose,
            FillTimingArg::NextOpen => FillTiming::NextOpen,
        }
    }
}

/// Flags left unset fall back to the config file, then to built-in defaults.
#[derive(Args, Debug)]
struct BacktestArgs {
    /// Bar CSV (timestamp, open, high, low, close, volume, ...).
    #[arg(short, long)]
    data: PathBuf,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting cash [default: 100.0].
    #[arg(short, long)]
    starting_cash: Option<f64>,

    /// Commission as a fraction of traded value [default: 0.075].
    #[arg(long)]
    commission: Option<f64>,

    /// Units per buy order [default: 1.0].
    #[arg(long)]
    order_size: Option<f64>,

    /// SMA period in bars [default: 30].
    #[arg(long)]
    sma_period: Option<usize>,

    /// EMA period in bars [default: 30].
    #[arg(long)]
    ema_period: Option<usize>,

    /// Relative distance from the SMA that triggers a sell [default: 0.10].
    #[arg(long)]
    sell_deviation: Option<f64>,

    /// Price used to fill an order on the bar after submission.
    #[arg(long, value_enum)]
    fill_timing: Option<FillTimingArg>,

    /// The CSV has no header row.
    #[arg(long, default_value_t = false)]
    no_header: bool,

    /// Print the full report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl BacktestArgs {
    /// Load the base config and apply explicit flags on top.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(cash) = self.starting_cash {
            config.broker.starting_cash = cash;
        }
        if let Some(rate) = self.commission {
            config.broker.commission_rate = rate;
        }
        if let Some(timing) = self.fill_timing {
            config.broker.fill_timing = timing.into();
        }
        if let Some(size) = self.order_size {
            config.strategy.order_size = size;
        }
        if let Some(deviation) = self.sell_deviation {
            config.strategy.sell_deviation = deviation;
        }
        if let Some(period) = self.sma_period {
            config.indicators.sma_period = period;
        }
        if let Some(period) = self.ema_period {
            config.indicators.ema_period = period;
        }
        if self.no_header {
            config.data.has_headers = false;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "cryptobot_cli=info,cryptobot_backtest=info,cryptobot_ingestion=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Backtest(args) => run_backtest_cmd(&args),
    }
}

fn run_backtest_cmd(args: &BacktestArgs) -> Result<()> {
    let config = args.resolve_config()?;
    info!(
        sma = config.indicators.sma_period,
        ema = config.indicators.ema_period,
        cash = config.broker.starting_cash,
        commission = config.broker.commission_rate,
        "configuration loaded"
    );

    let bars = CsvBarReader::new(config.data.clone())
        .read_path(&args.data)
        .with_context(|| format!("failed to read bars from {}", args.data.display()))?;

    let report = Backtest::new(config)?.run(&bars);

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

/// Journal lines followed by the summary block.
fn render_report(report: &BacktestReport) -> String {
    let mut out = String::new();
    for event in &report.events {
        out.push_str(&event.journal_line());
        out.push('\n');
    }
    if let Some(order) = &report.unfilled_order {
        out.push_str(&format!(
            "{} order submitted on bar {} was never filled\n",
            order.side.label(),
            order.submitted_bar
        ));
    }

    let summary = &report.summary;
    out.push_str(&format!("Starting Portfolio Value: {:.2}\n", summary.start_value));
    out.push_str(&format!("Final Portfolio Value: {:.2}\n", summary.end_value));
    out.push_str(&format!(
        "Profit: {:.2} | {:+.2}%\n",
        summary.profit, summary.profit_pct
    ));

    let m = &report.metrics;
    out.push_str("\n=== Trades ===\n");
    out.push_str(&format!(
        "Total: {} (won {}, lost {}, win rate {:.1}%)\n",
        m.total_trades,
        m.winning_trades,
        m.losing_trades,
        m.win_rate * 100.0
    ));
    out.push_str(&format!(
        "Net P&L: {:.2} | Commission: {:.2}\n",
        m.net_pnl, m.total_commission
    ));
    out.push_str(&format!(
        "Largest win: {:.2} | Largest loss: {:.2}\n",
        m.largest_win, m.largest_loss
    ));
    out.push_str(&format!(
        "Max drawdown: {:.2} ({:.2}%) | Sharpe (per bar): {:.3}\n",
        m.max_drawdown, m.max_drawdown_pct, m.sharpe_ratio
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use cryptobot_core::{Bar, TIMESTAMP_FORMAT};
    use cryptobot_ingestion::BarSequence;
    use std::io::Write;

    fn parse(args: &[&str]) -> BacktestArgs {
        let mut argv = vec!["cryptobot", "backtest", "--data", "bars.csv"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Backtest(args) => args,
        }
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).resolve_config().unwrap();
        assert_eq!(config.broker.starting_cash, 100.0);
        assert_eq!(config.broker.commission_rate, 0.075);
        assert_eq!(config.broker.fill_timing, FillTiming::NextClose);
        assert_eq!(config.indicators.sma_period, 30);
        assert!(config.data.has_headers);
    }

    #[test]
    fn test_flags_override() {
        let config = parse(&[
            "--starting-cash",
            "250",
            "--sma-period",
            "10",
            "--fill-timing",
            "next-open",
            "--no-header",
        ])
        .resolve_config()
        .unwrap();
        assert_eq!(config.broker.starting_cash, 250.0);
        assert_eq!(config.indicators.sma_period, 10);
        assert_eq!(config.indicators.ema_period, 30);
        assert_eq!(config.broker.fill_timing, FillTiming::NextOpen);
        assert!(!config.data.has_headers);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"broker": {{"starting_cash": 500.0, "commission_rate": 0.01}}}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = parse(&["--config", &path, "--commission", "0.02"])
            .resolve_config()
            .unwrap();
        assert_eq!(config.broker.starting_cash, 500.0);
        assert_eq!(config.broker.commission_rate, 0.02);
    }

    #[test]
    fn test_short_flags() {
        let argv = ["cryptobot", "backtest", "-d", "btc.csv", "-s", "42.5"];
        let Commands::Backtest(args) = Cli::parse_from(argv).command;
        assert_eq!(args.data, PathBuf::from("btc.csv"));
        assert_eq!(args.starting_cash, Some(42.5));
        assert_eq!(args.resolve_config().unwrap().broker.starting_cash, 42.5);
    }

    #[test]
    fn test_invalid_override_rejected() {
        assert!(parse(&["--commission", "1.5"]).resolve_config().is_err());
        assert!(parse(&["--ema-period", "0"]).resolve_config().is_err());
    }

    #[test]
    fn test_render_summary_block() {
        let bars: Vec<Bar> = [60.0, 40.0, 40.0, 48.0, 44.0, 48.0, 50.0, 60.0, 60.0]
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                ts: NaiveDateTime::parse_from_str(&format!("2021-12-21 {i:02}:00:00"), TIMESTAMP_FORMAT)
                    .unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect();
        let config = parse(&["--sma-period", "3", "--ema-period", "3"])
            .resolve_config()
            .unwrap();
        let report = Backtest::new(config)
            .unwrap()
            .run(&BarSequence::new(bars).unwrap());

        let text = render_report(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2021-12-21 06:00:00, BUY EXECUTED, 50.00");
        assert_eq!(lines[1], "2021-12-21 08:00:00, SELL EXECUTED, 60.00");
        assert_eq!(lines[2], "Starting Portfolio Value: 100.00");
        assert_eq!(lines[3], "Final Portfolio Value: 101.75");
        assert_eq!(lines[4], "Profit: 1.75 | +1.75%");
    }
}
