//! CLI definition and dispatch.
//!
//! Every command loads the saved ledger, applies one operation and, if the
//! ledger changed, saves it again. User-facing output goes to stdout; errors
//! are printed as `error: ...` and mapped to an exit code.

use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_snapshot_adapter::JsonSnapshotAdapter;
use crate::adapters::synthetic_price_adapter::SyntheticPriceAdapter;
use crate::domain::error::QuantsimError;
use crate::domain::indicator::{IndicatorParams, IndicatorSnapshot};
use crate::domain::ledger::{PortfolioLedger, WatchlistEntry};
use crate::domain::position::{TradeRequest, TradeSide};
use crate::domain::session_validation::{
    StoreKind, configured_initial_capital, indicator_params_from_config, store_kind,
    validate_initial_capital, validate_session_config,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use crate::ports::snapshot_port::SnapshotPort;

pub const DEFAULT_HISTORY_DAYS: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "quantsim", about = "Paper-trading portfolio simulator")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// State file, overriding [session] state_path
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new session, discarding positions and history
    Init {
        #[arg(long)]
        capital: Option<Decimal>,
    },
    /// Buy shares at a price (current market price when omitted)
    Buy {
        #[arg(short, long)]
        symbol: String,
        #[arg(short = 'n', long)]
        shares: u64,
        #[arg(short, long)]
        price: Option<Decimal>,
    },
    /// Sell shares at a price (current market price when omitted)
    Sell {
        #[arg(short, long)]
        symbol: String,
        #[arg(short = 'n', long)]
        shares: u64,
        #[arg(short, long)]
        price: Option<Decimal>,
    },
    /// Mark positions to new prices, e.g. `revalue AAPL=151.2`; with no
    /// arguments every held symbol is priced from the data source
    Revalue { prices: Vec<String> },
    /// Show cash, totals and positions
    Show,
    /// List transactions, newest first
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show portfolio statistics
    Metrics,
    /// Show the latest indicator values for a symbol
    Indicators {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: usize,
    },
    /// Manage the watchlist
    Watch {
        #[command(subcommand)]
        action: WatchAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum WatchAction {
    Add {
        symbol: String,
        #[arg(long)]
        name: Option<String>,
    },
    Remove {
        symbol: String,
    },
    List,
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn execute(cli: Cli) -> Result<(), QuantsimError> {
    let config = load_config(cli.config.as_ref())?;
    validate_session_config(&config)?;
    let store = open_store(&config, cli.state)?;

    match cli.command {
        Command::Init { capital } => run_init(&config, store.as_ref(), capital),
        Command::Buy {
            symbol,
            shares,
            price,
        } => run_trade(&config, store.as_ref(), TradeSide::Buy, &symbol, shares, price),
        Command::Sell {
            symbol,
            shares,
            price,
        } => run_trade(&config, store.as_ref(), TradeSide::Sell, &symbol, shares, price),
        Command::Revalue { prices } => run_revalue(&config, store.as_ref(), &prices),
        Command::Show => run_show(store.as_ref()),
        Command::History { limit } => run_history(store.as_ref(), limit),
        Command::Metrics => run_metrics(store.as_ref()),
        Command::Indicators { symbol, days } => run_indicators(&config, &symbol, days),
        Command::Watch { action } => run_watch(store.as_ref(), action),
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, QuantsimError> {
    match path {
        Some(p) => FileConfigAdapter::from_file(p),
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn open_store(
    config: &dyn ConfigPort,
    state_override: Option<PathBuf>,
) -> Result<Box<dyn SnapshotPort>, QuantsimError> {
    let kind = store_kind(config)?;
    let default_path = match kind {
        StoreKind::Json => "quantsim.json",
        StoreKind::Sqlite => "quantsim.db",
    };
    let path = state_override
        .or_else(|| config.get_string("session", "state_path").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default_path));
    debug!(?kind, path = %path.display(), "opening state store");

    match kind {
        StoreKind::Json => Ok(Box::new(JsonSnapshotAdapter::new(path))),
        #[cfg(feature = "sqlite")]
        StoreKind::Sqlite => Ok(Box::new(
            crate::adapters::sqlite_snapshot_adapter::SqliteSnapshotAdapter::open(path)?,
        )),
        #[cfg(not(feature = "sqlite"))]
        StoreKind::Sqlite => {
            let _ = path;
            Err(QuantsimError::ConfigInvalid {
                section: "session".to_string(),
                key: "store".to_string(),
                reason: "sqlite feature is required for store = sqlite".to_string(),
            })
        }
    }
}

pub fn build_price_port(config: &dyn ConfigPort) -> Box<dyn PricePort> {
    if config.get_bool("data", "synthetic", false) {
        let seed = config.get_int("data", "seed", 42) as u64;
        Box::new(SyntheticPriceAdapter::new(seed))
    } else {
        let dir = config
            .get_string("data", "dir")
            .unwrap_or_else(|| "prices".to_string());
        Box::new(CsvPriceAdapter::new(PathBuf::from(dir)))
    }
}

pub fn load_ledger(store: &dyn SnapshotPort) -> Result<PortfolioLedger, QuantsimError> {
    match store.load()? {
        Some(snapshot) => PortfolioLedger::restore(snapshot),
        None => Ok(PortfolioLedger::new()),
    }
}

/// Converts a price-port quote into an exact amount.
pub fn market_price(symbol: &str, quote: f64) -> Result<Decimal, QuantsimError> {
    Decimal::from_f64(quote).ok_or_else(|| QuantsimError::PriceData {
        reason: format!("quote {} for {} is not a representable amount", quote, symbol),
    })
}

/// Parses `SYMBOL=PRICE` pairs.
pub fn parse_price_updates(args: &[String]) -> Result<HashMap<String, Decimal>, QuantsimError> {
    let mut updates = HashMap::new();
    for arg in args {
        let (symbol, price) = arg.split_once('=').ok_or_else(|| QuantsimError::PriceData {
            reason: format!("expected SYMBOL=PRICE, got '{}'", arg),
        })?;
        let price: Decimal = price.trim().parse().map_err(|_| QuantsimError::PriceData {
            reason: format!("invalid price in '{}'", arg),
        })?;
        updates.insert(symbol.trim().to_uppercase(), price);
    }
    Ok(updates)
}

/// Watchlist of the saved state, if it can be read at all. Re-initializing
/// replaces everything else, so an unreadable or invalid state is dropped.
fn surviving_watchlist(store: &dyn SnapshotPort) -> Vec<WatchlistEntry> {
    match store.load() {
        Ok(Some(snapshot)) => snapshot.watchlist,
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "discarding unreadable state on init");
            Vec::new()
        }
    }
}

fn run_init(
    config: &dyn ConfigPort,
    store: &dyn SnapshotPort,
    capital: Option<Decimal>,
) -> Result<(), QuantsimError> {
    let capital = match capital {
        Some(c) => c,
        None => configured_initial_capital(config)?,
    };
    validate_initial_capital(capital)?;

    let mut ledger = PortfolioLedger::new();
    for entry in surviving_watchlist(store) {
        ledger.add_to_watchlist(entry);
    }
    ledger.initialize(capital)?;
    store.save(&ledger.snapshot())?;

    println!("Initialized portfolio with {:.2} cash", capital);
    Ok(())
}

fn run_trade(
    config: &dyn ConfigPort,
    store: &dyn SnapshotPort,
    side: TradeSide,
    symbol: &str,
    shares: u64,
    price: Option<Decimal>,
) -> Result<(), QuantsimError> {
    let mut ledger = load_ledger(store)?;
    if !ledger.is_initialized() {
        return Err(QuantsimError::UninitializedSession);
    }

    let price = match price {
        Some(p) => p,
        None => market_price(symbol, build_price_port(config).current_price(symbol)?)?,
    };
    let request = TradeRequest {
        symbol: symbol.to_string(),
        side,
        shares,
        price,
    };
    let tx = ledger.execute_trade(&request)?;
    store.save(&ledger.snapshot())?;

    println!(
        "#{} {} {} {} @ {:.2} = {:.2}",
        tx.id, tx.side, tx.shares, tx.symbol, tx.price, tx.total
    );
    println!("Cash: {:.2}", ledger.cash());
    Ok(())
}

fn run_revalue(
    config: &dyn ConfigPort,
    store: &dyn SnapshotPort,
    args: &[String],
) -> Result<(), QuantsimError> {
    let mut ledger = load_ledger(store)?;

    let updates = if args.is_empty() {
        let prices = build_price_port(config);
        let mut updates = HashMap::new();
        for position in ledger.positions() {
            let quote = prices.current_price(&position.symbol)?;
            updates.insert(
                position.symbol.clone(),
                market_price(&position.symbol, quote)?,
            );
        }
        updates
    } else {
        parse_price_updates(args)?
    };

    let updated = ledger.revalue_positions(&updates)?;
    store.save(&ledger.snapshot())?;

    println!("Revalued {} position(s)", updated);
    println!("Total value: {:.2}", ledger.portfolio().total_value);
    Ok(())
}

fn run_show(store: &dyn SnapshotPort) -> Result<(), QuantsimError> {
    let ledger = load_ledger(store)?;
    let session = ledger.session().ok_or(QuantsimError::UninitializedSession)?;
    let portfolio = ledger.portfolio();

    println!("Initial capital: {:>14.2}", session.initial_capital);
    println!(
        "Session start:   {} ({} days)",
        session.start_date.format("%Y-%m-%d"),
        session.days_since_start(Utc::now())
    );
    println!("Cash:            {:>14.2}", portfolio.cash);
    println!("Total value:     {:>14.2}", portfolio.total_value);
    println!(
        "Total return:    {:>14.2} ({:+.2}%)",
        portfolio.total_return, portfolio.total_return_percent
    );

    if ledger.position_count() == 0 {
        println!("\nNo open positions");
        return Ok(());
    }

    println!(
        "\n{:<8} {:>8} {:>10} {:>10} {:>12} {:>10} {:>8} {:>7}",
        "SYMBOL", "SHARES", "AVG", "PRICE", "VALUE", "RETURN", "RET%", "ALLOC%"
    );
    for p in ledger.top_positions(ledger.position_count()) {
        println!(
            "{:<8} {:>8} {:>10.2} {:>10.2} {:>12.2} {:>10.2} {:>+8.2} {:>7.2}",
            p.symbol,
            p.shares,
            p.avg_price,
            p.current_price,
            p.market_value,
            p.total_return,
            p.total_return_percent,
            ledger.allocation_percent(&p.symbol)
        );
    }
    Ok(())
}

fn run_history(store: &dyn SnapshotPort, limit: Option<usize>) -> Result<(), QuantsimError> {
    let ledger = load_ledger(store)?;
    if ledger.transaction_count() == 0 {
        println!("No transactions");
        return Ok(());
    }

    let limit = limit.unwrap_or(usize::MAX);
    for t in ledger.transactions().take(limit) {
        println!(
            "#{:<5} {} {:<4} {:<8} {:>8} @ {:>10.2} = {:>12.2}",
            t.id,
            t.timestamp.format("%Y-%m-%d %H:%M:%S"),
            t.side,
            t.symbol,
            t.shares,
            t.price,
            t.total
        );
    }
    Ok(())
}

fn run_metrics(store: &dyn SnapshotPort) -> Result<(), QuantsimError> {
    let ledger = load_ledger(store)?;
    let m = ledger.metrics();

    println!("Transactions:     {}", m.transaction_count);
    println!("Mean cash flow:   {:.2}", m.mean_cash_flow);
    println!("Volatility:       {:.2}", m.volatility);
    println!("Sharpe (approx):  {:.4}", m.sharpe_ratio);
    println!("Max drawdown:     {:.2}", m.max_drawdown);
    println!("Beta:             {:.2}", m.beta);
    Ok(())
}

fn run_indicators(config: &dyn ConfigPort, symbol: &str, days: usize) -> Result<(), QuantsimError> {
    let params: IndicatorParams = indicator_params_from_config(config)?;
    let prices = build_price_port(config);
    let history = prices.history(symbol, days)?;
    let closes = history.closes();

    if closes.len() < params.required_history() {
        println!(
            "note: {} closes available, {} needed for every indicator; defaults shown where short",
            closes.len(),
            params.required_history()
        );
    }

    let snap = IndicatorSnapshot::latest(&closes, &params);
    let labels = params.indicator_types();

    println!("{} ({} closes)", history.symbol, closes.len());
    println!("{:<18} {:>10.2} {}", labels[2].to_string(), snap.rsi, snap.rsi_zone().label());
    println!(
        "{:<18} {:>10.4} signal {:.4} hist {:.4}",
        labels[3].to_string(),
        snap.macd.macd,
        snap.macd.signal,
        snap.macd.histogram
    );
    println!("{:<18} {:>10.2}", labels[0].to_string(), snap.sma);
    println!("{:<18} {:>10.2}", labels[1].to_string(), snap.ema);
    println!(
        "{:<18} {:>10.2} / {:.2} / {:.2}",
        labels[4].to_string(),
        snap.bollinger.upper,
        snap.bollinger.middle,
        snap.bollinger.lower
    );
    Ok(())
}

fn run_watch(store: &dyn SnapshotPort, action: WatchAction) -> Result<(), QuantsimError> {
    let mut ledger = load_ledger(store)?;
    match action {
        WatchAction::Add { symbol, name } => {
            let mut entry = WatchlistEntry::new(&symbol);
            if let Some(name) = name {
                entry = entry.with_name(name);
            }
            let symbol = entry.symbol.clone();
            if symbol.is_empty() {
                return Err(QuantsimError::InvalidSymbol);
            }
            if ledger.add_to_watchlist(entry) {
                store.save(&ledger.snapshot())?;
                println!("Added {} to watchlist", symbol);
            } else {
                println!("{} is already on the watchlist", symbol);
            }
        }
        WatchAction::Remove { symbol } => {
            if ledger.remove_from_watchlist(&symbol) {
                store.save(&ledger.snapshot())?;
                println!("Removed {} from watchlist", symbol.trim().to_uppercase());
            } else {
                println!("{} is not on the watchlist", symbol.trim().to_uppercase());
            }
        }
        WatchAction::List => {
            if ledger.watchlist().is_empty() {
                println!("Watchlist is empty");
            }
            for entry in ledger.watchlist() {
                match &entry.name {
                    Some(name) => println!("{:<8} {}", entry.symbol, name),
                    None => println!("{}", entry.symbol),
                }
            }
        }
    }
    Ok(())
}
