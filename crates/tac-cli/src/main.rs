use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::Desk;

#[derive(Parser)]
#[command(name = "tac")]
#[command(about = "Trade admission controls CLI", long_about = None)]
struct Cli {
    /// JSON state snapshot (locks, overrides, limits, positions)
    #[arg(long, global = true, env = "TAC_STATE_PATH", default_value = "tac_state.json")]
    state: PathBuf,

    /// Layered controls config paths in merge order (base -> env -> desk...)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Instrument locks
    Locks {
        #[command(subcommand)]
        cmd: LocksCmd,
    },

    /// Trading overrides (persisted, config-declared, temporary)
    Overrides {
        #[command(subcommand)]
        cmd: OverridesCmd,
    },

    /// Position limits and temporary closes
    PositionLimits {
        #[command(subcommand)]
        cmd: PositionLimitsCmd,
    },

    /// Rolling-window trade limits
    TradeLimits {
        #[command(subcommand)]
        cmd: TradeLimitsCmd,
    },

    /// Held positions used by override and position limit checks
    Positions {
        #[command(subcommand)]
        cmd: PositionsCmd,
    },

    /// Dry-run one order through the admission chain and print every stage
    Admit {
        #[arg(long)]
        strategy: String,

        #[arg(long)]
        instrument: String,

        /// Signed quantity (+ buy, - sell)
        #[arg(long, allow_hyphen_values = true)]
        qty: i64,
    },
}

#[derive(Subcommand)]
enum LocksCmd {
    List,

    Add {
        #[arg(long)]
        instrument: String,
    },

    Remove {
        #[arg(long)]
        instrument: String,
    },
}

#[derive(Subcommand)]
enum OverridesCmd {
    /// Every override with its reason. Stale instruments and strategies are hidden.
    List {
        /// Only overrides persisted in the state file
        #[arg(long, default_value_t = false)]
        db_only: bool,
    },

    /// Persist an override. --strategy, --instrument or both pick the key.
    Set {
        #[arg(long)]
        strategy: Option<String>,

        #[arg(long)]
        instrument: Option<String>,

        /// default | reduce_only | no_trade
        #[arg(long)]
        value: String,
    },

    /// Effective override for one strategy/instrument pair
    Effective {
        #[arg(long)]
        strategy: String,

        #[arg(long)]
        instrument: String,
    },

    /// Delete every persisted override. Guardrail: refuses without --yes.
    ClearAll {
        /// Acknowledge that every persisted override is removed.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Stash the instrument override and replace it with reduce_only
    TempReduceOnly {
        #[arg(long)]
        instrument: String,
    },

    /// Restore the stashed instrument override
    TempRemove {
        #[arg(long)]
        instrument: String,
    },
}

#[derive(Subcommand)]
enum PositionLimitsCmd {
    /// Limits and positions for every instrument and strategy/instrument pair
    List,

    SetInstrument {
        #[arg(long)]
        instrument: String,

        #[arg(long)]
        limit: u64,
    },

    SetStrategy {
        #[arg(long)]
        strategy: String,

        #[arg(long)]
        instrument: String,

        #[arg(long)]
        limit: u64,
    },

    DeleteInstrument {
        #[arg(long)]
        instrument: String,
    },

    DeleteStrategy {
        #[arg(long)]
        strategy: String,

        #[arg(long)]
        instrument: String,
    },

    /// Stash the instrument limit and set it to zero (reducing trades only)
    TempClose {
        #[arg(long)]
        instrument: String,
    },

    /// Restore the stashed instrument limit
    TempReopen {
        #[arg(long)]
        instrument: String,
    },
}

#[derive(Subcommand)]
enum TradeLimitsCmd {
    /// Every limit with its current window, sorted by scope then period
    List,

    SetInstrument {
        #[arg(long)]
        instrument: String,

        #[arg(long)]
        period_days: u32,

        #[arg(long)]
        max_trades: u64,
    },

    SetStrategy {
        #[arg(long)]
        strategy: String,

        #[arg(long)]
        instrument: String,

        #[arg(long)]
        period_days: u32,

        #[arg(long)]
        max_trades: u64,
    },

    ResetInstrument {
        #[arg(long)]
        instrument: String,

        #[arg(long)]
        period_days: u32,
    },

    ResetStrategy {
        #[arg(long)]
        strategy: String,

        #[arg(long)]
        instrument: String,

        #[arg(long)]
        period_days: u32,
    },

    /// Zero consumption and restart the window for every limit
    ResetAll,
}

#[derive(Subcommand)]
enum PositionsCmd {
    /// Set the signed position of one strategy/instrument pair (0 removes it)
    Set {
        #[arg(long)]
        strategy: String,

        #[arg(long)]
        instrument: String,

        #[arg(long, allow_hyphen_values = true)]
        position: i64,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present. Silent if missing.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let desk = Desk::open(&cli.state, &cli.config_paths)?;

    match cli.cmd {
        Commands::Locks { cmd } => match cmd {
            LocksCmd::List => commands::locks::list(&desk)?,
            LocksCmd::Add { instrument } => commands::locks::add(&desk, &instrument)?,
            LocksCmd::Remove { instrument } => commands::locks::remove(&desk, &instrument)?,
        },

        Commands::Overrides { cmd } => match cmd {
            OverridesCmd::List { db_only } => commands::overrides::list(&desk, db_only)?,
            OverridesCmd::Set {
                strategy,
                instrument,
                value,
            } => commands::overrides::set(&desk, strategy, instrument, &value)?,
            OverridesCmd::Effective {
                strategy,
                instrument,
            } => commands::overrides::effective(&desk, &strategy, &instrument)?,
            OverridesCmd::ClearAll { yes } => commands::overrides::clear_all(&desk, yes)?,
            OverridesCmd::TempReduceOnly { instrument } => {
                commands::overrides::temp_reduce_only(&desk, &instrument)?
            }
            OverridesCmd::TempRemove { instrument } => {
                commands::overrides::temp_remove(&desk, &instrument)?
            }
        },

        Commands::PositionLimits { cmd } => match cmd {
            PositionLimitsCmd::List => commands::limits::position_list(&desk)?,
            PositionLimitsCmd::SetInstrument { instrument, limit } => {
                commands::limits::position_set_instrument(&desk, &instrument, limit)?
            }
            PositionLimitsCmd::SetStrategy {
                strategy,
                instrument,
                limit,
            } => commands::limits::position_set_strategy(&desk, &strategy, &instrument, limit)?,
            PositionLimitsCmd::DeleteInstrument { instrument } => {
                commands::limits::position_delete_instrument(&desk, &instrument)?
            }
            PositionLimitsCmd::DeleteStrategy {
                strategy,
                instrument,
            } => commands::limits::position_delete_strategy(&desk, &strategy, &instrument)?,
            PositionLimitsCmd::TempClose { instrument } => {
                commands::limits::temp_close(&desk, &instrument)?
            }
            PositionLimitsCmd::TempReopen { instrument } => {
                commands::limits::temp_reopen(&desk, &instrument)?
            }
        },

        Commands::TradeLimits { cmd } => match cmd {
            TradeLimitsCmd::List => commands::limits::trade_list(&desk)?,
            TradeLimitsCmd::SetInstrument {
                instrument,
                period_days,
                max_trades,
            } => commands::limits::trade_set_instrument(&desk, &instrument, period_days, max_trades)?,
            TradeLimitsCmd::SetStrategy {
                strategy,
                instrument,
                period_days,
                max_trades,
            } => commands::limits::trade_set_strategy(
                &desk,
                &strategy,
                &instrument,
                period_days,
                max_trades,
            )?,
            TradeLimitsCmd::ResetInstrument {
                instrument,
                period_days,
            } => commands::limits::trade_reset_instrument(&desk, &instrument, period_days)?,
            TradeLimitsCmd::ResetStrategy {
                strategy,
                instrument,
                period_days,
            } => commands::limits::trade_reset_strategy(&desk, &strategy, &instrument, period_days)?,
            TradeLimitsCmd::ResetAll => commands::limits::trade_reset_all(&desk)?,
        },

        Commands::Positions { cmd } => match cmd {
            PositionsCmd::Set {
                strategy,
                instrument,
                position,
            } => commands::admit::set_position(&desk, &strategy, &instrument, position)?,
        },

        Commands::Admit {
            strategy,
            instrument,
            qty,
        } => commands::admit::admit(&desk, &strategy, &instrument, qty)?,
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
