use clap::{Parser, Subcommand};
use std::{borrow::Cow, fmt, path::PathBuf, process};
use tracing_subscriber::EnvFilter;
use tripsplit_application::{ExpenseDraft, ExpenseProcessor, MemberDirectory};
use tripsplit_domain::{ExpenseId, MemberId, Money, TripId};
use tripsplit_infrastructure::SnapshotLedger;
use tripsplit_presentation::{
    BalancePresenter, DashboardPresenter, SettlementPresenter, SharesPresenter,
};

type CliResult<T> = Result<T, Cow<'static, str>>;

/// Split trip expenses and work out who pays whom.
#[derive(Debug, Parser)]
#[command(name = "tripsplit", version)]
struct Cli {
    /// JSON snapshot with trips, expenses and splits.
    #[arg(long, env = "TRIPSPLIT_SNAPSHOT")]
    snapshot: PathBuf,

    /// Trip to work on. May be omitted when the snapshot holds a single trip.
    #[arg(long)]
    trip: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Show who owes what for one expense.
    Shares { expense: String },
    /// Show the net balance of every member.
    Balances,
    /// Show spend, advance and balance of one member.
    Dashboard { member: String },
    /// Plan the transfers that settle the trip.
    Settle,
    /// Record an expense split equally between the participants.
    Add {
        amount: Money,
        payer: String,
        #[arg(required = true)]
        participants: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove an expense and its splits.
    Delete { expense: String },
}

fn main() {
    let _ = dotenvy::dotenv();
    init_logging();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

/// Diagnostics go to stderr so they never mix with the tables. `RUST_LOG`
/// overrides the default `warn` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> CliResult<()> {
    let ledger = SnapshotLedger::open(&cli.snapshot).map_err(message)?;
    let trip_id = resolve_trip(cli.trip, ledger.trip_ids().map_err(message)?)?;
    let directory = ledger.member_names(&trip_id).map_err(message)?;

    tracing::debug!(
        snapshot = %cli.snapshot.display(),
        trip_id = %trip_id,
        command = ?cli.command,
        "Running command"
    );

    let processor = ExpenseProcessor::new(&ledger);
    let output = execute(&processor, &trip_id, &directory, cli.command)?;
    print!("{output}");
    Ok(())
}

fn resolve_trip(requested: Option<String>, available: Vec<TripId>) -> CliResult<TripId> {
    if let Some(trip) = requested {
        return Ok(TripId::from(trip));
    }

    let mut available = available;
    match available.len() {
        0 => Err("Snapshot contains no trips".into()),
        1 => Ok(available.remove(0)),
        _ => {
            let names: Vec<&str> = available.iter().map(TripId::as_str).collect();
            Err(format!(
                "Snapshot holds several trips ({}); choose one with --trip",
                names.join(", ")
            )
            .into())
        }
    }
}

fn execute(
    processor: &ExpenseProcessor<'_>,
    trip_id: &TripId,
    directory: &dyn MemberDirectory,
    command: Command,
) -> CliResult<String> {
    let output = match command {
        Command::Shares { expense } => {
            let view = processor
                .expense_shares(trip_id, &ExpenseId::from(expense))
                .map_err(message)?;
            SharesPresenter::render(&view, directory)
        }
        Command::Balances => {
            let aggregation = processor.balances(trip_id).map_err(message)?;
            BalancePresenter::render(&aggregation, directory)
        }
        Command::Dashboard { member } => {
            let dashboard = processor
                .dashboard(trip_id, &MemberId::from(member))
                .map_err(message)?;
            DashboardPresenter::render(&dashboard, directory)
        }
        Command::Settle => {
            let report = processor.settle_up(trip_id).map_err(message)?;
            SettlementPresenter::render(&report, directory).to_string()
        }
        Command::Add {
            amount,
            payer,
            participants,
            description,
        } => {
            let mut draft = ExpenseDraft::equal(amount, payer, participants);
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            let expense = processor.create_expense(trip_id, draft).map_err(message)?;
            let view = processor
                .expense_shares(trip_id, &expense.id)
                .map_err(message)?;
            SharesPresenter::render(&view, directory)
        }
        Command::Delete { expense } => {
            let expense_id = ExpenseId::from(expense);
            processor
                .delete_expense(trip_id, &expense_id)
                .map_err(message)?;
            format!("Deleted {expense_id}\n")
        }
    };
    Ok(output)
}

fn message(err: impl fmt::Display) -> Cow<'static, str> {
    Cow::Owned(err.to_string())
}
