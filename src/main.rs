use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use magnolia::history::VisitKind;
use magnolia::query::Query;
use magnolia::recorder::{DEFAULT_ACTION, validate_action};

mod history_cmd;
mod output;
mod pick_cmd;
mod record_cmd;
mod session;

use session::Session;

const LOG_ENV: &str = "MAGNOLIA_LOG";

#[derive(Parser)]
#[command(
    name = "magnolia",
    version,
    about = "Directory and file history with recency and frecency ranking"
)]
struct Cli {
    /// History database [default: $MAGNOLIA_HOME/magnolia.db or ~/.magnolia.db]
    #[arg(long, global = true, env = "MAGNOLIA_DB_PATH", value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Never style output
    #[arg(long, global = true)]
    no_color: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Directories by most recent visit
    RecentDirs {
        /// Maximum entries; zero or negative means the default (500)
        #[arg(allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Files by most recent visit
    RecentFiles {
        /// Maximum entries; zero or negative means the default (500)
        #[arg(allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Directories by frecency, with visit counts
    PopularDirs {
        /// Maximum entries; zero or negative means the default (500)
        #[arg(allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Pick a recent directory and print a `cd` action
    ChangeToDir {
        /// Maximum candidates; zero or negative means the default (1000)
        #[arg(allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Pick a recent file and print an `open` action
    ChangeToFile {
        /// Maximum candidates; zero or negative means the default (1000)
        #[arg(allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Visit counts per file category
    FileStats,
    /// Case-insensitive substring search over both histories
    Search { query: String },
    /// Record a directory visit
    RecordDir { path: PathBuf },
    /// Record a file visit
    RecordFile {
        path: PathBuf,
        #[arg(long, default_value = DEFAULT_ACTION)]
        action: String,
    },
    /// Print raw rows of one history as JSON lines
    Dump {
        /// `dirs` or `files`
        kind: String,
        /// Only rows at or after this time (`YYYY-MM-DD HH:MM:SS` UTC or RFC 3339)
        #[arg(long)]
        since: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("magnolia=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("magnolia=warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn color_enabled(no_color: bool) -> bool {
    !no_color && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// What one invocation does, with every argument already validated.
enum Plan<'a> {
    Query(Query),
    Pick { kind: VisitKind, limit: Option<i64> },
    RecordDir(&'a Path),
    RecordFile { path: &'a Path, action: &'a str },
}

/// Argument errors surface before the store is opened, so they never create a database.
fn plan(command: &Commands) -> magnolia::Result<Plan<'_>> {
    let plan = match command {
        Commands::RecentDirs { limit } => Plan::Query(Query::RecentDirs { limit: *limit }),
        Commands::RecentFiles { limit } => Plan::Query(Query::RecentFiles { limit: *limit }),
        Commands::PopularDirs { limit } => Plan::Query(Query::PopularDirs { limit: *limit }),
        Commands::FileStats => Plan::Query(Query::FileStats),
        Commands::Search { query } => Plan::Query(Query::search(query)?),
        Commands::Dump { kind, since } => Plan::Query(Query::dump(kind, since.as_deref())?),
        Commands::ChangeToDir { limit } => Plan::Pick {
            kind: VisitKind::Directory,
            limit: *limit,
        },
        Commands::ChangeToFile { limit } => Plan::Pick {
            kind: VisitKind::File,
            limit: *limit,
        },
        Commands::RecordDir { path } => Plan::RecordDir(path),
        Commands::RecordFile { path, action } => Plan::RecordFile {
            path,
            action: validate_action(action)?,
        },
    };
    Ok(plan)
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let plan = plan(&cli.command)?;
    let session = Session::open(cli.db_path.clone(), color_enabled(cli.no_color))?;
    let json = cli.json;
    match plan {
        Plan::Query(query) => history_cmd::cmd_query(&session, &query, json),
        Plan::Pick { kind, limit } => pick_cmd::cmd_pick(&session, kind, limit, json),
        Plan::RecordDir(path) => record_cmd::cmd_record_dir(&session, path, json),
        Plan::RecordFile { path, action } => {
            record_cmd::cmd_record_file(&session, path, action, json)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let exit_code = run(&cli).unwrap_or_else(|e| output::report(&e));
    std::process::exit(exit_code);
}
