//! `TaskDeck` — ordered, synchronized personal task lists.
//!
//! One-shot CLI over the task store. With a store URL configured the
//! commands run against the remote document store; without one an
//! in-memory demo store is used. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! # Offline demo mode
//! cargo run --bin taskdeck -- list
//!
//! # Against a remote store
//! cargo run --bin taskdeck -- --store-url ws://127.0.0.1:9000/sync \
//!     --user alice add "buy milk" --due 2025-06-15
//!
//! # Or via environment variables
//! TASKDECK_STORE_URL=ws://127.0.0.1:9000/sync TASKDECK_USER=alice \
//!     cargo run --bin taskdeck -- list active
//! ```

use std::path::Path;
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use uuid::Uuid;

use taskdeck::auth::memory::MemoryAuth;
use taskdeck::auth::{AuthError, AuthSession};
use taskdeck::config::{CliArgs, ClientConfig};
use taskdeck::gateway::memory::MemoryGateway;
use taskdeck::gateway::remote::RemoteGateway;
use taskdeck::gateway::{GatewayError, SyncGateway};
use taskdeck::store::filter::{classify_due, FilterMode};
use taskdeck::store::{StoreError, TaskStore};
use taskdeck_proto::task::{DueDatePatch, Task, TaskId, TaskPatch, UserId};

/// Errors surfaced to the user as a single message and a non-zero exit.
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("a remote store requires --user (or TASKDECK_USER)")]
    MissingUser,

    #[error("due date {0} is in the past")]
    DueDateInPast(NaiveDate),

    #[error("unknown filter '{0}', expected all, active or completed")]
    UnknownFilter(String),
}

#[derive(clap::Parser, Debug)]
#[command(version, about = "Ordered, synchronized personal task lists")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Add a task at the end of the list.
    Add {
        /// Task text.
        text: String,
        /// Due date (YYYY-MM-DD). Must not be in the past.
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Show the task list.
    List {
        /// Filter to apply (all, active, completed).
        filter: Option<String>,
    },
    /// Edit a task's text or due date.
    Edit {
        /// Task id.
        id: Uuid,
        /// New task text.
        text: Option<String>,
        /// New due date (YYYY-MM-DD).
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
    },
    /// Flip a task's completion state.
    Toggle {
        /// Task id.
        id: Uuid,
    },
    /// Delete a task.
    Rm {
        /// Task id.
        id: Uuid,
    },
    /// Move a task to the position of another task.
    Move {
        /// Task to move.
        moved: Uuid,
        /// Task currently at the destination position.
        target: Uuid,
    },
    /// Delete every completed task.
    ClearCompleted,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli.args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before any work (logs go to file, not stdout,
    // which carries command output).
    let _log_guard = init_logging(&cli.args.log_level, cli.args.log_file.as_deref());

    tracing::info!("taskdeck starting");

    let command = cli.command.unwrap_or(Command::List { filter: None });
    let result = run(command, &config).await;

    tracing::info!("taskdeck exiting");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdeck.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Dispatch to a remote or demo store depending on configuration.
async fn run(command: Command, config: &ClientConfig) -> Result<(), AppError> {
    match config.store_connection() {
        Some(connection) => {
            let user = config.user.clone().ok_or(AppError::MissingUser)?;
            let gateway = RemoteGateway::connect_with_timeouts(
                &connection.url,
                connection.connect_timeout,
                connection.request_timeout,
            )
            .await?;
            let mut store = TaskStore::new(gateway);
            store.set_user(Some(UserId::new(user)));
            store.load().await?;
            run_command(&mut store, command, config).await
        }
        None => {
            println!("(demo store, changes are not persisted)");
            let mut store = TaskStore::new(MemoryGateway::new());
            let user = sign_in_demo(config).await?;
            store.set_user(Some(user));
            seed_demo(&mut store).await?;
            run_command(&mut store, command, config).await
        }
    }
}

/// Demo identity: the configured user name, or a federated sign-in when
/// none is given.
async fn sign_in_demo(config: &ClientConfig) -> Result<UserId, AppError> {
    if let Some(user) = config.user.clone() {
        return Ok(UserId::new(user));
    }
    let session = AuthSession::new(MemoryAuth::new());
    Ok(session.sign_in_federated().await?)
}

/// Populate the demo store so `list` has something to show.
async fn seed_demo<G: SyncGateway>(store: &mut TaskStore<G>) -> Result<(), AppError> {
    let today = Utc::now().date_naive();
    store.add("Try taskdeck", None).await?;
    store.add("Plan the week", today.succ_opt()).await?;
    if let Some(id) = store.add("Read the docs", None).await? {
        store.toggle(&id).await?;
    }
    Ok(())
}

/// Execute one command against a loaded store and print the outcome.
async fn run_command<G: SyncGateway>(
    store: &mut TaskStore<G>,
    command: Command,
    config: &ClientConfig,
) -> Result<(), AppError> {
    match command {
        Command::Add { text, due } => {
            if let Some(due) = due
                && due < Utc::now().date_naive()
            {
                return Err(AppError::DueDateInPast(due));
            }
            match store.add(&text, due).await? {
                Some(id) => println!("added {id}"),
                None => println!("nothing to add"),
            }
            print_list(store.tasks(), config);
        }
        Command::List { filter } => {
            let mode = match filter {
                Some(name) => name
                    .parse::<FilterMode>()
                    .map_err(|_| AppError::UnknownFilter(name))?,
                None => config.default_filter,
            };
            print_list(&store.visible(mode), config);
        }
        Command::Edit {
            id,
            text,
            due,
            clear_due,
        } => {
            let due_date = if clear_due {
                Some(DueDatePatch::Clear)
            } else {
                due.map(DueDatePatch::Set)
            };
            let patch = TaskPatch {
                text,
                due_date,
                ..TaskPatch::default()
            };
            store.update(&TaskId::from_uuid(id), patch).await?;
            print_list(store.tasks(), config);
        }
        Command::Toggle { id } => {
            store.toggle(&TaskId::from_uuid(id)).await?;
            print_list(store.tasks(), config);
        }
        Command::Rm { id } => {
            store.remove(&TaskId::from_uuid(id)).await?;
            print_list(store.tasks(), config);
        }
        Command::Move { moved, target } => {
            store
                .move_task(&TaskId::from_uuid(moved), &TaskId::from_uuid(target))
                .await?;
            print_list(store.tasks(), config);
        }
        Command::ClearCompleted => {
            store.clear_completed().await?;
            print_list(store.tasks(), config);
        }
    }
    Ok(())
}

/// Print tasks one per line with completion, due annotation, and id.
fn print_list(tasks: &[Task], config: &ClientConfig) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    let today = Utc::now().date_naive();
    for (index, task) in tasks.iter().enumerate() {
        println!("{}", render_task(task, index, today, &config.date_format));
    }
}

/// One list line: `N. [x] text (due DATE, STATUS) id=UUID`.
fn render_task(task: &Task, index: usize, today: NaiveDate, date_format: &str) -> String {
    let mark = if task.is_completed { 'x' } else { ' ' };
    let due = task.due_date.map_or_else(String::new, |date| {
        let formatted = date.format(date_format);
        match classify_due(task, today) {
            Some(status) => format!("  (due {formatted}, {status})"),
            None => format!("  (due {formatted})"),
        }
    });
    format!(
        "{:>3}. [{mark}] {}{due}  id={}",
        index + 1,
        task.text,
        task.id
    )
}
