use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use lesson_core::model::{UserKey, default_catalog};
use services::{AppServices, Clock, ProgressService};
use storage::repository::{LessonRepository, Storage};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod db_url;
mod desktop;

use db_url::{normalize_sqlite_url, prepare_sqlite_file};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Lesson progress tracker.
#[derive(Debug, Parser)]
#[command(name = "lessons", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the progress REST API over SQLite.
    Serve(ServeArgs),
    /// Open the desktop UI against the local database or a remote API.
    Ui(UiArgs),
    /// Write the default lesson catalog, optionally completing lessons.
    Seed(SeedArgs),
}

#[derive(Debug, Args)]
struct DbArgs {
    /// SQLite database URL or path.
    #[arg(long = "db", env = "LESSONS_DB_URL", default_value = "sqlite://lessons.sqlite3")]
    db_url: String,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[command(flatten)]
    db: DbArgs,

    #[arg(long, env = "LESSONS_LISTEN_ADDR", default_value = "127.0.0.1:5000")]
    listen: SocketAddr,
}

#[derive(Debug, Args)]
struct UiArgs {
    #[command(flatten)]
    db: DbArgs,

    /// Use a remote progress API instead of the local database.
    #[arg(long, env = "LESSONS_API_URL")]
    api_url: Option<String>,

    /// Learner id; omitted means anonymous.
    #[arg(long, env = "LESSONS_USER")]
    user: Option<String>,
}

#[derive(Debug, Args)]
struct SeedArgs {
    #[command(flatten)]
    db: DbArgs,

    #[arg(long, env = "LESSONS_USER")]
    user: Option<String>,

    /// Mark the first N catalog lessons completed for the user.
    #[arg(long, default_value_t = 0)]
    completed: usize,
}

async fn open_sqlite(db: &DbArgs) -> AppResult<(Storage, String)> {
    let url = normalize_sqlite_url(&db.db_url)?;
    prepare_sqlite_file(&url)?;
    let storage = Storage::sqlite(&url).await?;
    Ok((storage, url))
}

async fn serve(args: ServeArgs) -> AppResult<()> {
    let (storage, url) = open_sqlite(&args.db).await?;
    let services = AppServices::from_storage(&storage, Clock::default_clock()).await?;
    info!(db = %url, "database ready");

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    let state = api::ApiState::new(services.progress());

    tokio::select! {
        res = api::serve(listener, state) => res?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}

async fn seed(args: SeedArgs) -> AppResult<()> {
    let (storage, url) = open_sqlite(&args.db).await?;
    let catalog = default_catalog()?;
    for lesson in &catalog {
        storage.lessons.upsert_lesson(lesson).await?;
    }

    let user = UserKey::normalize(args.user.as_deref());
    let progress = ProgressService::from_storage(Clock::default_clock(), &storage);
    for lesson in catalog.iter().take(args.completed) {
        progress.complete_lesson(&user, lesson.id().as_str()).await?;
    }

    let summary = progress.get_progress_summary(&user).await?;
    println!(
        "Seeded {} lessons into {url}; {user}: {} / {} lessons completed",
        catalog.len(),
        summary.completed_lessons(),
        summary.total_lessons(),
    );
    Ok(())
}

async fn prepare_ui(args: &UiArgs) -> AppResult<(UserKey, Arc<ProgressService>)> {
    let clock = Clock::default_clock();
    let services = match &args.api_url {
        Some(api_url) => {
            info!(%api_url, "using remote progress api");
            AppServices::remote(api_url, clock)
        }
        None => {
            let (storage, url) = open_sqlite(&args.db).await?;
            info!(db = %url, "using local database");
            AppServices::from_storage(&storage, clock).await?
        }
    };

    let user = UserKey::normalize(args.user.as_deref());
    let progress = services.progress();
    match progress.reconcile_guest_progress(&user).await {
        Ok(0) => {}
        Ok(merged) => info!(%user, merged, "guest progress merged"),
        Err(err) => warn!(%user, error = %err, "guest progress not merged"),
    }
    Ok((user, progress))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn run(cli: Cli) -> AppResult<()> {
    let runtime = Runtime::new()?;
    match cli.command {
        Command::Serve(args) => runtime.block_on(serve(args)),
        Command::Seed(args) => runtime.block_on(seed(args)),
        Command::Ui(args) => {
            // The desktop launcher drives its own event loop, so it must run
            // outside `block_on`; `runtime` stays alive for the pool's tasks.
            let (user, progress) = runtime.block_on(prepare_ui(&args))?;
            desktop::launch(user, progress);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
