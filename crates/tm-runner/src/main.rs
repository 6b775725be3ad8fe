use std::{fs, io::Write, path::PathBuf};

use chrono::{Local, NaiveDateTime};
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use tm_common::{
    api::{RankingInput, RankingResponse, ShortlistResponse},
    db::{DbPoolError, MigrationError, PgShortlistStore, create_pool_from_url, run_migrations},
    logging,
    matching::{MatchingEngine, MatchingEngineConfig, RankedCandidate},
    run_id,
    shortlist::{MaterializedShortlist, ShortlistConfig, ShortlistError, materialize},
};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RankMode {
    /// Patient ranking by total score
    Rank,
    /// Public directory, platform score only
    Directory,
    /// Patient ranking with perfect matches and bookable slots first
    Instant,
}

impl RankMode {
    fn as_str(self) -> &'static str {
        match self {
            RankMode::Rank => "rank",
            RankMode::Directory => "directory",
            RankMode::Instant => "instant",
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tm-runner",
    about = "Rank a therapist pool for one patient and optionally persist the shortlist"
)]
struct Cli {
    /// JSON snapshot with `patient`, `candidates` and `availability`
    #[arg(long, env = "TM_INPUT")]
    input: PathBuf,

    #[arg(long, value_enum, default_value = "rank")]
    mode: RankMode,

    /// Print at most this many ranked candidates
    #[arg(long)]
    limit: Option<usize>,

    /// Materialize the shortlist into Postgres
    #[arg(long, default_value_t = false)]
    persist: bool,

    /// PostgreSQL connection string, required with --persist
    #[arg(long, env = "DATABASE_URL")]
    db_url: Option<String>,

    /// Overrides `patient_id` from the snapshot
    #[arg(long)]
    patient_id: Option<String>,

    /// Overrides `session_key` from the snapshot
    #[arg(long)]
    session_key: Option<String>,

    /// Reference time such as 2025-03-03T09:00:00. Falls back to the snapshot, then local time.
    #[arg(long)]
    now: Option<NaiveDateTime>,
}

#[derive(Debug, thiserror::Error)]
enum RunnerError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid ranking input: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0} mode needs patient preferences in the input")]
    MissingPatient(&'static str),
    #[error("--persist is not supported in directory mode")]
    PersistWithoutPatient,
    #[error("--persist needs a patient id")]
    MissingPatientId,
    #[error("--persist needs DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("database pool error: {0}")]
    DbPool(#[from] DbPoolError),
    #[error("migration failed: {0}")]
    Migration(#[from] MigrationError),
    #[error("shortlist failed: {0}")]
    Shortlist(#[from] ShortlistError),
    #[error("failed to write output: {0}")]
    Output(std::io::Error),
}

#[derive(Debug, PartialEq)]
struct PersistTarget {
    db_url: String,
    patient_id: String,
    session_key: Option<String>,
}

fn rank_snapshot(
    engine: &MatchingEngine,
    input: &RankingInput,
    mode: RankMode,
    now: NaiveDateTime,
) -> Result<Vec<RankedCandidate>, RunnerError> {
    let candidates = input.candidate_profiles();
    let availability = input.availability_map(now);

    if mode == RankMode::Directory {
        return Ok(engine.rank_for_directory(&candidates, &availability));
    }

    let patient = input
        .patient
        .clone()
        .ok_or(RunnerError::MissingPatient(mode.as_str()))?
        .into_preferences();

    Ok(match mode {
        RankMode::Instant => engine.rank_for_instant_match(&candidates, &patient, &availability, now),
        _ => engine.rank(&candidates, &patient, &availability),
    })
}

fn persist_target(cli: &Cli, input: &RankingInput) -> Result<PersistTarget, RunnerError> {
    if cli.mode == RankMode::Directory {
        return Err(RunnerError::PersistWithoutPatient);
    }
    let patient_id = cli
        .patient_id
        .clone()
        .or_else(|| input.patient_id.clone())
        .filter(|id| !id.trim().is_empty())
        .ok_or(RunnerError::MissingPatientId)?;
    let db_url = cli.db_url.clone().ok_or(RunnerError::MissingDatabaseUrl)?;

    Ok(PersistTarget {
        db_url,
        patient_id,
        session_key: cli.session_key.clone().or_else(|| input.session_key.clone()),
    })
}

async fn persist_shortlist(
    target: &PersistTarget,
    ranked: &[RankedCandidate],
) -> Result<MaterializedShortlist, RunnerError> {
    let pool = create_pool_from_url(&target.db_url)?;
    run_migrations(&pool).await?;

    let store = PgShortlistStore::new(pool);
    let size = ShortlistConfig::from_env().shortlist_size(ranked);
    let shortlist = materialize(
        &store,
        &target.patient_id,
        target.session_key.as_deref(),
        ranked,
        size,
    )
    .await?;

    Ok(shortlist)
}

async fn run() -> Result<(), RunnerError> {
    dotenv().ok();
    logging::init_tracing_subscriber("tm-runner");
    logging::install_tracing_panic_hook("tm-runner");

    let cli = Cli::parse();
    let raw = fs::read_to_string(&cli.input).map_err(|source| RunnerError::Read {
        path: cli.input.clone(),
        source,
    })?;
    let input: RankingInput = serde_json::from_str(&raw)?;
    let now = cli
        .now
        .or(input.now)
        .unwrap_or_else(|| Local::now().naive_local());

    let engine = MatchingEngine::new(MatchingEngineConfig::from_env());
    let ranked = rank_snapshot(&engine, &input, cli.mode, now)?;
    info!(
        run_id = run_id::get(),
        mode = cli.mode.as_str(),
        pool_size = input.candidates.len(),
        ranked = ranked.len(),
        "ranking_complete"
    );

    let mut response =
        RankingResponse::new(cli.mode.as_str(), run_id::get(), input.candidates.len(), &ranked);

    if cli.persist {
        let target = persist_target(&cli, &input)?;
        let shortlist = persist_shortlist(&target, &ranked).await?;
        response.shortlist = Some(ShortlistResponse::from(&shortlist));
    }

    if let Some(limit) = cli.limit {
        response.candidates.truncate(limit);
    }

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &response)
        .map_err(|err| RunnerError::Output(err.into()))?;
    writeln!(stdout).map_err(RunnerError::Output)?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %err, "tm-runner failed");
        eprintln!("tm-runner failed: {err}");
        std::process::exit(1);
    }
}
