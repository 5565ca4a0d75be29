//! clipq CLI: operator interface to the clip lease engine.

use chrono::Utc;
use clap::{Parser, Subcommand};
use clipq::config::{Config, EngineConfig};
use clipq::content::{BaseUrlResolver, assign};
use clipq::db::Db;
use clipq::engine::Engine;
use clipq::model::{CommitResult, ImportRow, NewAnnotation, Range, UnitId};
use clipq::reconcile::{DirectoryListing, KeysFileListing};
use clipq::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "clipq", about = "Lease audio clips to transcribers")]
struct Cli {
    /// TOML file with an [engine] table; overrides the environment tunables
    #[arg(long, global = true)]
    engine_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run pending database migrations
    Migrate,
    /// Lease the next clip
    Acquire {
        /// Print a fetch URL built from this base
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Record a finished transcription and release the lease
    Commit {
        /// Unit ID
        unit_id: String,
        /// JSON payload (transcript and metadata)
        #[arg(long)]
        payload: String,
        /// Who did the work
        #[arg(long)]
        contributor: Option<String>,
    },
    /// Import clips from a CSV with `filename` and `transcription` columns
    Import { csv: PathBuf },
    /// Compare the catalogue against the content store
    Diff {
        /// Local directory mirroring the content store
        #[arg(long, conflicts_with = "keys_file", required_unless_present = "keys_file")]
        dir: Option<PathBuf>,
        /// Include non-audio files when listing --dir
        #[arg(long, requires = "dir")]
        all_files: bool,
        /// File with one content-store key per line
        #[arg(long)]
        keys_file: Option<PathBuf>,
    },
    /// Clips still below the target, fewest annotations first
    Backlog {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show a clip and its annotations
    Show { unit_id: String },
    /// Dataset progress
    Stats,
    /// Annotations per contributor
    Leaderboard {
        /// all | week | month
        #[arg(long, default_value = "all")]
        range: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "clipq".to_string(),
        default_level: config.log_level.clone(),
    })?;

    let db = Db::connect(config.database_url.expose_secret(), config.max_connections).await?;
    if let Command::Migrate = cli.command {
        db.migrate().await?;
        println!("Migrations applied.");
        return Ok(());
    }

    let engine_config = match cli.engine_config {
        Some(ref path) => EngineConfig::load(path)?,
        None => config.engine,
    };
    let engine = Engine::new(db, engine_config)?;

    match cli.command {
        Command::Migrate => Ok(()),
        Command::Acquire { base_url } => cmd_acquire(&engine, base_url).await,
        Command::Commit {
            unit_id,
            payload,
            contributor,
        } => cmd_commit(&engine, &unit_id, &payload, contributor).await,
        Command::Import { csv } => cmd_import(&engine, &csv).await,
        Command::Diff {
            dir,
            all_files,
            keys_file,
        } => cmd_diff(&engine, dir, all_files, keys_file).await,
        Command::Backlog { limit } => cmd_backlog(&engine, limit).await,
        Command::Show { unit_id } => cmd_show(&engine, &unit_id).await,
        Command::Stats => cmd_stats(&engine).await,
        Command::Leaderboard { range } => cmd_leaderboard(&engine, &range).await,
    }
}

async fn cmd_acquire(engine: &Engine, base_url: Option<String>) -> anyhow::Result<()> {
    let now = Utc::now();
    let lease = match base_url {
        Some(base) => {
            let resolver = BaseUrlResolver::new(base)?;
            let ttl = engine.config().lease_duration;
            match assign(engine, &resolver, now, ttl).await? {
                Some(assignment) => {
                    println!("URL:        {}", assignment.fetch_url);
                    Some(assignment.lease)
                }
                None => None,
            }
        }
        None => engine.acquire(now).await?,
    };

    let Some(lease) = lease else {
        println!("Nothing to do right now.");
        return Ok(());
    };

    println!("Unit:       {}", lease.unit_id);
    println!("Label:      {}", lease.reference_label);
    println!(
        "Reference:  {}",
        lease.reference_text.as_deref().unwrap_or("-")
    );
    println!("Count:      {}", lease.annotation_count);
    println!("Expires:    {}", lease.expires_at);
    Ok(())
}

async fn cmd_commit(
    engine: &Engine,
    unit_id: &str,
    payload: &str,
    contributor: Option<String>,
) -> anyhow::Result<()> {
    let unit_id: UnitId = unit_id.parse()?;
    let payload: serde_json::Value = serde_json::from_str(payload)?;

    let mut new = NewAnnotation::new(payload);
    if let Some(name) = contributor {
        new = new.contributor(name);
    }

    let result = engine.commit(unit_id, new, Utc::now()).await?;
    match &result {
        CommitResult::Recorded(a) => println!("Recorded: {} on {}", a.id, a.unit_id),
        CommitResult::AlreadyExhausted(a) => println!(
            "Recorded: {} on {} (unit was already at its target of {})",
            a.id,
            a.unit_id,
            engine.config().max_annotations_per_unit
        ),
    }
    Ok(())
}

async fn cmd_import(engine: &Engine, path: &Path) -> anyhow::Result<()> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {e}", path.display()))?;
    let rows = reader
        .deserialize::<ImportRow>()
        .collect::<Result<Vec<_>, _>>()?;

    let report = engine.import_batch(rows).await;

    println!("Inserted: {}", report.inserted);
    println!("Skipped:  {}", report.skipped_count());
    for row in &report.skipped {
        println!("  row {:<6} {:<40} {}", row.row_index, row.label, row.cause);
    }
    Ok(())
}

async fn cmd_diff(
    engine: &Engine,
    dir: Option<PathBuf>,
    all_files: bool,
    keys_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let diff = match (dir, keys_file) {
        (Some(dir), _) if all_files => engine.diff_with(&DirectoryListing::all_files(dir)).await?,
        (Some(dir), _) => engine.diff_with(&DirectoryListing::audio(dir)).await?,
        (None, Some(keys)) => engine.diff_with(&KeysFileListing::new(keys)).await?,
        (None, None) => anyhow::bail!("one of --dir or --keys-file is required"),
    };

    println!("Matched:        {}", diff.matched_count);
    println!("Only in store:  {}", diff.only_external.len());
    for label in &diff.only_external {
        println!("  + {label}");
    }
    println!("Only in catalogue: {}", diff.only_catalogue.len());
    for label in &diff.only_catalogue {
        println!("  - {label}");
    }
    Ok(())
}

async fn cmd_backlog(engine: &Engine, limit: i64) -> anyhow::Result<()> {
    let units = engine.backlog(limit).await?;
    if units.is_empty() {
        println!("Every clip has reached its target.");
        return Ok(());
    }

    let now = Utc::now();
    println!("{:<36}  {:<5}  {:<6}  LABEL", "ID", "COUNT", "LEASED");
    println!("{}", "-".repeat(90));
    for unit in &units {
        println!(
            "{:<36}  {:<5}  {:<6}  {}",
            unit.id,
            unit.annotation_count,
            if unit.is_leased(now) { "yes" } else { "no" },
            unit.reference_label
        );
    }
    println!("\n{} clip(s)", units.len());
    Ok(())
}

async fn cmd_show(engine: &Engine, unit_id: &str) -> anyhow::Result<()> {
    let id: UnitId = unit_id.parse()?;
    let unit = engine.get_unit(id).await?;
    let annotations = engine.annotations_for(id).await?;

    println!("ID:         {}", unit.id);
    println!("Label:      {}", unit.reference_label);
    println!(
        "Reference:  {}",
        unit.reference_text.as_deref().unwrap_or("-")
    );
    println!("Count:      {}", unit.annotation_count);
    println!(
        "Lease:      {}",
        unit.lease_expiry
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Created:    {}", unit.created_at);
    for a in &annotations {
        println!("---");
        println!("Annotation: {}", a.id);
        println!("By:         {}", a.contributor.as_deref().unwrap_or("-"));
        println!("At:         {}", a.created_at);
        println!("Payload:    {}", serde_json::to_string_pretty(&a.payload)?);
    }
    Ok(())
}

async fn cmd_stats(engine: &Engine) -> anyhow::Result<()> {
    let p = engine.progress(Utc::now()).await?;
    println!("Clips:          {}", p.total_units);
    println!("Annotations:    {}", p.total_annotations);
    println!(
        "At target:      {} ({:.1}%)",
        p.exhausted_units,
        p.completion() * 100.0
    );
    println!("Leased now:     {}", p.leased_units);
    println!("Untouched:      {}", p.untouched_units);
    Ok(())
}

async fn cmd_leaderboard(engine: &Engine, range: &str) -> anyhow::Result<()> {
    let range: Range = range.parse()?;
    let leaders = engine.leaderboard(range, Utc::now()).await?;
    if leaders.is_empty() {
        println!("No attributed annotations ({range}).");
        return Ok(());
    }

    let total: u64 = leaders.iter().map(|e| e.count).sum();
    println!("{:<24}  COUNT", "CONTRIBUTOR");
    for entry in &leaders {
        println!("{:<24}  {}", entry.contributor, entry.count);
    }
    println!("\n{total} annotation(s) ({range})");
    Ok(())
}
