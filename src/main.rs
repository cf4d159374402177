use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use scriptura_pipeline::fetch::{HttpSource, SourceScheme};
use scriptura_pipeline::import::{Importer, Translation};
use scriptura_pipeline::utils::init_log;
use scriptura_pipeline::{audit, catalog, config::Config, db, reconcile};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "./scriptura.toml")]
    config: PathBuf,

    /// Directory for rotated log files, stdout if absent
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKind {
    /// raw-file source, serves RV1960
    Github,
    /// REST API source, serves NVI
    Api,
}

#[derive(Subcommand)]
enum Command {
    /// Insert any missing catalog books
    Seed,
    /// Import chapter content from an upstream source
    Import {
        #[arg(long, value_enum, default_value_t = SourceKind::Github)]
        source: SourceKind,
        /// one external book identifier; whole upstream listing if absent
        #[arg(long)]
        book: Option<String>,
    },
    /// Rebuild progress aggregates from the reading-event log
    Reconcile {
        #[arg(long)]
        book: Option<i64>,
        #[arg(long, requires = "book")]
        user: Option<i64>,
    },
    /// Cross-check persisted content against the catalog, read-only
    Audit {
        #[arg(long)]
        book: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let _guard = init_log(args.log_dir.clone());
    let config = Config::load_or_default(&args.config)?;

    let pool = db::connect(&config.database).await?;
    db::init_schema(&pool).await?;

    match args.command {
        Command::Seed => {
            let inserted = catalog::seed(&pool).await?;
            println!("{} books inserted", inserted);
        }
        Command::Import { source, book } => {
            let source = match source {
                SourceKind::Github => HttpSource::new(
                    &config.sources.github_base_url,
                    SourceScheme::GithubRaw,
                    Translation::Rv1960,
                    config.rate_limit_ms,
                )?,
                SourceKind::Api => HttpSource::new(
                    &config.sources.api_base_url,
                    SourceScheme::RestApi,
                    Translation::Nvi,
                    config.rate_limit_ms,
                )?,
            };
            let importer = Importer::new(&pool, &source);
            let report = match book {
                Some(external_id) => importer.run_one(&external_id).await?,
                None => importer.run().await?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.failures.is_empty()
                && report.chapters_created + report.chapters_updated == 0
            {
                bail!("import produced no content, {} failures", report.failures.len());
            }
        }
        Command::Reconcile { book, user } => {
            let written = match book {
                Some(book_id) => reconcile::reconcile_book(&pool, book_id, user).await?,
                None => reconcile::reconcile_all(&pool).await?,
            };
            println!("{} aggregates written", written);
        }
        Command::Audit { book } => {
            let report = audit::audit(&pool, book.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
