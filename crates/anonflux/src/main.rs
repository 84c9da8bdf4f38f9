use std::path::{Path, PathBuf};

use anonflux_bucket::S3BlobStore;
use anonflux_core::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_KEY_PATH};
use anonflux_core::keyfile::read_key_file;
use anonflux_core::pipeline::{consume, produce_with_new_key, ObjectTarget};
use anonflux_core::source::{JsonFileSource, RandomUserSource, RecordSource};
use anonflux_core::stats::{summarize, UserSummary, DEFAULT_TOP_LOCATIONS};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table as ConsoleTable;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Anonymized user export and analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch users, anonymize, encrypt and upload them
    Produce(ProduceArgs),
    /// Download, decrypt and summarize the uploaded users
    Consume(ConsumeArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// File holding the raw symmetric key
    #[arg(long, default_value = DEFAULT_KEY_PATH)]
    key_file: PathBuf,
}

#[derive(Args, Debug)]
struct ProduceArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Number of users to fetch (defaults to source.count from the config)
    #[arg(long)]
    count: Option<usize>,
    /// Read users from a local JSON file instead of the HTTP source
    #[arg(long)]
    records_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConsumeArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Number of locations to list
    #[arg(long, default_value_t = DEFAULT_TOP_LOCATIONS)]
    top: usize,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Produce(args) => handle_produce(args).await,
        Command::Consume(args) => handle_consume(args).await,
    }
}

async fn handle_produce(args: ProduceArgs) -> Result<()> {
    let config = load_config(&args.common.config)?;
    let count = args.count.unwrap_or(config.source.count);
    anyhow::ensure!(count > 0, "--count must be at least 1");

    let source: Box<dyn RecordSource> = match &args.records_file {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(RandomUserSource::new(config.source.url.clone())),
    };
    let store = S3BlobStore::new(config.minio.s3_config())
        .await
        .context("failed to configure object store")?;
    let target = ObjectTarget::from_config(&config.minio);

    let key_path = &args.common.key_file;
    let report = produce_with_new_key(source.as_ref(), &store, &target, key_path, count)
        .await
        .context("producer pipeline failed")?;

    info!(
        bucket = %report.target.bucket,
        object = %report.target.object_name,
        records = report.records,
        "producer finished"
    );
    println!(
        "Uploaded {} anonymized users to '{}/{}'. Keep '{}' secure: it is the only way to decrypt the upload.",
        report.records,
        report.target.bucket,
        report.target.object_name,
        args.common.key_file.display()
    );
    Ok(())
}

async fn handle_consume(args: ConsumeArgs) -> Result<()> {
    let config = load_config(&args.common.config)?;
    let key = read_key_file(&args.common.key_file).context("failed to load encryption key")?;
    let store = S3BlobStore::new(config.minio.s3_config())
        .await
        .context("failed to configure object store")?;
    let target = ObjectTarget::from_config(&config.minio);

    let table = consume(&store, &target, &key)
        .await
        .context("consumer pipeline failed")?;
    let summary = summarize(&table, Utc::now(), args.top).context("failed to summarize users")?;

    match args.format {
        OutputFormat::Table => print_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let config = AppConfig::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn print_summary(summary: &UserSummary) {
    println!("Users loaded: {}", summary.users);
    match summary.average_days_since_registered {
        Some(days) => println!("Average duration since users registered: {days:.2} days"),
        None => println!("Average duration since users registered: n/a"),
    }

    let mut genders = ConsoleTable::new();
    genders.set_header(vec!["Gender", "Users"]);
    for entry in &summary.gender_counts {
        genders.add_row(vec![entry.gender.clone(), entry.users.to_string()]);
    }
    println!("\nUsers by gender:\n{genders}");

    let mut locations = ConsoleTable::new();
    locations.set_header(vec!["Country", "City", "Users"]);
    for entry in &summary.top_locations {
        locations.add_row(vec![
            entry.country.clone(),
            entry.city.clone(),
            entry.users.to_string(),
        ]);
    }
    println!(
        "\nTop {} locations by number of users:\n{locations}",
        summary.top_locations.len()
    );
}
