//! buildnom CLI - extract Jenkins build payloads into normalized records
//!
//! Runs the build extractor on a single payload, replays NDJSON dumps of raw
//! rows, or drives a full extraction pass against the raw tables in Postgres.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use buildnom::{
    extract_build, write_records, DomainType, ExtractionReport, ExtractorConfig, MemoryRawSource,
    RawRow, RecordFormat, RunnerOptions, TaskRegistry, WriterSink, RAW_BUILD_TABLE,
};

#[derive(Parser)]
#[command(name = "buildnom")]
#[command(version, about = "Extract Jenkins build payloads into normalized build records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one raw build payload and print the resulting records
    Extract {
        /// File holding the build API response (the raw row's data)
        #[arg(short, long)]
        data: PathBuf,

        /// File holding the job context (the raw row's input)
        #[arg(short, long)]
        input: PathBuf,

        /// Jenkins connection id stamped on the records
        #[arg(short, long, default_value = "1")]
        connection_id: u64,

        /// Output format: ndjson or json
        #[arg(long, default_value = "ndjson")]
        format: RecordFormat,

        /// Pretty-print a JSON array (implies --format json)
        #[arg(short, long)]
        pretty: bool,
    },

    /// Run an extraction pass over an NDJSON dump of raw rows
    Replay {
        /// NDJSON file, one raw row per line: {"id":..,"data":{..},"input":{..}}
        #[arg(short, long)]
        rows: PathBuf,

        /// Optional YAML configuration (batch size, workers, error policy)
        #[arg(short = 'f', long)]
        config: Option<PathBuf>,

        /// Jenkins connection id, overrides the configuration
        #[arg(short, long)]
        connection_id: Option<u64>,

        /// Write records here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run an extraction pass against the raw tables in Postgres
    #[cfg(feature = "postgres")]
    Run {
        /// Optional YAML configuration
        #[arg(short = 'f', long)]
        config: Option<PathBuf>,

        /// Jenkins connection id, overrides the configuration
        #[arg(short, long)]
        connection_id: Option<u64>,

        /// Only run this subtask (default: every enabled subtask)
        #[arg(short, long)]
        task: Option<String>,
    },

    /// List registered subtasks
    Tasks {
        /// Only list subtasks producing this domain (e.g. CICD, CODE)
        #[arg(short, long)]
        domain: Option<DomainType>,
    },
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { data, input, connection_id, format, pretty } => {
            extract_one(data, input, connection_id, format, pretty)
        }
        Commands::Replay { rows, config, connection_id, output } => {
            replay(rows, config, connection_id, output)
        }
        #[cfg(feature = "postgres")]
        Commands::Run { config, connection_id, task } => {
            run_database(config, connection_id, task)
        }
        Commands::Tasks { domain } => list_tasks(domain),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Extract a single build from two files
fn extract_one(
    data: PathBuf,
    input: PathBuf,
    connection_id: u64,
    format: RecordFormat,
    pretty: bool,
) -> Result<(), String> {
    let data_bytes = std::fs::read(&data)
        .map_err(|e| format!("Failed to read {}: {}", data.display(), e))?;
    let input_bytes = std::fs::read(&input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;

    let records = extract_build(connection_id, &data_bytes, &input_bytes)
        .map_err(|e| e.to_string())?
        .into_records();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, &records)
            .map_err(|e| format!("Failed to write records: {}", e))?;
        writeln!(out).map_err(|e| format!("Failed to write records: {}", e))?;
    } else {
        write_records(&mut out, format, &records)
            .map_err(|e| format!("Failed to write records: {}", e))?;
    }

    Ok(())
}

/// Load configuration: defaults <- file <- env <- CLI
fn load_config(config: Option<PathBuf>, connection_id: Option<u64>) -> Result<ExtractorConfig, String> {
    let mut loaded = ExtractorConfig::load(config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(id) = connection_id {
        loaded.connection_id = id;
    }
    Ok(loaded)
}

fn read_rows(path: &Path, params: &str) -> Result<Vec<RawRow>, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let mut rows = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = RawRow::from_ndjson_line(&line, params)
            .map_err(|e| format!("Line {}: invalid raw row: {}", line_num + 1, e))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Replay an NDJSON dump through the extraction runtime
fn replay(
    rows: PathBuf,
    config: Option<PathBuf>,
    connection_id: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let config = load_config(config, connection_id)?;
    let registry = TaskRegistry::jenkins(config.connection_id).map_err(|e| e.to_string())?;
    let task = registry.get("extractApiBuilds").map_err(|e| e.to_string())?;

    let raw_rows = read_rows(&rows, &task.args.params_key())?;
    eprintln!("  ✓ Loaded {} raw rows from {}", raw_rows.len(), rows.display());
    let mut source = MemoryRawSource::new(RAW_BUILD_TABLE, raw_rows);

    let runner = task
        .runner(RunnerOptions::from(&config))
        .map_err(|e| e.to_string())?;

    let report = match output {
        Some(path) => {
            let file = File::create(&path)
                .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
            let mut sink = WriterSink::new(BufWriter::new(file));
            runner.execute(&mut source, &mut sink).map_err(|e| e.to_string())?
        }
        None => {
            let stdout = io::stdout();
            let mut sink = WriterSink::new(stdout.lock());
            runner.execute(&mut source, &mut sink).map_err(|e| e.to_string())?
        }
    };

    print_report(&report);
    Ok(())
}

/// Run every enabled subtask (or just `task`) against Postgres
#[cfg(feature = "postgres")]
fn run_database(
    config: Option<PathBuf>,
    connection_id: Option<u64>,
    task: Option<String>,
) -> Result<(), String> {
    use buildnom::{Database, DieselRawSource, DieselRecordSink};

    let config = load_config(config, connection_id)?;
    let database_url = config
        .database_url
        .clone()
        .ok_or_else(|| "DATABASE_URL is not set (env or config file)".to_string())?;

    let db = Database::new(&database_url).map_err(|e| format!("Failed to connect: {}", e))?;
    db.test_connection().map_err(|e| format!("Database not reachable: {}", e))?;

    let registry = TaskRegistry::jenkins(config.connection_id).map_err(|e| e.to_string())?;
    let tasks = match task {
        Some(name) => vec![registry.get(&name).map_err(|e| e.to_string())?],
        None => registry.enabled().collect(),
    };

    for task in tasks {
        eprintln!("  ℹ Running {} for connection {}", task.meta.name, config.connection_id);
        let runner = task
            .runner(RunnerOptions::from(&config))
            .map_err(|e| e.to_string())?;
        let mut source = DieselRawSource::new(db.clone());
        let mut sink = DieselRecordSink::new(db.clone());
        let report = runner.execute(&mut source, &mut sink).map_err(|e| e.to_string())?;
        print_report(&report);
    }

    Ok(())
}

fn list_tasks(domain: Option<DomainType>) -> Result<(), String> {
    let registry = TaskRegistry::jenkins(1).map_err(|e| e.to_string())?;

    let tasks = match domain {
        Some(domain) => registry.covering(domain),
        None => registry.list(),
    };

    for meta in tasks {
        let domains: Vec<String> = meta.domain_types.iter().map(|d| d.to_string()).collect();
        println!(
            "{:<20} {:<8} [{}] {}",
            meta.name,
            if meta.enabled_by_default { "enabled" } else { "disabled" },
            domains.join(","),
            meta.description
        );
    }
    Ok(())
}

fn print_report(report: &ExtractionReport) {
    eprintln!(
        "  ✓ {} rows -> {} builds, {} build commits ({} stale records removed)",
        report.rows_processed, report.builds, report.build_commits, report.deleted
    );
    for failure in &report.failures {
        eprintln!("  ✗ row {}: {}", failure.row_id, failure.message);
    }
    eprintln!("✨ Run {} complete", report.run_id);
}
