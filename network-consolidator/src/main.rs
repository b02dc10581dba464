use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use network_consolidator::consolidate::{merge_trip_variants, route_stop_orders};
use network_consolidator::pipeline::{
    ConsolidationConfig, ConsolidationPipeline, NetworkDatabase, PipelineError, TracingLog,
};
use network_consolidator::shape_graph::RouteShapeGraph;
use network_consolidator::source::{SourceError, SourceFile, load_source_dir, load_source_file};

const USAGE: &str = "usage: network-consolidator [--config FILE] [--no-geometry] BATCH...\n\
                     BATCH is a JSON batch file or a directory of them";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\n{usage}", usage = USAGE)]
    Usage(String),

    #[error("failed to read config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

struct Args {
    config: Option<PathBuf>,
    no_geometry: bool,
    inputs: Vec<PathBuf>,
}

fn parse_args() -> Result<Args, CliError> {
    let mut args = Args {
        config: None,
        no_geometry: false,
        inputs: Vec::new(),
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--config needs a file".into()))?;
                args.config = Some(PathBuf::from(path));
            }
            "--no-geometry" => args.no_geometry = true,
            "-h" | "--help" => return Err(CliError::Usage("".into())),
            other if other.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown option {other}")));
            }
            _ => args.inputs.push(PathBuf::from(arg)),
        }
    }

    if args.inputs.is_empty() {
        return Err(CliError::Usage("no batch files given".into()));
    }
    Ok(args)
}

fn load_config(path: &Path) -> Result<ConsolidationConfig, CliError> {
    let config_err = |message: String| CliError::Config {
        path: path.to_path_buf(),
        message,
    };
    let json = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
    serde_json::from_str(&json).map_err(|e| config_err(e.to_string()))
}

fn load_inputs(inputs: &[PathBuf]) -> Result<Vec<SourceFile>, CliError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(load_source_dir(input)?);
        } else {
            files.push(load_source_file(input)?);
        }
    }
    Ok(files)
}

fn run() -> Result<serde_json::Value, CliError> {
    let args = parse_args()?;

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ConsolidationConfig::default(),
    };
    if args.no_geometry {
        config.build_geometry = false;
    }

    let files = load_inputs(&args.inputs)?;
    info!(files = files.len(), "Loaded batch files");

    let mut db = NetworkDatabase::new();
    if config.build_geometry {
        db = db.with_shape_graph(RouteShapeGraph::with_tolerance(config.on_edge_tolerance_m));
    }

    let mut log = TracingLog::new();
    let mut batches = Vec::with_capacity(files.len());
    {
        let mut pipeline = ConsolidationPipeline::new(&mut db, &config, &mut log);
        for file in &files {
            batches.push(pipeline.ingest(file)?);
        }
    }

    let variants = merge_trip_variants(db.trip_versions());
    let stop_orders: serde_json::Map<String, serde_json::Value> = route_stop_orders(&db)
        .into_iter()
        .map(|(line, stops)| {
            let stops: Vec<String> = stops.iter().map(ToString::to_string).collect();
            (line.to_string(), json!(stops))
        })
        .collect();

    info!(
        warnings = log.warnings(),
        errors = log.errors(),
        "Consolidation finished"
    );

    Ok(json!({
        "batches": batches,
        "network": db.stats(),
        "issues": { "warnings": log.warnings(), "errors": log.errors() },
        "merged_trip_variants": variants.len(),
        "route_stop_orders": stop_orders,
    }))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render report: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
