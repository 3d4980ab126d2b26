use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use schema_codegen::config::{self, LoggingConfig};
use schema_codegen::utils::logging::init_logging;
use schema_codegen::{
    respond, Config, Dialect, DirectoryStore, Endpoint, GenerateResponse, GenerationRequest, Generator,
    InputKind, Language,
};

/// schema_codegen - generate model source code from DDL scripts and CSV samples
#[derive(Parser)]
#[command(name = "schema_codegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (TOML, or YAML by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Target {
    /// Target language (go, rust, typescript, python, php)
    #[arg(short, long)]
    lang: String,

    /// Target RDBMS (mysql, postgresql, sqlite)
    #[arg(short, long)]
    rdbms: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code from a DDL script
    Generate {
        /// DDL script
        #[arg(long)]
        ddl: PathBuf,

        #[command(flatten)]
        target: Target,
    },

    /// Generate code from a CSV sample
    Csv {
        /// CSV file; the table is named after it
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        target: Target,
    },

    /// Generate code for every DDL and CSV file below a directory
    Batch {
        /// Directory to walk
        #[arg(short, long)]
        dir: PathBuf,

        /// Only process files whose name matches this glob
        #[arg(short, long)]
        pattern: Option<String>,

        #[command(flatten)]
        target: Target,
    },

    /// List accepted language and RDBMS identifiers
    Targets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_from_file(&path.to_string_lossy())
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None if Path::new("codegen.toml").exists() => config::load_from_file("codegen.toml")?,
        None => Config::default(),
    };
    if cli.verbose {
        let mut logging = config.logging.clone().unwrap_or_default();
        logging.level = "debug".to_string();
        config.logging = Some(logging);
    } else if config.logging.is_none() {
        config.logging = Some(LoggingConfig {
            level: "warn".to_string(),
            ..Default::default()
        });
    }
    init_logging(&config.logging)?;

    let store = DirectoryStore::new(&config.output.directory, &config.output.archive_prefix);
    let generator = Generator::new(Arc::new(config))?;

    let succeeded = match cli.command {
        Commands::Generate { ddl, target } => {
            run_file(&generator, &store, Endpoint::Generate, &ddl, &target).await?
        }
        Commands::Csv { file, target } => {
            run_file(&generator, &store, Endpoint::Csv, &file, &target).await?
        }
        Commands::Batch { dir, pattern, target } => {
            batch_command(&generator, &store, &dir, pattern.as_deref(), &target).await?
        }
        Commands::Targets => {
            targets_command();
            true
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

/// Run one file through the pipeline and print the response body
async fn run_file(
    generator: &Generator,
    store: &DirectoryStore,
    endpoint: Endpoint,
    path: &Path,
    target: &Target,
) -> Result<bool> {
    let input = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let request = GenerationRequest::new(endpoint.input_kind(), input, &file_name, &target.lang, &target.rdbms);
    let response: GenerateResponse = respond(generator, store, endpoint, &request).await;
    println!("{}", response.to_json()?);
    Ok(response.is_success())
}

/// Walk a directory and generate code for each DDL or CSV file found
async fn batch_command(
    generator: &Generator,
    store: &DirectoryStore,
    dir: &Path,
    pattern: Option<&str>,
    target: &Target,
) -> Result<bool> {
    let pattern = pattern
        .map(Pattern::new)
        .transpose()
        .context("Invalid --pattern")?;

    let mut files: Vec<(PathBuf, InputKind)> = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if let Some(pattern) = &pattern {
            if !pattern.matches(&name) {
                continue;
            }
        }
        if let Some(kind) = InputKind::from_path(entry.path()) {
            files.push((entry.path().to_path_buf(), kind));
        }
    }

    if files.is_empty() {
        eprintln!("No .sql, .ddl or .csv files found in {}", dir.display());
        return Ok(false);
    }

    let mut all_succeeded = true;
    for (path, kind) in files {
        let endpoint = match kind {
            InputKind::Ddl => Endpoint::Generate,
            InputKind::Csv => Endpoint::Csv,
        };
        eprintln!("{}", path.display());
        all_succeeded &= run_file(generator, store, endpoint, &path, target).await?;
    }
    Ok(all_succeeded)
}

fn targets_command() {
    println!("Languages:");
    for language in Language::ALL {
        println!("  {:<12} {}", language.id(), language.aliases().join(", "));
    }
    println!("RDBMS:");
    for dialect in Dialect::ALL {
        println!("  {:<12} {}", dialect.id(), dialect.aliases().join(", "));
    }
}
