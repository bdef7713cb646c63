//! Printpress CLI tool
//!
//! A command-line front end for converting files to PDF and merging PDFs.

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing_subscriber::EnvFilter;

use printpress::config::RESOURCES_ENV;
use printpress::pdf::extract_metadata;
use printpress::{ConverterConfig, FileConverter, SettingsStore};

/// Printpress - Convert documents and images to PDF
#[derive(Parser)]
#[command(name = "printpress")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Convert documents and images into a folder
    printpress convert -o out report.docx budget.xlsx scan.png

    # Merge numbered PDFs in order
    printpress merge -o handout.pdf \"[0-9]*.pdf\"

    # Force PowerShell automation
    printpress settings set officeConversionMethod powershell")]
struct Cli {
    /// Directory holding bundled tools
    #[arg(long, global = true, env = RESOURCES_ENV)]
    resources: Option<PathBuf>,

    /// Path to the ImageMagick executable
    #[arg(long, global = true, env = "PRINTPRESS_MAGICK")]
    magick: Option<PathBuf>,

    /// Log external commands and per-file outcomes
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert office documents and images to PDF
    Convert {
        /// Files to convert. Supports glob patterns like "*.docx"
        #[arg(required = true)]
        files: Vec<String>,

        /// Output folder (defaults to the defaultOutputFolder setting)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge multiple PDF files into one
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check whether Microsoft Office automation is available
    CheckOffice,

    /// Show the Office conversion method that will be used
    Method,

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print all settings
    Show,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run a command; `Ok(false)` means it completed with failures
fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.resources {
        Some(dir) => ConverterConfig::with_resources(dir),
        None => ConverterConfig::detect(),
    };
    if let Some(magick) = cli.magick {
        config = config.raster_engine(magick);
    }
    let settings = SettingsStore::default_location();

    match cli.command {
        Commands::Convert { files, output, json } => {
            cmd_convert(&FileConverter::new(&config, settings), files, output, json)
        }
        Commands::Merge { inputs, output } => {
            cmd_merge(&FileConverter::new(&config, settings), inputs, output)
        }
        Commands::CheckOffice => {
            let available = FileConverter::new(&config, settings).check_office_availability();
            println!("{}", if available { "available" } else { "unavailable" });
            Ok(true)
        }
        Commands::Method => {
            println!("{}", FileConverter::new(&config, settings).effective_method_description());
            Ok(true)
        }
        Commands::Settings { action } => cmd_settings(&settings, action),
        Commands::Info { input } => cmd_info(input),
    }
}

/// Expand glob patterns in input paths
///
/// Matches of one pattern are sorted lexically and stay at that pattern's
/// position; argument order is otherwise preserved.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("invalid pattern: {}", pattern))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => tracing::warn!(pattern = %pattern, error = %e, "glob error"),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matched.sort();
            paths.extend(matched);
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Convert files into the output folder
fn cmd_convert(converter: &FileConverter, files: Vec<String>, output: Option<PathBuf>, json: bool) -> Result<bool> {
    let files = expand_globs(files)?;
    let folder = output.unwrap_or_else(|| converter.settings().load().default_output_folder);

    let results = converter.convert_batch(&files, &folder);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            match &result.outcome {
                printpress::ConversionOutcome::Success { output_path } => {
                    println!("ok     {} -> {}", result.file_name, output_path.display());
                }
                printpress::ConversionOutcome::Error { error } => {
                    println!("error  {}: {}", result.file_name, error);
                }
            }
        }
    }

    Ok(results.iter().all(|r| r.is_success()))
}

/// Merge multiple PDFs into one
fn cmd_merge(converter: &FileConverter, inputs: Vec<String>, output: PathBuf) -> Result<bool> {
    let inputs = expand_globs(inputs)?;

    eprintln!("Merging {} PDF files...", inputs.len());
    converter.merge_pdfs(&inputs, &output)?;
    eprintln!("Merged to: {}", output.display());

    Ok(true)
}

fn cmd_settings(settings: &SettingsStore, action: SettingsAction) -> Result<bool> {
    match action {
        SettingsAction::Show => {
            for (key, value) in settings.all() {
                println!("{key} = {value}");
            }
            eprintln!("({})", settings.path().display());
        }
        SettingsAction::Get { key } => println!("{}", settings.get(&key)?),
        SettingsAction::Set { key, value } => {
            settings
                .update(&key, &value)
                .with_context(|| format!("could not save {}", settings.path().display()))?;
        }
    }
    Ok(true)
}

/// Show PDF information
fn cmd_info(input: PathBuf) -> Result<bool> {
    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }

    Ok(true)
}
