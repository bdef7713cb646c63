//! Format routing and batch conversion
//!
//! [`FileConverter`] is the caller-facing entry point: it classifies each
//! input, hands it to the office or image pipeline, and merges PDFs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::ConverterConfig;
use crate::error::{Error, Result};
use crate::format::{classify, dotted_extension, FileFamily};
use crate::office::OfficeAutomationStrategy;
use crate::pdf::{merge_pdfs, MergeOptions};
use crate::process::{CommandRunner, SystemRunner};
use crate::raster::ImageRasterPipeline;
use crate::settings::SettingsStore;

/// Outcome of converting one file in a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: ConversionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConversionOutcome {
    Success {
        #[serde(rename = "outputPath")]
        output_path: PathBuf,
    },
    Error {
        error: String,
    },
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ConversionOutcome::Success { .. })
    }
}

/// Converts documents and images to PDF and merges PDFs
#[derive(Debug)]
pub struct FileConverter {
    settings: SettingsStore,
    office: OfficeAutomationStrategy,
    raster: ImageRasterPipeline,
}

impl FileConverter {
    /// Converter that runs real external programs
    pub fn new(config: &ConverterConfig, settings: SettingsStore) -> Self {
        Self::with_runner(config, settings, Arc::new(SystemRunner))
    }

    /// Converter with a custom process runner
    pub fn with_runner(config: &ConverterConfig, settings: SettingsStore, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            office: OfficeAutomationStrategy::new(config, runner.clone()),
            raster: ImageRasterPipeline::new(&config.raster_engine, runner),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Convert one file to `<output_folder>/<stem>.pdf`
    ///
    /// `output_folder` is created if it does not exist.
    pub fn convert_to_pdf(&self, source: &Path, output_folder: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_folder)?;
        let output = output_path(source, output_folder);

        match classify(source) {
            FileFamily::Office(kind) => {
                let method = self.settings.conversion_method();
                self.office.convert(kind, source, &output, method)
            }
            FileFamily::Image => self.raster.convert(source, &output),
            FileFamily::Unsupported => Err(Error::UnsupportedFormat {
                extension: dotted_extension(source),
            }),
        }
    }

    /// Convert files one after another; a failure only affects its own entry
    pub fn convert_batch(&self, sources: &[PathBuf], output_folder: &Path) -> Vec<ConversionResult> {
        sources
            .iter()
            .map(|source| {
                let file_name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| source.display().to_string());

                let outcome = match self.convert_to_pdf(source, output_folder) {
                    Ok(output_path) => {
                        tracing::info!(file = %file_name, output = %output_path.display(), "converted");
                        ConversionOutcome::Success { output_path }
                    }
                    Err(e) => {
                        tracing::info!(file = %file_name, error = %e, "conversion failed");
                        ConversionOutcome::Error { error: e.to_string() }
                    }
                };

                ConversionResult { file_name, outcome }
            })
            .collect()
    }

    /// Merge PDFs in the given order into `output`
    pub fn merge_pdfs(&self, inputs: &[PathBuf], output: &Path) -> Result<PathBuf> {
        merge_pdfs(&MergeOptions {
            input_paths: inputs.to_vec(),
            output_path: output.to_path_buf(),
        })
    }

    /// Whether resident Office automation is available; probed once
    pub fn check_office_availability(&self) -> bool {
        self.office.probe().check_availability()
    }

    /// Description of the method the next office conversion would use
    pub fn effective_method_description(&self) -> String {
        let method = self.office.resolve_method(self.settings.conversion_method());
        method.description().to_string()
    }
}

fn output_path(source: &Path, output_folder: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    let mut name = stem.to_os_string();
    name.push(".pdf");
    output_folder.join(name)
}
