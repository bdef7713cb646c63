//! Printpress Library
//!
//! Converts office documents and images to PDF and merges PDFs.
//! This library provides functionality to:
//! - Classify inputs by extension and convert them one by one
//! - Drive Microsoft Office through generated VBScript or PowerShell
//! - Rasterize images with ImageMagick onto fitted A4 pages
//! - Merge multiple PDF files in caller order
//! - Extract metadata (page counts, titles)
//!
//! # Example
//!
//! ```no_run
//! use printpress::{ConverterConfig, FileConverter, SettingsStore};
//! use std::path::{Path, PathBuf};
//!
//! let converter = FileConverter::new(&ConverterConfig::detect(), SettingsStore::default_location());
//!
//! let results = converter.convert_batch(
//!     &[PathBuf::from("report.docx"), PathBuf::from("scan.png")],
//!     Path::new("out"),
//! );
//! for result in &results {
//!     println!("{}: {}", result.file_name, result.is_success());
//! }
//! ```

pub mod config;
pub mod converter;
pub mod error;
pub mod format;
pub mod layout;
pub mod office;
pub mod pdf;
pub mod process;
pub mod raster;
pub mod settings;
pub mod temp;

// Re-export commonly used items
pub use config::ConverterConfig;
pub use converter::{ConversionOutcome, ConversionResult, FileConverter};
pub use error::{Error, Result};
pub use format::{classify, FileFamily, OfficeKind};
pub use office::{AvailabilityState, EffectiveMethod};
pub use settings::{ConversionMethod, Settings, SettingsStore};
