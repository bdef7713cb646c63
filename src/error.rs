//! Error types for the printpress library

use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Hint appended to every office automation failure
pub const OFFICE_HINT: &str = "Ensure Microsoft Office is installed.";

/// Main error type for the printpress library
#[derive(Error, Debug)]
pub enum Error {
    /// Input extension is neither an office document nor an image
    #[error(
        "Unsupported file format: {extension}. Supported formats: Office documents (.doc, .docx, .xls, .xlsx, .ppt, .pptx) and images (.jpg, .jpeg, .png, .tiff, .tif, .heic)."
    )]
    UnsupportedFormat { extension: String },

    /// Both the resident and the scripted automation attempts failed
    #[error("Office conversion failed: {cause}{}. {}", resident_note(.resident_cause), OFFICE_HINT)]
    OfficeAutomation {
        cause: String,
        resident_cause: Option<String>,
    },

    /// Raster engine failed or produced no intermediate bitmap
    #[error("Image conversion failed: {detail}")]
    RasterEngine { detail: String },

    /// Any merge input was missing, unreadable, corrupt or empty
    #[error("PDF merge failed: {reason}")]
    Merge { reason: String },

    /// External program could not be spawned or exited unsuccessfully
    #[error("{program} failed: {detail}")]
    Process { program: String, detail: String },

    /// Settings key or value rejected
    #[error("Settings error: {0}")]
    Settings(String),

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn resident_note(resident_cause: &Option<String>) -> String {
    match resident_cause {
        Some(cause) => format!(" (resident automation failed first: {cause})"),
        None => String::new(),
    }
}

impl Error {
    /// Merge failure attributed to one input file
    pub fn merge(path: &Path, cause: impl std::fmt::Display) -> Self {
        Error::Merge {
            reason: format!("{}: {}", path.display(), cause),
        }
    }

    /// Raster engine failure
    pub fn raster(detail: impl Into<String>) -> Self {
        Error::RasterEngine {
            detail: detail.into(),
        }
    }
}
