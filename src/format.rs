//! Input classification by file extension

use std::path::Path;

/// Extensions handled through office automation
pub const OFFICE_EXTENSIONS: &[&str] = &["doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// Extensions handled through the raster engine
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "heic"];

/// Office document kind, which selects the automation procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeKind {
    /// Word processor documents (.doc, .docx)
    WordProcessor,
    /// Spreadsheets (.xls, .xlsx)
    Spreadsheet,
    /// Presentations (.ppt, .pptx)
    Presentation,
}

impl OfficeKind {
    /// Short name used in temp script file names
    pub fn script_stem(&self) -> &'static str {
        match self {
            OfficeKind::WordProcessor => "word",
            OfficeKind::Spreadsheet => "excel",
            OfficeKind::Presentation => "powerpoint",
        }
    }
}

/// Format family of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFamily {
    Office(OfficeKind),
    Image,
    Unsupported,
}

impl FileFamily {
    pub fn is_supported(&self) -> bool {
        !matches!(self, FileFamily::Unsupported)
    }
}

/// Lowercased extension with a leading dot, or an empty string
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Classify a path by its extension (case-insensitive)
pub fn classify(path: &Path) -> FileFamily {
    let ext = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => return FileFamily::Unsupported,
    };

    match ext.as_str() {
        "doc" | "docx" => FileFamily::Office(OfficeKind::WordProcessor),
        "xls" | "xlsx" => FileFamily::Office(OfficeKind::Spreadsheet),
        "ppt" | "pptx" => FileFamily::Office(OfficeKind::Presentation),
        e if IMAGE_EXTENSIONS.contains(&e) => FileFamily::Image,
        _ => FileFamily::Unsupported,
    }
}
