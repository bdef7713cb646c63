//! Document information dictionary: writing and reading

use std::path::Path;

use chrono::{DateTime, Local};
use lopdf::{Dictionary, Document, Object, StringFormat};

use crate::error::{Error, Result};

/// Creator recorded on every document this crate writes
pub const CREATOR: &str = "The Printing Press File Converter";
/// Producer recorded on every document this crate writes
pub const PRODUCER: &str = concat!("The Printing Press File Converter v", env!("CARGO_PKG_VERSION"));

/// Metadata written into the trailer's Info dictionary
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub subject: String,
    pub creator: String,
    pub producer: String,
    pub created: DateTime<Local>,
    pub modified: DateTime<Local>,
}

impl DocumentInfo {
    /// Metadata for a single image page
    pub fn for_image(title: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            title: title.into(),
            subject: "Image converted to PDF via ImageMagick".to_string(),
            creator: CREATOR.to_string(),
            producer: PRODUCER.to_string(),
            created: now,
            modified: now,
        }
    }

    /// Metadata for a merged document
    pub fn for_merge() -> Self {
        let now = Local::now();
        Self {
            title: "Merged Documents".to_string(),
            subject: "Multiple PDFs merged into one document".to_string(),
            creator: CREATOR.to_string(),
            producer: PRODUCER.to_string(),
            created: now,
            modified: now,
        }
    }

    /// Add an Info dictionary to `doc` and point the trailer at it
    pub fn apply(&self, doc: &mut Document) {
        let mut info = Dictionary::new();
        info.set("Title", text_string(&self.title));
        info.set("Subject", text_string(&self.subject));
        info.set("Creator", text_string(&self.creator));
        info.set("Producer", text_string(&self.producer));
        info.set("CreationDate", Object::string_literal(pdf_date(&self.created)));
        info.set("ModDate", Object::string_literal(pdf_date(&self.modified)));

        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }
}

/// PDF date string, e.g. `D:20240105093000+01'00'`
pub fn pdf_date(at: &DateTime<Local>) -> String {
    let offset = at.format("%:z").to_string().replace(':', "'");
    format!("D:{}{}'", at.format("%Y%m%d%H%M%S"), offset)
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
pub fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc.catalog()?;
    let pages_id = catalog.get(b"Pages").and_then(Object::as_reference)?;
    let count = doc.get_dictionary(pages_id)?.get(b"Count")?.as_i64()?;
    Ok(usize::try_from(count).unwrap_or(0))
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document subject (if present)
    pub subject: Option<String>,
    /// Producing application (if present)
    pub producer: Option<String>,
}

fn info_entry(info: &Dictionary, key: &[u8]) -> Option<String> {
    info.get(key)
        .and_then(Object::as_str)
        .ok()
        .map(decode_text_string)
}

/// Read page count and Info entries from a loaded document
pub fn document_metadata(doc: &Document) -> Result<PdfMetadata> {
    let page_count = count_pages_from_catalog(doc)?;

    let info = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .ok();

    Ok(PdfMetadata {
        page_count,
        title: info.and_then(|d| info_entry(d, b"Title")),
        subject: info.and_then(|d| info_entry(d, b"Subject")),
        producer: info.and_then(|d| info_entry(d, b"Producer")),
    })
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    let doc = Document::load(path)?;
    document_metadata(&doc)
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    Ok(extract_metadata(path)?.page_count)
}
