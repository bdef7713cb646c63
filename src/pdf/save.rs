//! Atomic PDF serialization

use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::Document;
use tempfile::Builder;

use crate::error::Result;

/// Serialize `doc` to `output` without object streams
///
/// The bytes go to a temp file next to `output`, which replaces `output`
/// only after the write completed. A failed save leaves any existing file at
/// `output` untouched and no partial file behind.
pub fn save_document(doc: &mut Document, output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = Builder::new()
        .prefix(".printpress-")
        .suffix(".pdf.part")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        doc.save_to(&mut writer)?;
        writer.flush()?;
    }
    staged.as_file().sync_all()?;
    staged.persist(output).map_err(|e| e.error)?;

    tracing::debug!(output = %output.display(), "pdf written");
    Ok(())
}
