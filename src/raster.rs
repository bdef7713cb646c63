//! Image to PDF conversion through an external raster engine
//!
//! The engine (ImageMagick) normalizes any supported input into a PNG at a
//! temp path. The PNG is then placed on a single A4 page.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pdf::{image_page_document, save_document, DocumentInfo};
use crate::process::{run_checked, CommandRunner, Invocation};
use crate::temp::{TempKind, TempResource};

/// Converts images to single-page PDFs
#[derive(Debug)]
pub struct ImageRasterPipeline {
    engine: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl ImageRasterPipeline {
    pub fn new(engine: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            engine: engine.into(),
            runner,
        }
    }

    pub fn engine(&self) -> &Path {
        &self.engine
    }

    /// Convert `source` to a one-page PDF at `output`
    ///
    /// The intermediate bitmap, including any numbered frames, is removed
    /// before this returns, whatever the outcome.
    pub fn convert(&self, source: &Path, output: &Path) -> Result<PathBuf> {
        let bitmap = TempResource::reserve(TempKind::Bitmap, "temp_magick", "png")?;

        let invocation = Invocation::new(&self.engine).arg(source).arg(bitmap.path());
        run_checked(self.runner.as_ref(), &invocation).map_err(|e| Error::raster(e.to_string()))?;

        // Multi-frame inputs (multi-page TIFF) come out as numbered frames; the first is used
        let Some(produced) = bitmap.produced() else {
            return Err(Error::raster(format!(
                "no output file created for {}",
                source.display()
            )));
        };

        let image = image::open(&produced)
            .map_err(|e| Error::raster(format!("could not read intermediate bitmap: {e}")))?;

        let title = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut doc = image_page_document(&image, &DocumentInfo::for_image(title))?;
        save_document(&mut doc, output)?;

        tracing::debug!(
            source = %source.display(),
            width = image.width(),
            height = image.height(),
            "image page written"
        );
        Ok(output.to_path_buf())
    }
}
