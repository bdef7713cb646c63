//! PDF document module: page creation, merging, metadata and saving

pub mod create;
pub mod merge;
pub mod metadata;
pub mod save;

// Re-export commonly used items
pub use create::{image_page_document, image_page_document_with_layout};
pub use merge::{merge_pdfs, MergeOptions};
pub use metadata::{count_pages, extract_metadata, DocumentInfo, PdfMetadata};
pub use save::save_document;
