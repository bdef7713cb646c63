//! PDF merging functionality using lopdf
//!
//! All inputs are loaded and assembled in memory before anything is written,
//! so a bad input aborts the merge with no output file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};
use crate::pdf::metadata::DocumentInfo;
use crate::pdf::save::save_document;

/// Page attributes that may be inherited from ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic Parent chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Merge multiple PDF files into a single PDF
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// Pages appear in input order. Any missing, unreadable, encrypted or empty
/// input fails the whole merge with [`Error::Merge`].
///
/// # Example
///
/// ```no_run
/// use printpress::pdf::{MergeOptions, merge_pdfs};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("1. first.pdf"),
///         PathBuf::from("2. second.pdf"),
///     ],
///     output_path: PathBuf::from("merged.pdf"),
/// };
///
/// merge_pdfs(&options).expect("Failed to merge");
/// ```
pub fn merge_pdfs(options: &MergeOptions) -> Result<PathBuf> {
    if options.input_paths.is_empty() {
        return Err(Error::Merge {
            reason: "No input files provided".to_string(),
        });
    }

    let mut documents = Vec::with_capacity(options.input_paths.len());
    for path in &options.input_paths {
        documents.push(load_source(path)?);
    }

    let mut merged = assemble(documents);
    DocumentInfo::for_merge().apply(&mut merged);
    merged.compress();

    save_document(&mut merged, &options.output_path)
        .map_err(|e| Error::merge(&options.output_path, e))?;

    tracing::info!(
        inputs = options.input_paths.len(),
        output = %options.output_path.display(),
        "merged pdfs"
    );
    Ok(options.output_path.clone())
}

/// Load one merge input and make every page self-contained
fn load_source(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::merge(path, "file not found"));
    }

    let mut doc = Document::load(path).map_err(|e| Error::merge(path, e))?;

    if doc.is_encrypted() {
        return Err(Error::merge(path, "document is encrypted"));
    }
    if doc.get_pages().is_empty() {
        return Err(Error::merge(path, "document has no pages"));
    }

    flatten_inherited_attributes(&mut doc);
    Ok(doc)
}

/// Combine loaded documents into one, keeping document and page order
pub fn assemble(documents: Vec<Document>) -> Document {
    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_values());
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);

    // new_object_id() must not collide with the objects just added
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(page) = merged.get_dictionary_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    // Source catalogs and page tree nodes are now unreachable
    merged.prune_objects();

    merged
}

/// Copy inherited page attributes onto each page so it can be re-parented
fn flatten_inherited_attributes(doc: &mut Document) {
    for page_id in doc.get_pages().into_values() {
        let inherited = inherited_attributes(doc, page_id);
        if inherited.is_empty() {
            continue;
        }
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }
}

fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };

    let mut missing: Vec<&[u8]> = INHERITABLE.iter().copied().filter(|key| !page.has(key)).collect();
    let mut found = Vec::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(node_id) = parent {
        if missing.is_empty() || depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };

        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });

        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Two-level page tree whose only page inherits MediaBox and Resources
    fn nested_tree_document() -> Document {
        let mut doc = Document::with_version("1.5");
        let root_id = doc.new_object_id();
        let inner_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => inner_id,
        });
        doc.objects.insert(
            inner_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => root_id,
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "Resources" => Dictionary::new(),
            }),
        );
        doc.objects.insert(
            root_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(inner_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => root_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_merge_options_creation() {
        let options = MergeOptions {
            input_paths: vec![PathBuf::from("test1.pdf"), PathBuf::from("test2.pdf")],
            output_path: PathBuf::from("merged.pdf"),
        };

        assert_eq!(options.input_paths.len(), 2);
        assert_eq!(options.output_path, Path::new("merged.pdf"));
    }

    #[test]
    fn test_flatten_pulls_attributes_from_ancestors() {
        let mut doc = nested_tree_document();
        flatten_inherited_attributes(&mut doc);

        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
        assert!(!page.has(b"CropBox"));
    }

    #[test]
    fn test_assemble_reparents_and_prunes() {
        let mut a = nested_tree_document();
        let mut b = nested_tree_document();
        flatten_inherited_attributes(&mut a);
        flatten_inherited_attributes(&mut b);

        let merged = assemble(vec![a, b]);
        let pages = merged.get_pages();
        assert_eq!(pages.len(), 2);

        let root_pages = merged
            .catalog()
            .unwrap()
            .get(b"Pages")
            .unwrap()
            .as_reference()
            .unwrap();
        for page_id in pages.values() {
            let page = merged.get_dictionary(*page_id).unwrap();
            assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), root_pages);
            assert!(page.has(b"MediaBox"));
        }

        let page_tree_nodes = merged
            .objects
            .values()
            .filter(|o| matches!(o.as_dict().and_then(|d| d.get(b"Type")), Ok(Object::Name(n)) if n == b"Pages"))
            .count();
        assert_eq!(page_tree_nodes, 1);
    }

    #[test]
    fn test_empty_input_list() {
        let options = MergeOptions {
            input_paths: vec![],
            output_path: PathBuf::from("never.pdf"),
        };
        let err = merge_pdfs(&options).unwrap_err();
        assert!(err.to_string().contains("No input files"));
    }
}
