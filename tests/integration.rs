//! Integration tests for the printpress library
//!
//! External programs are replaced by [`FakeTools`], which plays ImageMagick,
//! the Windows Script Host and PowerShell.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use printpress::pdf::{count_pages, extract_metadata};
use printpress::process::{CommandOutput, CommandRunner, Invocation};
use printpress::settings::KEY_METHOD;
use printpress::{ConversionOutcome, ConverterConfig, Error, FileConverter, SettingsStore};
use tempfile::TempDir;

/// Stand-in for every external tool the converter runs
#[derive(Default)]
struct FakeTools {
    office_installed: bool,
    resident_works: bool,
    scripted_works: bool,
    /// Every temp file handed to a tool (scripts and bitmaps)
    temp_paths: Mutex<Vec<PathBuf>>,
    /// Extension of each script run, in order
    scripts: Mutex<Vec<String>>,
}

impl FakeTools {
    fn magick(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let source = PathBuf::from(&invocation.args[0]);
        let target = PathBuf::from(&invocation.args[1]);
        self.temp_paths.lock().unwrap().push(target.clone());

        if source.to_string_lossy().contains("broken") {
            return Ok(CommandOutput::failed(1, "magick: improper image header"));
        }
        RgbImage::from_pixel(64, 48, Rgb([200, 100, 50]))
            .save(&target)
            .unwrap();
        Ok(CommandOutput::ok(""))
    }

    fn script_host(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let script = PathBuf::from(invocation.args.last().unwrap());
        let ext = script.extension().unwrap().to_string_lossy().into_owned();
        self.temp_paths.lock().unwrap().push(script.clone());
        self.scripts.lock().unwrap().push(ext.clone());

        let works = match ext.as_str() {
            "js" => {
                let token = if self.office_installed { "Available" } else { "NotAvailable" };
                return Ok(CommandOutput::ok(format!("{token}\r\n")));
            }
            "vbs" => self.resident_works,
            "ps1" => self.scripted_works,
            other => panic!("unexpected script type {other}"),
        };
        if !works {
            return Ok(CommandOutput::failed(1, format!("{ext}: Office is not registered")));
        }

        let text = read_script(&script);
        fs::write(export_target(&text), b"%PDF-1.5\n%fake office output\n").unwrap();
        Ok(CommandOutput::ok(""))
    }
}

impl CommandRunner for FakeTools {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let program = invocation.program_name();
        if program.starts_with("magick") {
            self.magick(invocation)
        } else {
            self.script_host(invocation)
        }
    }
}

/// Script text as the interpreter sees it: UTF-16LE or UTF-8, each with a BOM
fn read_script(path: &Path) -> String {
    let bytes = fs::read(path).unwrap();
    if let Some(utf16) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).unwrap();
    }
    let utf8 = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).expect("script without BOM");
    String::from_utf8(utf8.to_vec()).unwrap()
}

/// Output path from the export line of a generated script
fn export_target(script: &str) -> PathBuf {
    let line = script
        .lines()
        .find(|l| l.contains("SaveAs") || l.contains("ExportAsFixedFormat"))
        .unwrap();
    let quote = if line.contains('\'') { '\'' } else { '"' };
    let start = line.find(quote).unwrap() + 1;
    let end = start + line[start..].find(quote).unwrap();
    PathBuf::from(&line[start..end])
}

struct Harness {
    dir: TempDir,
    tools: Arc<FakeTools>,
    converter: FileConverter,
}

fn harness(tools: FakeTools, method: &str) -> Harness {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let settings = SettingsStore::at(dir.path().join("settings.json"));
    settings.update(KEY_METHOD, method).unwrap();

    let config = ConverterConfig::with_resources(dir.path().join("resources")).automation_capable(true);
    let tools = Arc::new(tools);
    let converter = FileConverter::with_runner(&config, settings, tools.clone());
    Harness { dir, tools, converter }
}

impl Harness {
    fn input(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, b"input").unwrap();
        path
    }

    fn assert_temp_files_removed(&self) {
        let paths = self.tools.temp_paths.lock().unwrap();
        assert!(!paths.is_empty());
        for path in paths.iter() {
            assert!(!path.exists(), "temp file left behind: {}", path.display());
        }
    }
}

/// One-page PDF whose MediaBox width identifies it
fn write_marker_pdf(path: &Path, width: i64) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), 500.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn page_widths(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let page = doc.get_dictionary(id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            media_box[2].as_float().unwrap().round() as i64
        })
        .collect()
}

#[test]
fn test_image_conversion_creates_folder_and_pdf() {
    let h = harness(FakeTools::default(), "auto");
    let source = h.input("Team Photo.png");
    let folder = h.dir.path().join("nested").join("out");

    let output = h.converter.convert_to_pdf(&source, &folder).unwrap();

    assert_eq!(output, folder.join("Team Photo.pdf"));
    assert_eq!(count_pages(&output).unwrap(), 1);
    let meta = extract_metadata(&output).unwrap();
    assert_eq!(meta.title.as_deref(), Some("Team Photo"));
    h.assert_temp_files_removed();
}

#[test]
fn test_batch_isolates_failures() {
    let h = harness(FakeTools::default(), "auto");
    let inputs = vec![
        h.input("first.jpg"),
        h.input("notes.txt"),
        h.input("broken.tiff"),
        h.input("last.heic"),
    ];
    let folder = h.dir.path().join("out");

    let results = h.converter.convert_batch(&inputs, &folder);

    assert_eq!(results.len(), 4);
    let names: Vec<_> = results.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["first.jpg", "notes.txt", "broken.tiff", "last.heic"]);

    assert!(results[0].is_success());
    match &results[1].outcome {
        ConversionOutcome::Error { error } => assert!(error.contains("Unsupported file format: .txt")),
        other => panic!("expected error, got {other:?}"),
    }
    match &results[2].outcome {
        ConversionOutcome::Error { error } => assert!(error.contains("Image conversion failed")),
        other => panic!("expected error, got {other:?}"),
    }
    assert!(results[3].is_success());

    assert!(folder.join("first.pdf").exists());
    assert!(folder.join("last.pdf").exists());
    assert!(!folder.join("broken.pdf").exists());
    h.assert_temp_files_removed();
}

#[test]
fn test_unsupported_format_is_rejected() {
    let h = harness(FakeTools::default(), "auto");
    let err = h
        .converter
        .convert_to_pdf(&h.input("archive.zip"), h.dir.path())
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedFormat { ref extension } if extension == ".zip"));
    assert!(err.to_string().contains(".docx"));
    assert!(h.tools.scripts.lock().unwrap().is_empty());
}

#[test]
fn test_office_auto_without_office_goes_straight_to_powershell() {
    let tools = FakeTools {
        scripted_works: true,
        ..Default::default()
    };
    let h = harness(tools, "auto");
    let folder = h.dir.path().join("out");

    let output = h.converter.convert_to_pdf(&h.input("budget.xlsx"), &folder).unwrap();

    assert_eq!(output, folder.join("budget.pdf"));
    assert!(output.exists());
    assert_eq!(*h.tools.scripts.lock().unwrap(), vec!["js", "ps1"]);
    h.assert_temp_files_removed();
}

#[test]
fn test_office_resident_then_single_fallback() {
    let tools = FakeTools {
        office_installed: true,
        resident_works: false,
        scripted_works: true,
        ..Default::default()
    };
    let h = harness(tools, "auto");

    let output = h
        .converter
        .convert_to_pdf(&h.input("Slides.pptx"), h.dir.path())
        .unwrap();

    assert!(output.exists());
    assert_eq!(*h.tools.scripts.lock().unwrap(), vec!["js", "vbs", "ps1"]);
    h.assert_temp_files_removed();
}

#[test]
fn test_office_failure_carries_cause_and_hint() {
    let h = harness(FakeTools::default(), "native");

    let err = h
        .converter
        .convert_to_pdf(&h.input("letter.doc"), h.dir.path())
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Ensure Microsoft Office is installed."));
    assert!(message.contains("ps1: Office is not registered"));
    assert!(message.contains("vbs: Office is not registered"));
    assert_eq!(*h.tools.scripts.lock().unwrap(), vec!["vbs", "ps1"]);
    assert!(!h.dir.path().join("letter.pdf").exists());
    h.assert_temp_files_removed();
}

#[test]
fn test_method_setting_is_read_per_conversion() {
    let tools = FakeTools {
        office_installed: true,
        resident_works: true,
        scripted_works: true,
        ..Default::default()
    };
    let h = harness(tools, "powershell");
    assert_eq!(h.converter.effective_method_description(), "Microsoft Office (PowerShell)");

    h.converter.convert_to_pdf(&h.input("a.docx"), h.dir.path()).unwrap();
    h.converter.settings().update(KEY_METHOD, "native").unwrap();
    h.converter.convert_to_pdf(&h.input("b.docx"), h.dir.path()).unwrap();

    assert_eq!(*h.tools.scripts.lock().unwrap(), vec!["ps1", "vbs"]);
    assert_eq!(h.converter.effective_method_description(), "Microsoft Office (VBS)");
}

#[test]
fn test_availability_is_probed_once() {
    let tools = FakeTools {
        office_installed: true,
        ..Default::default()
    };
    let h = harness(tools, "auto");

    assert!(h.converter.check_office_availability());
    assert!(h.converter.check_office_availability());
    assert_eq!(h.converter.effective_method_description(), "Microsoft Office (VBS)");
    assert_eq!(*h.tools.scripts.lock().unwrap(), vec!["js"]);
}

#[test]
fn test_merge_preserves_input_order() {
    let h = harness(FakeTools::default(), "auto");
    let a = h.dir.path().join("a.pdf");
    let b = h.dir.path().join("b.pdf");
    let c = h.dir.path().join("c.pdf");
    write_marker_pdf(&a, 100);
    write_marker_pdf(&b, 200);
    write_marker_pdf(&c, 300);

    let forward = h.dir.path().join("forward.pdf");
    h.converter
        .merge_pdfs(&[a.clone(), b.clone(), c.clone()], &forward)
        .expect("Failed to merge PDFs");
    assert_eq!(page_widths(&forward), vec![100, 200, 300]);

    let reversed = h.dir.path().join("reversed.pdf");
    h.converter.merge_pdfs(&[c, b, a], &reversed).unwrap();
    assert_eq!(page_widths(&reversed), vec![300, 200, 100]);

    let meta = extract_metadata(&forward).unwrap();
    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.title.as_deref(), Some("Merged Documents"));
}

#[test]
fn test_merge_missing_second_input_writes_nothing() {
    let h = harness(FakeTools::default(), "auto");
    let a = h.dir.path().join("a.pdf");
    let c = h.dir.path().join("c.pdf");
    write_marker_pdf(&a, 100);
    write_marker_pdf(&c, 300);
    let output = h.dir.path().join("merged.pdf");

    let err = h
        .converter
        .merge_pdfs(&[a, h.dir.path().join("missing.pdf"), c], &output)
        .unwrap_err();

    assert!(matches!(err, Error::Merge { .. }));
    assert!(err.to_string().contains("missing.pdf"));
    assert!(!output.exists());
}

#[test]
fn test_merge_corrupt_input_keeps_existing_output() {
    let h = harness(FakeTools::default(), "auto");
    let a = h.dir.path().join("a.pdf");
    write_marker_pdf(&a, 100);
    let corrupt = h.dir.path().join("corrupt.pdf");
    fs::write(&corrupt, b"this is not a pdf").unwrap();
    let output = h.dir.path().join("merged.pdf");
    fs::write(&output, b"previous result").unwrap();

    let err = h.converter.merge_pdfs(&[a, corrupt], &output).unwrap_err();

    assert!(matches!(err, Error::Merge { .. }));
    assert_eq!(fs::read(&output).unwrap(), b"previous result");
}

#[test]
fn test_merge_converted_images() {
    let h = harness(FakeTools::default(), "auto");
    let folder = h.dir.path().join("out");
    let results = h
        .converter
        .convert_batch(&[h.input("one.png"), h.input("two.jpg")], &folder);
    assert!(results.iter().all(|r| r.is_success()));

    let output = h.dir.path().join("album.pdf");
    h.converter
        .merge_pdfs(&[folder.join("one.pdf"), folder.join("two.pdf")], &output)
        .unwrap();

    assert_eq!(count_pages(&output).unwrap(), 2);
    assert_eq!(page_widths(&output), vec![595, 595]);
}

#[test]
fn test_office_conversion_with_accented_path() {
    let tools = FakeTools {
        office_installed: true,
        resident_works: true,
        scripted_works: true,
        ..Default::default()
    };
    let h = harness(tools, "auto");
    let folder = h.dir.path().join("Données");

    let word = h.converter.convert_to_pdf(&h.input("Résumé.docx"), &folder).unwrap();
    assert_eq!(word, folder.join("Résumé.pdf"));
    assert!(word.exists());

    h.converter.settings().update(KEY_METHOD, "powershell").unwrap();
    let deck = h.converter.convert_to_pdf(&h.input("Café deck.pptx"), &folder).unwrap();
    assert!(deck.exists());

    assert_eq!(*h.tools.scripts.lock().unwrap(), vec!["js", "vbs", "ps1"]);
    h.assert_temp_files_removed();
}
