//! Automation script generation and execution
//!
//! Two dialects drive the same Office procedure: VBScript run by the
//! resident Windows Script Host, and PowerShell. Each script opens the
//! source, exports it to PDF, closes the document and quits the application,
//! exiting non-zero on any automation error.
//!
//! Paths are embedded as string literals. Backslashes are literal in both
//! dialects and are copied verbatim; only the dialect's quote character is
//! escaped (doubled).
//!
//! Script files carry a byte order mark so non-ASCII paths survive: Windows
//! PowerShell reads BOM-less files in the ANSI code page, and the Script Host
//! only reads Unicode scripts as UTF-16LE.

use std::path::Path;

use crate::error::Result;
use crate::format::OfficeKind;
use crate::process::{run_checked, CommandOutput, CommandRunner, Interpreter};
use crate::temp::{TempKind, TempResource};

/// Word `SaveAs2` format code for PDF
pub const WORD_PDF_FORMAT: u32 = 17;
/// Excel `ExportAsFixedFormat` type for PDF
pub const EXCEL_PDF_TYPE: u32 = 0;
/// Excel `ExportAsFixedFormat` quality (standard)
pub const EXCEL_QUALITY_STANDARD: u32 = 0;
/// PowerPoint `SaveAs` format code for PDF
pub const POWERPOINT_PDF_FORMAT: u32 = 32;

/// Script language used to drive Office
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptDialect {
    /// VBScript for the Windows Script Host (`cscript`)
    VbScript,
    /// PowerShell
    PowerShell,
}

impl ScriptDialect {
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptDialect::VbScript => "vbs",
            ScriptDialect::PowerShell => "ps1",
        }
    }

    /// Quote `path` as a string literal in this dialect
    pub fn quote_path(&self, path: &Path) -> String {
        let raw = path.to_string_lossy();
        match self {
            ScriptDialect::VbScript => format!("\"{}\"", raw.replace('"', "\"\"")),
            ScriptDialect::PowerShell => {
                let mut quoted = String::with_capacity(raw.len() + 2);
                quoted.push('\'');
                for c in raw.chars() {
                    // PowerShell treats the typographic single quotes as quote characters too
                    if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
                        quoted.push(c);
                    }
                    quoted.push(c);
                }
                quoted.push('\'');
                quoted
            }
        }
    }
}

/// COM ProgID of the Office application for a document kind
fn prog_id(kind: OfficeKind) -> &'static str {
    match kind {
        OfficeKind::WordProcessor => "Word.Application",
        OfficeKind::Spreadsheet => "Excel.Application",
        OfficeKind::Presentation => "PowerPoint.Application",
    }
}

/// Generate the conversion script for one document
pub fn generate_script(dialect: ScriptDialect, kind: OfficeKind, source: &Path, output: &Path) -> String {
    let src = dialect.quote_path(source);
    let out = dialect.quote_path(output);
    match dialect {
        ScriptDialect::VbScript => vbscript(kind, &src, &out),
        ScriptDialect::PowerShell => powershell(kind, &src, &out),
    }
}

fn vbscript(kind: OfficeKind, src: &str, out: &str) -> String {
    let (setup, open, export, close) = match kind {
        OfficeKind::WordProcessor => (
            "app.Visible = False\napp.DisplayAlerts = 0\n",
            format!("Set doc = app.Documents.Open({src}, False, True)"),
            format!("doc.SaveAs2 {out}, {WORD_PDF_FORMAT}"),
            "doc.Close False",
        ),
        OfficeKind::Spreadsheet => (
            "app.Visible = False\napp.DisplayAlerts = False\napp.AutomationSecurity = 3\n",
            format!("Set doc = app.Workbooks.Open({src}, 0, True)"),
            format!("doc.ExportAsFixedFormat {EXCEL_PDF_TYPE}, {out}, {EXCEL_QUALITY_STANDARD}, True"),
            "doc.Close False",
        ),
        OfficeKind::Presentation => (
            "",
            format!("Set doc = app.Presentations.Open({src}, True, False, False)"),
            format!("doc.SaveAs {out}, {POWERPOINT_PDF_FORMAT}"),
            "doc.Close",
        ),
    };

    format!(
        r#"Option Explicit
Dim app, doc
On Error Resume Next
Set app = CreateObject("{prog_id}")
If Err.Number <> 0 Then Fail Nothing
{setup}{open}
If Err.Number <> 0 Then Fail app
{export}
If Err.Number <> 0 Then Fail app
{close}
app.Quit
Set app = Nothing
WScript.Quit 0

Sub Fail(target)
  WScript.StdErr.WriteLine "Automation error " & Err.Number & ": " & Err.Description
  If Not target Is Nothing Then target.Quit
  WScript.Quit 1
End Sub
"#,
        prog_id = prog_id(kind),
    )
}

fn powershell(kind: OfficeKind, src: &str, out: &str) -> String {
    let (setup, open, export, close) = match kind {
        OfficeKind::WordProcessor => (
            "  $app.Visible = $false\n  $app.DisplayAlerts = 0\n",
            format!("$doc = $app.Documents.Open({src}, $false, $true)"),
            format!("$doc.SaveAs2({out}, {WORD_PDF_FORMAT})"),
            "$doc.Close($false)",
        ),
        OfficeKind::Spreadsheet => (
            "  $app.Visible = $false\n  $app.DisplayAlerts = $false\n  $app.AutomationSecurity = 3\n",
            format!("$doc = $app.Workbooks.Open({src}, 0, $true)"),
            format!("$doc.ExportAsFixedFormat({EXCEL_PDF_TYPE}, {out}, {EXCEL_QUALITY_STANDARD}, $true)"),
            "$doc.Close($false)",
        ),
        OfficeKind::Presentation => (
            "",
            format!("$doc = $app.Presentations.Open({src}, $true, $false, $false)"),
            format!("$doc.SaveAs({out}, {POWERPOINT_PDF_FORMAT})"),
            "$doc.Close()",
        ),
    };

    format!(
        r#"$ErrorActionPreference = 'Stop'
$app = New-Object -ComObject {prog_id}
try {{
{setup}  $doc = $null
  {open}
  {export}
  {close}
}} finally {{
  $app.Quit()
  [System.Runtime.Interopservices.Marshal]::ReleaseComObject($app) | Out-Null
}}
"#,
        prog_id = prog_id(kind),
    )
}

/// Encode script text for the interpreter selected by `extension`
///
/// `.ps1` is UTF-8 with a BOM; Script Host files (`.vbs`, `.js`) are
/// UTF-16LE with a BOM.
pub fn encode_script(extension: &str, script: &str) -> Vec<u8> {
    match extension {
        "ps1" => {
            let mut bytes = Vec::with_capacity(script.len() + 3);
            bytes.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
            bytes.extend_from_slice(script.as_bytes());
            bytes
        }
        _ => {
            let mut bytes = Vec::with_capacity(script.len() * 2 + 2);
            bytes.extend_from_slice(&[0xFF, 0xFE]);
            for unit in script.encode_utf16() {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
            bytes
        }
    }
}

/// Write `script` to a scoped temp file and run it with `interpreter`
///
/// The temp file is removed before returning, whatever the outcome. A
/// non-zero exit status is returned as an error.
pub fn write_and_execute(
    runner: &dyn CommandRunner,
    interpreter: &Interpreter,
    stem: &str,
    extension: &str,
    script: &str,
) -> Result<CommandOutput> {
    let script_file = TempResource::with_contents(TempKind::Script, stem, extension, &encode_script(extension, script))?;
    let invocation = interpreter.invocation(script_file.path());
    run_checked(runner, &invocation)
}
