//! Office document conversion through automation scripts
//!
//! The configured [`ConversionMethod`] resolves to an [`EffectiveMethod`] at
//! call time. Resident automation is tried first when selected and falls back
//! to PowerShell exactly once; a scripted failure is final.

pub mod probe;
pub mod script;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::config::ConverterConfig;
use crate::error::{Error, Result};
use crate::format::OfficeKind;
use crate::process::{CommandRunner, Interpreter};
use crate::settings::ConversionMethod;

pub use probe::{AvailabilityProbe, AvailabilityState};
pub use script::{generate_script, write_and_execute, ScriptDialect};

/// Automation method actually used for a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveMethod {
    /// VBScript through the resident Windows Script Host
    Resident,
    /// PowerShell
    Scripted,
}

impl EffectiveMethod {
    pub fn dialect(&self) -> ScriptDialect {
        match self {
            EffectiveMethod::Resident => ScriptDialect::VbScript,
            EffectiveMethod::Scripted => ScriptDialect::PowerShell,
        }
    }

    /// Human-readable description shown to users
    pub fn description(&self) -> &'static str {
        match self {
            EffectiveMethod::Resident => "Microsoft Office (VBS)",
            EffectiveMethod::Scripted => "Microsoft Office (PowerShell)",
        }
    }
}

impl fmt::Display for EffectiveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Chooses and runs the automation method for office documents
#[derive(Debug)]
pub struct OfficeAutomationStrategy {
    probe: AvailabilityProbe,
    runner: Arc<dyn CommandRunner>,
    resident_interpreter: Interpreter,
    scripted_interpreter: Interpreter,
    automation_capable: bool,
}

impl OfficeAutomationStrategy {
    pub fn new(config: &ConverterConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let probe = AvailabilityProbe::new(
            runner.clone(),
            config.resident_interpreter.clone(),
            config.automation_capable,
        );
        Self {
            probe,
            runner,
            resident_interpreter: config.resident_interpreter.clone(),
            scripted_interpreter: config.scripted_interpreter.clone(),
            automation_capable: config.automation_capable,
        }
    }

    pub fn probe(&self) -> &AvailabilityProbe {
        &self.probe
    }

    /// Resolve the configured method; `Auto` consults the availability probe
    pub fn resolve_method(&self, configured: ConversionMethod) -> EffectiveMethod {
        match configured {
            ConversionMethod::Auto => {
                if self.probe.check_availability() {
                    EffectiveMethod::Resident
                } else {
                    EffectiveMethod::Scripted
                }
            }
            ConversionMethod::Resident => EffectiveMethod::Resident,
            ConversionMethod::Scripted => EffectiveMethod::Scripted,
        }
    }

    /// Convert an office document to PDF at `output`
    pub fn convert(
        &self,
        kind: OfficeKind,
        source: &Path,
        output: &Path,
        configured: ConversionMethod,
    ) -> Result<PathBuf> {
        let method = self.resolve_method(configured);
        tracing::debug!(source = %source.display(), ?method, "converting office document");

        let resident_cause = if method == EffectiveMethod::Resident && self.automation_capable {
            match self.attempt(EffectiveMethod::Resident, kind, source, output) {
                Ok(()) => return Ok(output.to_path_buf()),
                Err(e) => {
                    tracing::warn!(error = %e, "resident automation failed, falling back to PowerShell");
                    Some(e.to_string())
                }
            }
        } else {
            None
        };

        self.attempt(EffectiveMethod::Scripted, kind, source, output)
            .map_err(|e| Error::OfficeAutomation {
                cause: e.to_string(),
                resident_cause,
            })?;

        Ok(output.to_path_buf())
    }

    /// One scripted run; succeeds only if a new or rewritten PDF appeared
    fn attempt(&self, method: EffectiveMethod, kind: OfficeKind, source: &Path, output: &Path) -> Result<()> {
        let dialect = method.dialect();
        let interpreter = match method {
            EffectiveMethod::Resident => &self.resident_interpreter,
            EffectiveMethod::Scripted => &self.scripted_interpreter,
        };
        let stem = match dialect {
            ScriptDialect::VbScript => format!("temp_{}_script", kind.script_stem()),
            ScriptDialect::PowerShell => format!("temp_{}_ps", kind.script_stem()),
        };

        let before = modified_at(output);
        let script = generate_script(dialect, kind, source, output);
        write_and_execute(self.runner.as_ref(), interpreter, &stem, dialect.extension(), &script)?;

        // A PDF left over from an earlier run does not count
        let after = modified_at(output);
        if after.is_none() || after == before {
            return Err(Error::Process {
                program: interpreter.program.display().to_string(),
                detail: format!("finished without creating {}", output.display()),
            });
        }
        Ok(())
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
