//! One-shot detection of a resident Office installation

use std::sync::{Arc, Mutex, PoisonError};

use crate::office::script::write_and_execute;
use crate::process::{CommandRunner, Interpreter};

/// JScript that tries to instantiate Word and reports the outcome on stdout
pub const PROBE_SCRIPT: &str = r#"try {
  var word = new ActiveXObject("Word.Application");
  word.Quit();
  WScript.Echo("Available");
} catch (e) {
  WScript.Echo("NotAvailable");
}
"#;

/// Cached probe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvailabilityState {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

/// Detects whether Office can be automated, probing at most once
pub struct AvailabilityProbe {
    state: Mutex<AvailabilityState>,
    automation_capable: bool,
    interpreter: Interpreter,
    runner: Arc<dyn CommandRunner>,
}

impl AvailabilityProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, interpreter: Interpreter, automation_capable: bool) -> Self {
        Self {
            state: Mutex::new(AvailabilityState::Unknown),
            automation_capable,
            interpreter,
            runner,
        }
    }

    /// Current cached state without probing
    pub fn state(&self) -> AvailabilityState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget the cached state so the next check probes again
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = AvailabilityState::Unknown;
    }

    /// Whether Office is available, probing on first call only
    ///
    /// Any probe failure resolves to unavailable.
    pub fn check_availability(&self) -> bool {
        // Held across the probe so concurrent callers wait for one result
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if *state == AvailabilityState::Unknown {
            *state = if self.automation_capable && self.probe() {
                AvailabilityState::Available
            } else {
                AvailabilityState::Unavailable
            };
            tracing::info!(state = ?*state, "office availability resolved");
        }

        *state == AvailabilityState::Available
    }

    fn probe(&self) -> bool {
        match write_and_execute(
            self.runner.as_ref(),
            &self.interpreter,
            "office_check",
            "js",
            PROBE_SCRIPT,
        ) {
            Ok(output) => output.stdout.trim() == "Available",
            Err(e) => {
                tracing::debug!(error = %e, "office probe failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for AvailabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityProbe")
            .field("state", &self.state())
            .field("automation_capable", &self.automation_capable)
            .field("interpreter", &self.interpreter)
            .finish()
    }
}
