//! Runtime configuration for external tools

use std::path::{Path, PathBuf};

use crate::process::Interpreter;

/// Environment variable overriding the bundled resources directory
pub const RESOURCES_ENV: &str = "PRINTPRESS_RESOURCES";

/// Locations of external tools and platform capabilities
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Directory holding bundled tools (ImageMagick)
    pub resources_dir: PathBuf,
    /// Raster engine executable
    pub raster_engine: PathBuf,
    /// Interpreter for resident-host (VBScript/JScript) scripts
    pub resident_interpreter: Interpreter,
    /// Interpreter for PowerShell scripts
    pub scripted_interpreter: Interpreter,
    /// Whether Office COM automation can exist on this platform
    pub automation_capable: bool,
}

impl ConverterConfig {
    /// Configuration rooted at a resources directory, with platform defaults
    pub fn with_resources(resources_dir: impl Into<PathBuf>) -> Self {
        let resources_dir = resources_dir.into();
        Self {
            raster_engine: bundled_magick(&resources_dir),
            resources_dir,
            resident_interpreter: Interpreter::new("cscript", &["//NoLogo"]),
            scripted_interpreter: Interpreter::new(
                "powershell",
                &["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"],
            ),
            automation_capable: cfg!(windows),
        }
    }

    /// Resolve the resources directory from the environment or the executable location
    pub fn detect() -> Self {
        let resources_dir = std::env::var_os(RESOURCES_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_resources_dir);
        Self::with_resources(resources_dir)
    }

    /// Override the raster engine path
    pub fn raster_engine(mut self, path: impl Into<PathBuf>) -> Self {
        self.raster_engine = path.into();
        self
    }

    /// Override the platform capability flag
    pub fn automation_capable(mut self, capable: bool) -> Self {
        self.automation_capable = capable;
        self
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self::detect()
    }
}

fn default_resources_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("resources")))
        .unwrap_or_else(|| PathBuf::from("resources"))
}

/// `<resources>/ImageMagick/magick(.exe)`
pub fn bundled_magick(resources_dir: &Path) -> PathBuf {
    let exe = if cfg!(windows) { "magick.exe" } else { "magick" };
    resources_dir.join("ImageMagick").join(exe)
}
