//! User settings persisted as JSON
//!
//! Missing or unreadable settings files fall back to defaults; the converter
//! re-reads the store before every office conversion so changes apply to the
//! next file without restarting.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Settings key for the office conversion method
pub const KEY_METHOD: &str = "officeConversionMethod";
/// Settings key for the default output folder
pub const KEY_OUTPUT_FOLDER: &str = "defaultOutputFolder";

/// Configured office automation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConversionMethod {
    /// Probe for a resident Office installation and pick accordingly
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// Resident-host scripting (VBScript through cscript)
    #[serde(rename = "native", alias = "resident")]
    Resident,
    /// PowerShell scripting
    #[serde(rename = "powershell", alias = "scripted")]
    Scripted,
}

impl ConversionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMethod::Auto => "auto",
            ConversionMethod::Resident => "native",
            ConversionMethod::Scripted => "powershell",
        }
    }
}

impl fmt::Display for ConversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ConversionMethod::Auto),
            "native" | "resident" => Ok(ConversionMethod::Resident),
            "powershell" | "scripted" => Ok(ConversionMethod::Scripted),
            other => Err(Error::Settings(format!(
                "invalid conversion method '{other}' (expected auto, native or powershell)"
            ))),
        }
    }
}

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub office_conversion_method: ConversionMethod,
    pub default_output_folder: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            office_conversion_method: ConversionMethod::Auto,
            default_output_folder: desktop_dir(),
        }
    }
}

impl Settings {
    /// Read a setting by its JSON key
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            KEY_METHOD => Ok(self.office_conversion_method.to_string()),
            KEY_OUTPUT_FOLDER => Ok(self.default_output_folder.display().to_string()),
            other => Err(unknown_key(other)),
        }
    }

    /// Set a setting by its JSON key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            KEY_METHOD => self.office_conversion_method = value.parse()?,
            KEY_OUTPUT_FOLDER => {
                if value.trim().is_empty() {
                    return Err(Error::Settings("output folder cannot be empty".to_string()));
                }
                self.default_output_folder = PathBuf::from(value);
            }
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    /// Every setting as `(key, value)` pairs
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_METHOD, self.office_conversion_method.to_string()),
            (KEY_OUTPUT_FOLDER, self.default_output_folder.display().to_string()),
        ]
    }
}

fn unknown_key(key: &str) -> Error {
    Error::Settings(format!(
        "unknown setting '{key}' (expected {KEY_METHOD} or {KEY_OUTPUT_FOLDER})"
    ))
}

fn desktop_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("Desktop"))
}

/// JSON-file backed settings store
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/printpress/settings.json`
    pub fn default_location() -> Self {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join("printpress").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, merged over defaults
    ///
    /// Each key is applied on its own: an invalid or unknown entry is logged
    /// and skipped without discarding the others.
    pub fn load(&self) -> Settings {
        let mut settings = Settings::default();
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return settings,
        };

        let entries = match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(entries)) => entries,
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "settings file is not a JSON object, using defaults");
                return settings;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "invalid settings file, using defaults");
                return settings;
            }
        };

        for (key, value) in &entries {
            let applied = match value.as_str() {
                Some(text) => settings.set(key, text),
                None => Err(Error::Settings(format!("'{key}' is not a string"))),
            };
            if let Err(e) = applied {
                tracing::warn!(path = %self.path.display(), key = %key, error = %e, "ignoring setting");
            }
        }
        settings
    }

    /// Write settings, creating the parent directory if needed
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Read a single setting
    pub fn get(&self, key: &str) -> Result<String> {
        self.load().get(key)
    }

    /// Update a single setting and persist
    pub fn update(&self, key: &str, value: &str) -> Result<()> {
        let mut settings = self.load();
        settings.set(key, value)?;
        self.save(&settings)
    }

    /// All settings as `(key, value)` pairs
    pub fn all(&self) -> Vec<(&'static str, String)> {
        self.load().entries()
    }

    /// The configured office conversion method
    pub fn conversion_method(&self) -> ConversionMethod {
        self.load().office_conversion_method
    }
}
