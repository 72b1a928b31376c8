//! INI scan configuration adapter.
//!
//! Recognised sections are `[scan]`, `[throttle]`, `[risk]`, `[thresholds]`
//! and `[weights]`. Keys are case-insensitive; values are read lazily by the
//! typed getters.

use crate::domain::error::GapscoutError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use tracing::warn;

pub const KNOWN_SECTIONS: &[&str] = &["scan", "throttle", "risk", "thresholds", "weights"];

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GapscoutError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| GapscoutError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        let adapter = Self { config };
        adapter.warn_unknown_sections();
        Ok(adapter)
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Sections present in the file that no scan setting reads.
    pub fn unknown_sections(&self) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .config
            .sections()
            .into_iter()
            .filter(|s| !KNOWN_SECTIONS.contains(&s.as_str()))
            .collect();
        unknown.sort();
        unknown
    }

    fn warn_unknown_sections(&self) {
        for section in self.unknown_sections() {
            warn!(section = %section, "Ignoring unknown config section");
        }
    }

    fn bool_value(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.parse_int(section, key).ok().flatten().unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.parse_double(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.parse_bool(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn parse_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        match self.get_string(section, key) {
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| format!("'{raw}' is not an integer")),
            None => Ok(None),
        }
    }

    fn parse_double(&self, section: &str, key: &str) -> Result<Option<f64>, String> {
        match self.get_string(section, key) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Some(value)),
                _ => Err(format!("'{raw}' is not a finite number")),
            },
            None => Ok(None),
        }
    }

    fn parse_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        match self.get_string(section, key) {
            Some(raw) => Self::bool_value(&raw)
                .map(Some)
                .ok_or_else(|| format!("'{raw}' is not a boolean")),
            None => Ok(None),
        }
    }
}
