//! Runtime settings
//!
//! Defaults mirror the submission contract; a YAML file can override any of
//! them, including a newer version of the worksheet alias table:
//!
//! ```yaml
//! batch_tolerance: 0.001
//! simplified_tolerance: 0.01
//! header_scan_rows: 10
//! max_reported_errors: 20
//! aliases:
//!   version: "2025.1"
//!   entries:
//!     - product: overdraft
//!       aliases: ["decouverts", "overdrafts"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::classifier::AliasTable;
use crate::core::conformity::{
    ConformityChecker, VerificationMode, BATCH_TOLERANCE, SIMPLIFIED_TOLERANCE,
};
use crate::error::{TegError, TegResult};

/// Rows scanned from the top of a sheet when looking for the header
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 10;

/// Row-level errors kept in an import summary
pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub batch_tolerance: f64,
    pub simplified_tolerance: f64,
    pub header_scan_rows: usize,
    pub max_reported_errors: usize,
    pub aliases: AliasTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            batch_tolerance: BATCH_TOLERANCE,
            simplified_tolerance: SIMPLIFIED_TOLERANCE,
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
            aliases: AliasTable::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file; missing keys keep their defaults
    pub fn load(path: &Path) -> TegResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> TegResult<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> TegResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> TegResult<()> {
        for (name, value) in [
            ("batch_tolerance", self.batch_tolerance),
            ("simplified_tolerance", self.simplified_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TegError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.header_scan_rows == 0 {
            return Err(TegError::Config(
                "header_scan_rows must be at least 1".to_string(),
            ));
        }
        if self.aliases.entries.is_empty() {
            return Err(TegError::Config("alias table has no entries".to_string()));
        }
        Ok(())
    }

    pub fn checker(&self, mode: VerificationMode) -> ConformityChecker {
        match mode {
            VerificationMode::Batch => ConformityChecker::new(self.batch_tolerance, mode),
            VerificationMode::Simplified => {
                ConformityChecker::new(self.simplified_tolerance, mode)
            }
        }
    }
}
