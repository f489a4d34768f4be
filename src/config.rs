use crate::persistence::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOURS_PER_DAY: f64 = 24.0;
pub const DEFAULT_USER_NAME: &str = "admin";

/// Settings for one import run. Loaded from JSON, then overridden from the
/// command line, then handed to the loader by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub db_path: Option<PathBuf>,
    /// `PROJECT.proj_short_name` of the target project.
    pub project_code: String,
    pub user_name: String,
    pub hours_per_day: f64,
    pub wbs_file: Option<PathBuf>,
    pub activities_file: Option<PathBuf>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            project_code: String::new(),
            user_name: DEFAULT_USER_NAME.to_string(),
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            wbs_file: None,
            activities_file: None,
        }
    }
}

impl ImportConfig {
    pub fn for_project(project_code: impl Into<String>) -> Self {
        Self {
            project_code: project_code.into(),
            ..Self::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let file = File::open(path)?;
        let config: ImportConfig = serde_json::from_reader(file)?;
        Ok(config)
    }

    pub fn validate(&self) -> ImportResult<()> {
        if self.project_code.trim().is_empty() {
            return Err(ImportError::InvalidConfig(
                "project_code must not be empty".into(),
            ));
        }
        if !self.hours_per_day.is_finite() || self.hours_per_day <= 0.0 {
            return Err(ImportError::InvalidConfig(format!(
                "hours_per_day must be a positive number (got {})",
                self.hours_per_day
            )));
        }
        if self.user_name.trim().is_empty() {
            return Err(ImportError::InvalidConfig(
                "user_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}
