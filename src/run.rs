use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Terminal result of a run, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunResult::Success => "SUCCESS",
            RunResult::Unstable => "UNSTABLE",
            RunResult::Failure => "FAILURE",
            RunResult::NotBuilt => "NOT_BUILT",
            RunResult::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// Source-control source the run was checked out from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScmSource {
    pub credentials_id: Option<String>,
}

impl ScmSource {
    pub fn credentials_id(&self) -> Option<&str> {
        self.credentials_id.as_deref()
    }
}

/// Markers attached to a run. They are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RunMarker {
    UbuildNotified {
        verb: String,
        recorded_at: DateTime<Utc>,
    },
}

/// Record of a single job run, persisted between pipeline steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunRecord {
    pub job_name: Option<String>,
    /// Present only for multi-branch runs.
    pub scm_revision: Option<String>,
    pub scm_source: Option<ScmSource>,
    result: Option<RunResult>,
    #[serde(default)]
    markers: Vec<RunMarker>,
    pub started_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(
        job_name: Option<String>,
        scm_revision: Option<String>,
        credentials_id: Option<String>,
    ) -> Self {
        Self {
            job_name,
            scm_revision,
            scm_source: Some(ScmSource { credentials_id }),
            result: None,
            markers: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn result(&self) -> Option<RunResult> {
        self.result
    }

    /// Records a result. A result can only get worse, never better.
    pub fn set_result(&mut self, result: RunResult) {
        self.result = Some(match self.result {
            Some(current) if current > result => current,
            _ => result,
        });
    }

    pub fn credentials_id(&self) -> Option<&str> {
        self.scm_source.as_ref().and_then(ScmSource::credentials_id)
    }

    pub fn markers(&self) -> &[RunMarker] {
        &self.markers
    }

    pub(crate) fn add_marker(&mut self, marker: RunMarker) {
        self.markers.push(marker);
    }

    /// Load a run record from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run record: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse run record: {}", path.display()))
    }

    /// Save the run record to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write run record: {}", path.display()))?;

        Ok(())
    }
}
