//! Recorded build state
//!
//! One record per plan, written after signing. The next run compares its
//! fresh signatures against the record to tell cache hits from rebuilds,
//! and `strata clean` walks the records to garbage-collect old builds.

use crate::config::ConfigManager;
use crate::error::{StrataError, StrataResult};
use crate::signature::Signature;
use crate::stage::Resolution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// One signed stage as recorded on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name within the plan
    pub name: String,

    /// Instruction kind
    pub kind: String,

    /// Stage signature
    pub signature: Signature,

    /// Verdict against the previous record
    pub resolution: Resolution,
}

/// Build record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Plan name the record belongs to
    pub plan: String,

    /// Backend the signatures were computed for
    pub backend: String,

    /// Base image reference, `None` for scratch builds
    pub base_image: Option<String>,

    /// Signed stages in build order
    pub stages: Vec<StageRecord>,

    /// When the record was first written
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl BuildRecord {
    /// Create a new record
    pub fn new(
        plan: String,
        backend: String,
        base_image: Option<String>,
        stages: Vec<StageRecord>,
    ) -> Self {
        let now = Utc::now();
        Self {
            plan,
            backend,
            base_image,
            stages,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get the record file path
    pub fn file_path(&self) -> PathBuf {
        ConfigManager::builds_dir().join(format!("{}.json", self.plan))
    }

    /// The recorded signature of a stage, if it was part of this build
    pub fn signature_of(&self, stage: &str) -> Option<&Signature> {
        self.stages
            .iter()
            .find(|record| record.name == stage)
            .map(|record| &record.signature)
    }

    /// Image tag for the final stage, `None` for an empty record
    pub fn image_tag(&self) -> Option<String> {
        self.stages
            .last()
            .map(|record| format!("strata-{}:{}", self.plan, record.signature.short()))
    }

    /// Check if this record is older than the given number of days
    pub fn is_older_than_days(&self, days: u32) -> bool {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        self.updated_at < cutoff
    }

    /// Load a record from the store
    pub async fn load(plan: &str) -> StrataResult<Option<Self>> {
        let path = ConfigManager::builds_dir().join(format!("{plan}.json"));

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StrataError::io(format!("reading build record {}", path.display()), e))?;

        let record: BuildRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    /// Save the record to the store
    pub async fn save(&self) -> StrataResult<()> {
        let path = self.file_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StrataError::io("creating builds directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .map_err(|e| StrataError::io(format!("writing build record {}", path.display()), e))?;

        Ok(())
    }

    /// Delete the record file
    pub async fn delete(&self) -> StrataResult<()> {
        let path = self.file_path();
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| StrataError::io(format!("deleting build record {}", path.display()), e))?;
        }
        Ok(())
    }

    /// List all recorded builds
    pub async fn list_all() -> StrataResult<Vec<BuildRecord>> {
        let builds_dir = ConfigManager::builds_dir();

        if !builds_dir.exists() {
            return Ok(vec![]);
        }

        let mut records = vec![];
        let mut entries = fs::read_dir(&builds_dir)
            .await
            .map_err(|e| StrataError::io("reading builds directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StrataError::io("reading build record entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let content = fs::read_to_string(&path).await.ok();
                if let Some(content) = content {
                    if let Ok(record) = serde_json::from_str::<BuildRecord>(&content) {
                        records.push(record);
                    }
                }
            }
        }

        // Sort by last update, newest first
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(records)
    }
}
