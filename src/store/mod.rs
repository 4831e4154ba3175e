//! Study store: the single owned record collection.
//!
//! Records live in one JSON snapshot (`studies.json`) under the data
//! directory, the same array-of-camelCase-objects shape the dashboard
//! backend serves. Each command loads the snapshot, applies explicit
//! update operations (replace, insert, patch-by-id, remove-by-id,
//! bulk import), and saves. Study IDs are normalized to trimmed
//! uppercase before any comparison or write.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::models::{normalize_id, Study, StudyPatch};
use crate::{Error, Result};

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE: &str = "studies.json";

/// Resolve the data directory: explicit flag/env value if given,
/// otherwise the platform data dir (`~/.local/share/cohort`).
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    match explicit {
        Some(path) => path,
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cohort"),
    }
}

/// Read a JSON array of study records from a file, normalizing IDs.
pub fn read_records(path: &Path) -> Result<Vec<Study>> {
    let contents = fs::read_to_string(path)?;
    let mut records: Vec<Study> = serde_json::from_str(&contents)
        .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))?;
    for study in &mut records {
        study.study_id = normalize_id(&study.study_id);
    }
    Ok(records)
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Records added to the store
    pub added: Vec<Study>,
    /// Incoming records whose IDs already existed. Skipped unless the
    /// import ran with override, in which case they replaced the
    /// stored records.
    pub duplicates: Vec<Study>,
    /// Whether duplicates replaced stored records
    pub overridden: bool,
}

/// The owned study collection for one data directory.
pub struct StudyStore {
    path: PathBuf,
    studies: Vec<Study>,
}

impl StudyStore {
    /// Create the data directory and an empty snapshot. Returns the
    /// store and whether anything was newly created.
    pub fn init(data_dir: &Path) -> Result<(Self, bool)> {
        let path = data_dir.join(SNAPSHOT_FILE);
        if path.exists() {
            return Ok((Self::open(data_dir)?, false));
        }
        fs::create_dir_all(data_dir)?;
        let store = Self {
            path,
            studies: Vec::new(),
        };
        store.save()?;
        Ok((store, true))
    }

    /// Open an existing store.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SNAPSHOT_FILE);
        if !path.exists() {
            return Err(Error::NotInitialized);
        }
        let studies = read_records(&path)?;
        Ok(Self { path, studies })
    }

    /// Persist the snapshot.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.studies)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// All studies, in stored order.
    pub fn studies(&self) -> &[Study] {
        &self.studies
    }

    pub fn len(&self) -> usize {
        self.studies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }

    /// Replace the whole collection.
    pub fn replace_all(&mut self, studies: Vec<Study>) {
        self.studies = studies;
    }

    /// Look up a study by ID.
    pub fn get(&self, id: &str) -> Option<&Study> {
        let id = normalize_id(id);
        self.studies.iter().find(|s| s.study_id == id)
    }

    /// Add a new study. Duplicate IDs are rejected.
    pub fn insert(&mut self, mut study: Study) -> Result<()> {
        study.study_id = normalize_id(&study.study_id);
        if study.study_id.is_empty() {
            return Err(Error::InvalidInput("study ID must not be empty".to_string()));
        }
        if self.get(&study.study_id).is_some() {
            return Err(Error::DuplicateId(study.study_id));
        }
        self.studies.push(study);
        Ok(())
    }

    /// Apply a partial update to the study with the given ID.
    pub fn patch(&mut self, id: &str, patch: &StudyPatch) -> Result<Study> {
        let id = normalize_id(id);
        let study = self
            .studies
            .iter_mut()
            .find(|s| s.study_id == id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        patch.apply_to(study);
        Ok(study.clone())
    }

    /// Remove the study with the given ID, returning it.
    pub fn remove(&mut self, id: &str) -> Result<Study> {
        let id = normalize_id(id);
        let index = self
            .studies
            .iter()
            .position(|s| s.study_id == id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        Ok(self.studies.remove(index))
    }

    /// Bulk import. Incoming records are validated as a batch first:
    /// in-file duplicate IDs and rows whose start date falls after the
    /// planned end date reject the whole import. Records colliding
    /// with stored IDs are skipped and reported, or replace the stored
    /// records when `override_duplicates` is set.
    pub fn import(
        &mut self,
        incoming: Vec<Study>,
        override_duplicates: bool,
    ) -> Result<ImportReport> {
        let mut seen = std::collections::HashSet::new();
        let mut repeated = Vec::new();
        for study in &incoming {
            if !seen.insert(study.study_id.clone()) && !repeated.contains(&study.study_id) {
                repeated.push(study.study_id.clone());
            }
        }
        if !repeated.is_empty() {
            return Err(Error::InvalidInput(format!(
                "the import file contains duplicate study IDs: {}",
                repeated.join(", ")
            )));
        }

        let misordered: Vec<&str> = incoming
            .iter()
            .filter(|s| match (s.start_date, s.planned_end_date) {
                (Some(start), Some(end)) => start > end,
                _ => false,
            })
            .map(|s| s.study_id.as_str())
            .collect();
        if !misordered.is_empty() {
            return Err(Error::InvalidInput(format!(
                "start date is later than the planned end date for: {}",
                misordered.join(", ")
            )));
        }

        let mut report = ImportReport {
            added: Vec::new(),
            duplicates: Vec::new(),
            overridden: override_duplicates,
        };

        for study in incoming {
            match self
                .studies
                .iter_mut()
                .find(|s| s.study_id == study.study_id)
            {
                Some(existing) => {
                    if override_duplicates {
                        *existing = study.clone();
                    }
                    report.duplicates.push(study);
                }
                None => {
                    self.studies.push(study.clone());
                    report.added.push(study);
                }
            }
        }

        Ok(report)
    }
}
