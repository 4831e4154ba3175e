//! Command implementations for the Cohort CLI.
//!
//! This module contains the business logic for each CLI command. Every
//! command loads the study store, runs the relevant engine pipeline,
//! and returns a result type implementing `Output` so the dispatcher
//! can render JSON (default) or human-readable text (`-H`).

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::action_log::{self, ActionLog};
use crate::engine::aggregate::{
    alert_buckets, monthly_phase_series, status_phase_counts, status_totals, AlertBuckets,
    CategoryPoint, CategorySeries,
};
use crate::engine::{self, classify, enrich_all, project, ExportTable, Field, Query};
use crate::models::{EnrichedStudy, Phase, Status, Study, StudyPatch};
use crate::store::{read_records, StudyStore};
use crate::Result;

/// Command results that can be serialized to JSON or formatted for
/// humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

// === system init ===

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub initialized: bool,
    pub path: String,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.initialized {
            format!("Initialized cohort data at {}", self.path)
        } else {
            format!("Cohort data already present at {}", self.path)
        }
    }
}

/// Create the data directory and an empty study snapshot.
pub fn system_init(data_dir: &Path) -> Result<InitResult> {
    let (_, created) = StudyStore::init(data_dir)?;
    Ok(InitResult {
        initialized: created,
        path: data_dir.display().to_string(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResult {
    pub version: &'static str,
    pub build_timestamp: &'static str,
    pub git_commit: &'static str,
}

impl Output for VersionResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "ct {} (built {} from {})",
            self.version, self.build_timestamp, self.git_commit
        )
    }
}

/// Version and build information stamped by the build script.
pub fn system_version() -> VersionResult {
    VersionResult {
        version: env!("CARGO_PKG_VERSION"),
        build_timestamp: env!("CT_BUILD_TIMESTAMP"),
        git_commit: env!("CT_GIT_COMMIT"),
    }
}

// === study views ===

/// One study with its derived attributes, as commands return it.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct StudyView(pub EnrichedStudy);

impl Output for StudyView {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let record = &self.0;
        let study = &record.study;
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        format!(
            "{}  {}\n  Phase:      {}\n  Status:     {}\n  Enrollment: {}/{} ({}%)\n  Start:      {}\n  End:        {}\n  Insight:    {}",
            study.study_id,
            study.title,
            study.phase,
            study.status,
            study.current_enrollment,
            study.enrollment_target,
            engine::filter::format_number(record.progress),
            date(study.start_date),
            date(study.planned_end_date),
            record.insight_tag,
        )
    }
}

fn study_line(record: &EnrichedStudy) -> String {
    let study = &record.study;
    format!(
        "{}  [{}]  {}  ({}, {}, {}/{})",
        study.study_id,
        record.insight_tag,
        study.title,
        study.phase,
        study.status,
        study.current_enrollment,
        study.enrollment_target,
    )
}

/// Add a new study.
#[allow(clippy::too_many_arguments)]
pub fn study_add(
    data_dir: &Path,
    id: &str,
    title: &str,
    phase: Phase,
    status: Status,
    target: u32,
    current: u32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<StudyView> {
    let mut store = StudyStore::open(data_dir)?;
    let mut study = Study::new(id, title, phase, status);
    study.enrollment_target = target;
    study.current_enrollment = current;
    study.start_date = start;
    study.planned_end_date = end;

    store.insert(study.clone())?;
    store.save()?;
    Ok(StudyView(classify(&study, today)))
}

/// Show one study.
pub fn study_show(data_dir: &Path, id: &str, today: NaiveDate) -> Result<StudyView> {
    let store = StudyStore::open(data_dir)?;
    let study = store
        .get(id)
        .ok_or_else(|| crate::Error::NotFound(crate::models::normalize_id(id)))?;
    Ok(StudyView(classify(study, today)))
}

/// Update fields of a study.
pub fn study_update(
    data_dir: &Path,
    id: &str,
    patch: &StudyPatch,
    today: NaiveDate,
) -> Result<StudyView> {
    let mut store = StudyStore::open(data_dir)?;
    let updated = store.patch(id, patch)?;
    store.save()?;
    Ok(StudyView(classify(&updated, today)))
}

#[derive(Debug, Serialize)]
pub struct RemoveResult {
    pub removed: String,
}

impl Output for RemoveResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Removed study {}", self.removed)
    }
}

/// Remove a study.
pub fn study_rm(data_dir: &Path, id: &str) -> Result<RemoveResult> {
    let mut store = StudyStore::open(data_dir)?;
    let removed = store.remove(id)?;
    store.save()?;
    Ok(RemoveResult {
        removed: removed.study_id,
    })
}

// === study list ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    pub items: Vec<EnrichedStudy>,
    /// Records matching the query, before pagination
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
}

impl Output for ListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.total == 0 {
            return "No studies found".to_string();
        }
        let mut lines: Vec<String> = self.items.iter().map(study_line).collect();
        lines.push(format!(
            "Page {}/{} ({} matching studies)",
            self.page, self.page_count, self.total
        ));
        lines.join("\n")
    }
}

/// The full read pipeline: classify every study, filter, sort,
/// paginate.
pub fn study_list(
    data_dir: &Path,
    query: &Query,
    sort_by: Field,
    descending: bool,
    page: usize,
    page_size: usize,
    today: NaiveDate,
) -> Result<ListResult> {
    let store = StudyStore::open(data_dir)?;
    let enriched = enrich_all(store.studies(), today);
    let filtered = engine::filter::apply(&enriched, query);
    let sorted = engine::sort_by(&filtered, sort_by, descending);
    let items = engine::paginate(&sorted, page, page_size);
    Ok(ListResult {
        total: sorted.len(),
        page,
        page_count: engine::page_count(sorted.len(), page_size),
        page_size,
        items,
    })
}

// === import ===

#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub added: Vec<Study>,
    pub duplicates: Vec<Study>,
    pub overridden: bool,
}

impl Output for ImportResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Imported {} studies", self.added.len())];
        for study in &self.added {
            lines.push(format!("  added {}", study.study_id));
        }
        if !self.duplicates.is_empty() {
            if self.overridden {
                lines.push(format!("Overrode {} existing studies", self.duplicates.len()));
            } else {
                lines.push(format!(
                    "Skipped {} duplicates (rerun with --override to replace them)",
                    self.duplicates.len()
                ));
            }
            for study in &self.duplicates {
                lines.push(format!("  duplicate {}", study.study_id));
            }
        }
        lines.join("\n")
    }
}

/// Bulk import from a JSON array of study records.
pub fn import_file(data_dir: &Path, file: &Path, override_duplicates: bool) -> Result<ImportResult> {
    let mut store = StudyStore::open(data_dir)?;
    let incoming = read_records(file)?;
    let report = store.import(incoming, override_duplicates)?;
    store.save()?;
    Ok(ImportResult {
        added: report.added,
        duplicates: report.duplicates,
        overridden: report.overridden,
    })
}

// === export ===

/// Date-range bounds for the export command, applied before the token
/// query (each bound must hold, unlike same-field tokens which
/// OR-combine).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRanges {
    pub start_from: Option<NaiveDate>,
    pub start_to: Option<NaiveDate>,
    pub end_from: Option<NaiveDate>,
    pub end_to: Option<NaiveDate>,
}

impl DateRanges {
    fn keep(&self, study: &Study) -> bool {
        let within = |date: Option<NaiveDate>, from: Option<NaiveDate>, to: Option<NaiveDate>| {
            match (date, from, to) {
                (_, None, None) => true,
                (None, _, _) => false,
                (Some(d), from, to) => {
                    from.is_none_or(|f| d >= f) && to.is_none_or(|t| d <= t)
                }
            }
        };
        within(study.start_date, self.start_from, self.start_to)
            && within(study.planned_end_date, self.end_from, self.end_to)
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ExportResult(pub ExportTable);

impl Output for ExportResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let table = &self.0;
        // Column-aligned text table
        let mut widths: Vec<usize> = table.columns.iter().map(String::len).collect();
        for row in &table.rows {
            for (index, cell) in row.iter().enumerate() {
                widths[index] = widths[index].max(cell.len());
            }
        }
        let render = |cells: &[String]| {
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| format!("{:<width$}", cell, width = widths[index]))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        let mut lines = vec![render(&table.columns)];
        lines.extend(table.rows.iter().map(|row| render(row)));
        lines.join("\n")
    }
}

/// Project the filtered, sorted study set onto the visible columns.
pub fn export(
    data_dir: &Path,
    columns: &[Field],
    query: &Query,
    ranges: DateRanges,
    sort_by: Field,
    descending: bool,
    today: NaiveDate,
) -> Result<ExportResult> {
    let store = StudyStore::open(data_dir)?;
    let kept: Vec<Study> = store
        .studies()
        .iter()
        .filter(|s| ranges.keep(s))
        .cloned()
        .collect();
    let enriched = enrich_all(&kept, today);
    let filtered = engine::filter::apply(&enriched, query);
    let sorted = engine::sort_by(&filtered, sort_by, descending);

    let columns = if columns.is_empty() {
        Field::all().to_vec()
    } else {
        columns.to_vec()
    };
    Ok(ExportResult(project(&sorted, &columns)))
}

// === metrics ===

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct StatusTotalsResult(pub Vec<CategoryPoint>);

impl Output for StatusTotalsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.0
            .iter()
            .map(|point| format!("{:<20} {}", point.x, point.y))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct SeriesResult(pub Vec<CategorySeries>);

impl Output for SeriesResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.0
            .iter()
            .map(|series| {
                let points = series
                    .data
                    .iter()
                    .map(|point| format!("{}={}", point.x, point.y))
                    .collect::<Vec<_>>()
                    .join("  ");
                format!("{:<20} {}", series.title, points)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct AlertsResult(pub AlertBuckets);

impl Output for AlertsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let buckets = &self.0;
        let line = |label: &str, studies: &[Study], info: &str| {
            let ids = studies
                .iter()
                .map(|s| s.study_id.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            if ids.is_empty() {
                format!("{:<14} {:>3}   {}", label, studies.len(), info)
            } else {
                format!("{:<14} {:>3}   {}  [{}]", label, studies.len(), info, ids)
            }
        };
        [
            line(
                "At Risk",
                &buckets.at_risk,
                "Enrollment below 90% and within 3 months of planned end date.",
            ),
            line(
                "Under Target",
                &buckets.under_target,
                "Enrollment below 75% and within 6 months of planned end date.",
            ),
            line("In Progress", &buckets.in_progress, "Actively recruiting studies."),
            line(
                "Pending Start",
                &buckets.pending_start,
                "Upcoming trials pending participant enrollment.",
            ),
            line("Completed", &buckets.completed, "Studies marked as completed."),
        ]
        .join("\n")
    }
}

/// Study count per status.
pub fn metrics_status(data_dir: &Path) -> Result<StatusTotalsResult> {
    let store = StudyStore::open(data_dir)?;
    Ok(StatusTotalsResult(status_totals(store.studies())))
}

/// Study count per (status, phase) pair.
pub fn metrics_status_phase(data_dir: &Path) -> Result<SeriesResult> {
    let store = StudyStore::open(data_dir)?;
    Ok(SeriesResult(status_phase_counts(store.studies())))
}

/// Trial initiations per start month and phase.
pub fn metrics_monthly(data_dir: &Path) -> Result<SeriesResult> {
    let store = StudyStore::open(data_dir)?;
    Ok(SeriesResult(monthly_phase_series(store.studies())))
}

/// Enrollment risk alert buckets.
pub fn metrics_alerts(data_dir: &Path, today: NaiveDate) -> Result<AlertsResult> {
    let store = StudyStore::open(data_dir)?;
    Ok(AlertsResult(alert_buckets(store.studies(), today)))
}

// === action log ===

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct LogResult(pub Vec<ActionLog>);

impl Output for LogResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.0.is_empty() {
            return "No logged actions".to_string();
        }
        self.0
            .iter()
            .map(|entry| {
                let outcome = if entry.success { "ok" } else { "failed" };
                format!(
                    "{}  {:<12} {}  ({}ms)",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.command,
                    outcome,
                    entry.duration_ms,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Recent action-log entries, oldest first.
pub fn log_show(data_dir: &Path, limit: usize) -> Result<LogResult> {
    Ok(LogResult(action_log::read_recent(data_dir, limit)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn init_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        system_init(dir.path()).unwrap();
        dir
    }

    fn add_sample(dir: &TempDir, id: &str, phase: Phase, status: Status, current: u32) {
        study_add(
            dir.path(),
            id,
            &format!("Study {}", id),
            phase,
            status,
            100,
            current,
            Some(day(2024, 1, 10)),
            Some(day(2026, 6, 1)),
            day(2025, 1, 15),
        )
        .unwrap();
    }

    #[test]
    fn test_init_then_reinit() {
        let dir = TempDir::new().unwrap();
        let first = system_init(dir.path()).unwrap();
        assert!(first.initialized);
        let second = system_init(dir.path()).unwrap();
        assert!(!second.initialized);
    }

    #[test]
    fn test_add_list_pipeline() {
        let dir = init_dir();
        add_sample(&dir, "CT-001", Phase::Phase1, Status::Recruiting, 45);
        add_sample(&dir, "CT-002", Phase::Phase2, Status::Completed, 100);

        let query: Query = Query {
            tokens: vec!["status!=Completed".parse().unwrap()],
            free_text: String::new(),
        };
        let result = study_list(
            dir.path(),
            &query,
            Field::StudyId,
            false,
            1,
            10,
            day(2025, 1, 15),
        )
        .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.page_count, 1);
        assert_eq!(result.items[0].study.study_id, "CT-001");
    }

    #[test]
    fn test_list_pagination_counts() {
        let dir = init_dir();
        for i in 0..12 {
            add_sample(
                &dir,
                &format!("CT-{:03}", i),
                Phase::Phase1,
                Status::Recruiting,
                50,
            );
        }
        let result = study_list(
            dir.path(),
            &Query::default(),
            Field::StudyId,
            false,
            2,
            5,
            day(2025, 1, 15),
        )
        .unwrap();
        assert_eq!(result.total, 12);
        assert_eq!(result.page_count, 3);
        assert_eq!(result.items.len(), 5);
        assert_eq!(result.items[0].study.study_id, "CT-005");
    }

    #[test]
    fn test_update_reclassifies() {
        let dir = init_dir();
        add_sample(&dir, "CT-001", Phase::Phase1, Status::Recruiting, 45);
        let patch = StudyPatch {
            current_enrollment: Some(120),
            ..Default::default()
        };
        let view = study_update(dir.path(), "ct-001", &patch, day(2025, 1, 15)).unwrap();
        assert_eq!(view.0.progress, 120.0);
        assert_eq!(view.0.insight_tag, crate::models::InsightTag::Exceeded);
    }

    #[test]
    fn test_export_ranges_and_columns() {
        let dir = init_dir();
        add_sample(&dir, "CT-001", Phase::Phase1, Status::Recruiting, 45);
        // Second study outside the start window
        study_add(
            dir.path(),
            "CT-002",
            "Late starter",
            Phase::Phase2,
            Status::Recruiting,
            100,
            10,
            Some(day(2025, 3, 1)),
            Some(day(2026, 6, 1)),
            day(2025, 1, 15),
        )
        .unwrap();

        let ranges = DateRanges {
            start_to: Some(day(2024, 12, 31)),
            ..Default::default()
        };
        let result = export(
            dir.path(),
            &[Field::StudyId, Field::Title],
            &Query::default(),
            ranges,
            Field::StudyId,
            false,
            day(2025, 1, 15),
        )
        .unwrap();
        assert_eq!(result.0.columns, vec!["studyId", "title"]);
        assert_eq!(result.0.rows.len(), 1);
        assert_eq!(result.0.rows[0][0], "CT-001");
    }

    #[test]
    fn test_export_human_aligns_columns() {
        let dir = init_dir();
        add_sample(&dir, "CT-001", Phase::Phase1, Status::Recruiting, 45);
        let result = export(
            dir.path(),
            &[Field::StudyId, Field::Phase],
            &Query::default(),
            DateRanges::default(),
            Field::StudyId,
            false,
            day(2025, 1, 15),
        )
        .unwrap();
        let human = result.to_human();
        assert!(human.starts_with("studyId  phase"));
        assert!(human.contains("CT-001   Phase 1"));
    }

    #[test]
    fn test_metrics_roundup() {
        let dir = init_dir();
        add_sample(&dir, "CT-001", Phase::Phase1, Status::Recruiting, 45);
        add_sample(&dir, "CT-002", Phase::Phase2, Status::Completed, 100);

        let totals = metrics_status(dir.path()).unwrap();
        assert_eq!(totals.0[0].y + totals.0[1].y + totals.0[2].y, 2);

        let grid = metrics_status_phase(dir.path()).unwrap();
        assert_eq!(grid.0.len(), 3);

        let monthly = metrics_monthly(dir.path()).unwrap();
        // Both studies start 2024-01
        let all = monthly.0.iter().find(|s| s.title == "All Phases").unwrap();
        assert_eq!(all.data.len(), 1);
        assert_eq!(all.data[0].y, 2);
    }

    #[test]
    fn test_uninitialized_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            study_show(dir.path(), "CT-001", day(2025, 1, 15)),
            Err(crate::Error::NotInitialized)
        ));
    }
}
