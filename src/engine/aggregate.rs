//! Chart-ready aggregations over the study set.
//!
//! Three groupings feed the dashboard charts: per-status totals (pie),
//! status x phase counts (bar), and per-month trial initiation series
//! by phase (line, with an "All Phases" total). A fourth summary
//! buckets studies for the enrollment-risk alert strip.

use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::classify::{months_to_end, progress_percent};
use crate::models::{Phase, Status, Study};

/// Title of the synthetic total series in the monthly aggregation.
pub const ALL_PHASES: &str = "All Phases";

/// One point in a categorical series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPoint {
    pub x: String,
    pub y: usize,
}

/// One named series of categorical points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub title: String,
    pub data: Vec<CategoryPoint>,
}

/// Count of studies per status, in display order.
pub fn status_totals(records: &[Study]) -> Vec<CategoryPoint> {
    Status::all()
        .iter()
        .map(|status| CategoryPoint {
            x: status.to_string(),
            y: records.iter().filter(|s| s.status == *status).count(),
        })
        .collect()
}

/// Count of studies per (status, phase) pair: one series per status,
/// one point per phase.
pub fn status_phase_counts(records: &[Study]) -> Vec<CategorySeries> {
    Status::all()
        .iter()
        .map(|status| CategorySeries {
            title: status.to_string(),
            data: Phase::all()
                .iter()
                .map(|phase| CategoryPoint {
                    x: phase.to_string(),
                    y: records
                        .iter()
                        .filter(|s| s.status == *status && s.phase == *phase)
                        .count(),
                })
                .collect(),
        })
        .collect()
}

/// Trial initiations per start month, one series per phase plus the
/// "All Phases" total. Month keys are `YYYY-MM` in chronological
/// order; studies without a parseable start date are excluded.
pub fn monthly_phase_series(records: &[Study]) -> Vec<CategorySeries> {
    use std::collections::BTreeMap;

    // Lexicographic order on YYYY-MM keys is chronological
    let mut counts: BTreeMap<String, [usize; 5]> = BTreeMap::new();
    for study in records {
        let Some(start) = study.start_date else {
            continue;
        };
        let key = start.format("%Y-%m").to_string();
        let slot = counts.entry(key).or_default();
        let phase_index = Phase::all()
            .iter()
            .position(|p| *p == study.phase)
            .unwrap_or(0);
        slot[phase_index] += 1;
        slot[4] += 1;
    }

    let mut titles: Vec<String> = Phase::all().iter().map(Phase::to_string).collect();
    titles.push(ALL_PHASES.to_string());

    titles
        .into_iter()
        .enumerate()
        .map(|(index, title)| CategorySeries {
            title,
            data: counts
                .iter()
                .map(|(month, slot)| CategoryPoint {
                    x: month.clone(),
                    y: slot[index],
                })
                .collect(),
        })
        .collect()
}

/// Studies bucketed for the dashboard alert strip.
///
/// Buckets are assigned in the alert component's order: Completed
/// first, then the red window (<90% enrolled, within 3 months of the
/// end), then the amber window (<75%, within 6 months), then the
/// remaining studies by status. The red-before-amber precedence
/// differs from the classifier's and is kept as the dashboard had it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBuckets {
    pub at_risk: Vec<Study>,
    pub under_target: Vec<Study>,
    pub completed: Vec<Study>,
    pub in_progress: Vec<Study>,
    pub pending_start: Vec<Study>,
}

/// Bucket every study for the alert strip.
pub fn alert_buckets(records: &[Study], today: NaiveDate) -> AlertBuckets {
    let mut buckets = AlertBuckets {
        at_risk: Vec::new(),
        under_target: Vec::new(),
        completed: Vec::new(),
        in_progress: Vec::new(),
        pending_start: Vec::new(),
    };

    for study in records {
        let percent = progress_percent(study.current_enrollment, study.enrollment_target);
        let months = months_to_end(study.planned_end_date, today);

        if study.status == Status::Completed {
            buckets.completed.push(study.clone());
        } else if percent < 90.0 && months.is_some_and(|m| m <= 3) {
            buckets.at_risk.push(study.clone());
        } else if percent < 75.0 && months.is_some_and(|m| m <= 6) {
            buckets.under_target.push(study.clone());
        } else if study.status == Status::Recruiting {
            buckets.in_progress.push(study.clone());
        } else {
            buckets.pending_start.push(study.clone());
        }
    }

    buckets
}
