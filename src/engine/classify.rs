//! Enrollment insight classification.
//!
//! Derives each study's progress percentage and insight tag from its
//! enrollment counts, status, and time remaining until the planned end
//! date. `today` is an explicit parameter so reads are reproducible
//! (the CLI passes the current date, or `--as-of`).

use chrono::{Datelike, NaiveDate};

use crate::models::{EnrichedStudy, InsightTag, Status, Study};

/// Enrollment percentage; 0 when the target is 0.
pub fn progress_percent(current: u32, target: u32) -> f64 {
    if target > 0 {
        f64::from(current) / f64::from(target) * 100.0
    } else {
        0.0
    }
}

/// Whole months from `today` until `end`, ignoring day-of-month.
/// Negative once the end month is in the past; `None` when the study
/// has no usable end date.
pub fn months_to_end(end: Option<NaiveDate>, today: NaiveDate) -> Option<i32> {
    let end = end?;
    Some((end.year() - today.year()) * 12 + (end.month() as i32 - today.month() as i32))
}

/// Classify one study. First matching rule wins:
/// Completed status, then enrollment above 100%, then under 75% within
/// six months of the end, then under 90% within three months. A study
/// between 90 and 100% near its deadline still lands On Track.
pub fn classify(study: &Study, today: NaiveDate) -> EnrichedStudy {
    let percent = progress_percent(study.current_enrollment, study.enrollment_target);
    let months = months_to_end(study.planned_end_date, today);

    let insight_tag = if study.status == Status::Completed {
        InsightTag::Completed
    } else if percent > 100.0 {
        InsightTag::Exceeded
    } else if percent < 75.0 && months.is_some_and(|m| m <= 6) {
        InsightTag::UnderTarget
    } else if percent < 90.0 && months.is_some_and(|m| m <= 3) {
        InsightTag::AtRisk
    } else {
        InsightTag::OnTrack
    };

    EnrichedStudy {
        study: study.clone(),
        progress: percent,
        insight_tag,
    }
}

/// Classify every study, preserving input order.
pub fn enrich_all(studies: &[Study], today: NaiveDate) -> Vec<EnrichedStudy> {
    studies.iter().map(|s| classify(s, today)).collect()
}
