//! Data models for Cohort entities.
//!
//! This module defines the core data structures:
//! - `Study` - One clinical trial's tracked metadata
//! - `Phase` / `Status` - Fixed categorical enumerations
//! - `InsightTag` - Derived enrollment risk classification
//! - `EnrichedStudy` - A study plus its derived attributes
//! - `StudyPatch` - Partial field set for updates
//!
//! Records cross the wire in camelCase JSON, matching the backend that
//! the dashboard and spreadsheet tooling speak. Numeric and date fields
//! are coerced leniently at deserialization (numeric strings parse,
//! garbage counts become 0, unparseable dates become `None`); the
//! categorical vocabularies are strict and reject unknown values.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Clinical trial phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "Phase 1")]
    Phase1,
    #[serde(rename = "Phase 2")]
    Phase2,
    #[serde(rename = "Phase 3")]
    Phase3,
    #[serde(rename = "Phase 4")]
    Phase4,
}

impl Phase {
    /// All phases in display order.
    pub fn all() -> &'static [Phase] {
        &[Phase::Phase1, Phase::Phase2, Phase::Phase3, Phase::Phase4]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Phase1 => "Phase 1",
            Phase::Phase2 => "Phase 2",
            Phase::Phase3 => "Phase 3",
            Phase::Phase4 => "Phase 4",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Phase 1" => Ok(Phase::Phase1),
            "Phase 2" => Ok(Phase::Phase2),
            "Phase 3" => Ok(Phase::Phase3),
            "Phase 4" => Ok(Phase::Phase4),
            _ => Err(format!("Unknown phase: {}", s)),
        }
    }
}

/// Recruitment status of a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Recruiting,
    #[serde(rename = "Not yet recruiting")]
    NotYetRecruiting,
    Completed,
}

impl Status {
    /// All statuses in display order.
    pub fn all() -> &'static [Status] {
        &[Status::Completed, Status::Recruiting, Status::NotYetRecruiting]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Recruiting => "Recruiting",
            Status::NotYetRecruiting => "Not yet recruiting",
            Status::Completed => "Completed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Recruiting" => Ok(Status::Recruiting),
            "Not yet recruiting" => Ok(Status::NotYetRecruiting),
            "Completed" => Ok(Status::Completed),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Derived enrollment insight for a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightTag {
    Completed,
    Exceeded,
    #[serde(rename = "Under Target")]
    UnderTarget,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "On Track")]
    OnTrack,
}

impl fmt::Display for InsightTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InsightTag::Completed => "Completed",
            InsightTag::Exceeded => "Exceeded",
            InsightTag::UnderTarget => "Under Target",
            InsightTag::AtRisk => "At Risk",
            InsightTag::OnTrack => "On Track",
        };
        write!(f, "{}", s)
    }
}

/// One clinical trial's tracked metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    /// Unique identifier, normalized to trimmed uppercase at ingestion
    pub study_id: String,

    /// Study title
    pub title: String,

    /// Trial phase
    pub phase: Phase,

    /// Recruitment status
    pub status: Status,

    /// Target number of participants
    #[serde(default, deserialize_with = "de_count")]
    pub enrollment_target: u32,

    /// Participants enrolled so far
    #[serde(default, deserialize_with = "de_count")]
    pub current_enrollment: u32,

    /// First day of the trial
    #[serde(default, deserialize_with = "de_date")]
    pub start_date: Option<NaiveDate>,

    /// Scheduled last day of the trial
    #[serde(default, deserialize_with = "de_date")]
    pub planned_end_date: Option<NaiveDate>,
}

impl Study {
    /// Create a new study with the given ID and title.
    pub fn new(study_id: &str, title: &str, phase: Phase, status: Status) -> Self {
        Self {
            study_id: normalize_id(study_id),
            title: title.to_string(),
            phase,
            status,
            enrollment_target: 0,
            current_enrollment: 0,
            start_date: None,
            planned_end_date: None,
        }
    }
}

/// Normalize a study ID the way the ingestion pipeline does:
/// strip surrounding whitespace and uppercase.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// A study plus its derived attributes.
///
/// Produced by the classifier on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedStudy {
    #[serde(flatten)]
    pub study: Study,

    /// Enrollment percentage (0 when the target is 0)
    pub progress: f64,

    /// Derived risk classification
    pub insight_tag: InsightTag,
}

/// Partial field set for updating a study in place.
#[derive(Debug, Clone, Default)]
pub struct StudyPatch {
    pub title: Option<String>,
    pub phase: Option<Phase>,
    pub status: Option<Status>,
    pub enrollment_target: Option<u32>,
    pub current_enrollment: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
}

impl StudyPatch {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.phase.is_none()
            && self.status.is_none()
            && self.enrollment_target.is_none()
            && self.current_enrollment.is_none()
            && self.start_date.is_none()
            && self.planned_end_date.is_none()
    }

    /// Apply every set field to the study.
    pub fn apply_to(&self, study: &mut Study) {
        if let Some(title) = &self.title {
            study.title = title.clone();
        }
        if let Some(phase) = self.phase {
            study.phase = phase;
        }
        if let Some(status) = self.status {
            study.status = status;
        }
        if let Some(target) = self.enrollment_target {
            study.enrollment_target = target;
        }
        if let Some(current) = self.current_enrollment {
            study.current_enrollment = current;
        }
        if let Some(start) = self.start_date {
            study.start_date = Some(start);
        }
        if let Some(end) = self.planned_end_date {
            study.planned_end_date = Some(end);
        }
    }
}

/// Parse the date part of an ISO-8601 string. Accepts a full datetime
/// by reading only the leading `YYYY-MM-DD`.
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Lenient enrollment-count deserializer: JSON numbers and numeric
/// strings parse, everything else (null, negatives, garbage) becomes 0.
fn de_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Int(n)) => u32::try_from(n).unwrap_or(0),
        Some(Raw::Float(f)) if f.is_finite() && f >= 0.0 => f as u32,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Lenient date deserializer: ISO-8601 strings parse, anything
/// unparseable or null becomes `None`.
fn de_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_wire_date))
}
