//! Stable ordering of enriched studies by a chosen field.
//!
//! Numeric fields compare numerically, date fields chronologically, and
//! everything else as raw strings. Missing values sort last in
//! ascending order and first in descending order, whatever the field
//! type. Ties keep their input order.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::engine::filter::Field;
use crate::models::EnrichedStudy;

/// A field value lifted into a comparable form.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            // A field always produces one variant; mixed pairs cannot occur
            _ => Ordering::Equal,
        }
    }
}

fn sort_value(record: &EnrichedStudy, field: Field) -> Option<SortValue> {
    let study = &record.study;
    match field {
        Field::Progress => Some(SortValue::Number(record.progress)),
        Field::EnrollmentTarget => Some(SortValue::Number(f64::from(study.enrollment_target))),
        Field::CurrentEnrollment => Some(SortValue::Number(f64::from(study.current_enrollment))),
        Field::StartDate => study.start_date.map(SortValue::Date),
        Field::PlannedEndDate => study.planned_end_date.map(SortValue::Date),
        _ => Some(SortValue::Text(field.text_value(record))),
    }
}

/// Sort by the given field. Stable; never mutates its input.
pub fn sort_by(records: &[EnrichedStudy], field: Field, descending: bool) -> Vec<EnrichedStudy> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ord = match (sort_value(a, field), sort_value(b, field)) {
            (None, None) => Ordering::Equal,
            // Missing values land last ascending, first descending
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(va), Some(vb)) => va.compare(&vb),
        };
        if descending { ord.reverse() } else { ord }
    });
    sorted
}
