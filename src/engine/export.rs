//! Column projection for spreadsheet export.
//!
//! Projects a filtered+sorted record set onto the visible columns in
//! display order. The result is the table a spreadsheet writer
//! consumes; cells stringify exactly as the filter engine renders
//! field values.

use serde::Serialize;

use crate::engine::filter::Field;
use crate::models::EnrichedStudy;

/// A projected table: column wire names plus one row of cells per
/// record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Project records onto the given columns, keeping record and column
/// order.
pub fn project(records: &[EnrichedStudy], columns: &[Field]) -> ExportTable {
    ExportTable {
        columns: columns.iter().map(Field::to_string).collect(),
        rows: records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|field| field.text_value(record))
                    .collect()
            })
            .collect(),
    }
}
