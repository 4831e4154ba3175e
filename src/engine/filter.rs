//! Token-based filtering over enriched studies.
//!
//! A query is an ordered list of `{field, operator, value}` tokens plus
//! an optional free-text string. Tokens naming the same field are
//! OR-combined; distinct field groups are AND-combined; the free text
//! must appear (case-insensitively) in at least one stringified field.
//!
//! Date fields compare as calendar dates. Every other field compares as
//! a case-insensitive string, so the ordering operators are
//! lexicographic even on numeric fields like progress.

use chrono::NaiveDate;
use std::fmt;

use crate::models::{parse_wire_date, EnrichedStudy};

/// A filterable/sortable/exportable study field, named by its wire key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    StudyId,
    Title,
    Phase,
    Status,
    EnrollmentTarget,
    CurrentEnrollment,
    StartDate,
    PlannedEndDate,
    Progress,
    InsightTag,
}

impl Field {
    /// Every field, in display/export order.
    pub fn all() -> &'static [Field] {
        &[
            Field::InsightTag,
            Field::StudyId,
            Field::Title,
            Field::Phase,
            Field::Status,
            Field::EnrollmentTarget,
            Field::CurrentEnrollment,
            Field::StartDate,
            Field::PlannedEndDate,
            Field::Progress,
        ]
    }

    /// True for calendar-date fields.
    pub fn is_date(&self) -> bool {
        matches!(self, Field::StartDate | Field::PlannedEndDate)
    }

    /// The record's value for this field, rendered the way the wire
    /// renders it. Missing dates render as the empty string.
    pub fn text_value(&self, record: &EnrichedStudy) -> String {
        let study = &record.study;
        match self {
            Field::StudyId => study.study_id.clone(),
            Field::Title => study.title.clone(),
            Field::Phase => study.phase.to_string(),
            Field::Status => study.status.to_string(),
            Field::EnrollmentTarget => study.enrollment_target.to_string(),
            Field::CurrentEnrollment => study.current_enrollment.to_string(),
            Field::StartDate => study.start_date.map(|d| d.to_string()).unwrap_or_default(),
            Field::PlannedEndDate => study
                .planned_end_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            Field::Progress => format_number(record.progress),
            Field::InsightTag => record.insight_tag.to_string(),
        }
    }

    /// The record's value for this field as a date, where applicable.
    pub fn date_value(&self, record: &EnrichedStudy) -> Option<NaiveDate> {
        match self {
            Field::StartDate => record.study.start_date,
            Field::PlannedEndDate => record.study.planned_end_date,
            _ => None,
        }
    }
}

/// Render a float the way the dashboard did: integral values without a
/// fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::StudyId => "studyId",
            Field::Title => "title",
            Field::Phase => "phase",
            Field::Status => "status",
            Field::EnrollmentTarget => "enrollmentTarget",
            Field::CurrentEnrollment => "currentEnrollment",
            Field::StartDate => "startDate",
            Field::PlannedEndDate => "plannedEndDate",
            Field::Progress => "progress",
            Field::InsightTag => "insightTag",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "studyId" => Ok(Field::StudyId),
            "title" => Ok(Field::Title),
            "phase" => Ok(Field::Phase),
            "status" => Ok(Field::Status),
            "enrollmentTarget" => Ok(Field::EnrollmentTarget),
            "currentEnrollment" => Ok(Field::CurrentEnrollment),
            "startDate" => Ok(Field::StartDate),
            "plannedEndDate" => Ok(Field::PlannedEndDate),
            "progress" => Ok(Field::Progress),
            "insightTag" => Ok(Field::InsightTag),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

/// A filter comparison operator. `:` is substring containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Contains => ":",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            ":" => Ok(Operator::Contains),
            _ => Err(format!("Unknown operator: {}", s)),
        }
    }
}

/// One field/operator/value filter clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub field: Field,

    /// `None` when the source query carried an operator outside the
    /// supported set; such tokens match every record rather than
    /// erroring (permissive default inherited from the dashboard).
    pub operator: Option<Operator>,

    pub value: String,
}

impl Token {
    pub fn new(field: Field, operator: Operator, value: &str) -> Self {
        Self {
            field,
            operator: Some(operator),
            value: value.to_string(),
        }
    }

    /// Split a `field<op>value` clause at the first operator
    /// occurrence, trying two-character operators before their
    /// one-character prefixes.
    fn split_clause(s: &str) -> Option<(&str, Operator, &str)> {
        const OPERATORS: [(&str, Operator); 7] = [
            ("!=", Operator::Ne),
            ("<=", Operator::Le),
            (">=", Operator::Ge),
            ("=", Operator::Eq),
            ("<", Operator::Lt),
            (">", Operator::Gt),
            (":", Operator::Contains),
        ];
        for index in 0..s.len() {
            if !s.is_char_boundary(index) {
                continue;
            }
            for (symbol, op) in OPERATORS {
                if s[index..].starts_with(symbol) {
                    return Some((&s[..index], op, &s[index + symbol.len()..]));
                }
            }
        }
        None
    }

    fn matches(&self, record: &EnrichedStudy) -> bool {
        let Some(op) = self.operator else {
            return true;
        };

        if self.field.is_date() {
            return date_matches(self.field, op, record, &self.value);
        }

        let record_value = self.field.text_value(record).to_lowercase();
        let token_value = self.value.to_lowercase();
        match op {
            Operator::Eq => record_value == token_value,
            Operator::Ne => record_value != token_value,
            Operator::Lt => record_value < token_value,
            Operator::Le => record_value <= token_value,
            Operator::Gt => record_value > token_value,
            Operator::Ge => record_value >= token_value,
            Operator::Contains => record_value.contains(&token_value),
        }
    }
}

/// Date-typed comparison. Equality compares the normalized
/// `YYYY-MM-DD` rendering (a missing date equals nothing); the
/// ordering operators need both sides to parse as dates and otherwise
/// fail the token. Containment falls back to the text rendering.
fn date_matches(field: Field, op: Operator, record: &EnrichedStudy, token_value: &str) -> bool {
    let record_date = field.date_value(record);
    match op {
        Operator::Eq | Operator::Ne => {
            let record_text = record_date.map(|d| d.to_string()).unwrap_or_default();
            let token_text = parse_wire_date(token_value)
                .map(|d| d.to_string())
                .unwrap_or_else(|| token_value.trim().to_lowercase());
            let equal = record_text == token_text;
            if op == Operator::Eq { equal } else { !equal }
        }
        Operator::Contains => field
            .text_value(record)
            .to_lowercase()
            .contains(&token_value.to_lowercase()),
        _ => {
            let (Some(record_date), Some(token_date)) = (record_date, parse_wire_date(token_value))
            else {
                return false;
            };
            match op {
                Operator::Lt => record_date < token_date,
                Operator::Le => record_date <= token_date,
                Operator::Gt => record_date > token_date,
                Operator::Ge => record_date >= token_date,
                _ => unreachable!(),
            }
        }
    }
}

impl std::str::FromStr for Token {
    type Err = String;

    /// Parse a CLI filter clause like `phase=Phase 2`,
    /// `status!=Completed`, `startDate>=2024-01-01`, `title:cardio`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (field, operator, value) = Token::split_clause(s)
            .ok_or_else(|| format!("no operator in filter clause: {}", s))?;
        let field: Field = field.trim().parse()?;
        Ok(Token::new(field, operator, value.trim()))
    }
}

/// A structured filter: tokens plus optional free text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub tokens: Vec<Token>,
    pub free_text: String,
}

impl Query {
    /// True when the query constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.free_text.is_empty()
    }
}

/// Evaluate the query against the record set. Returns the matching
/// subset in original relative order; the input is never mutated.
pub fn apply(records: &[EnrichedStudy], query: &Query) -> Vec<EnrichedStudy> {
    // Group tokens by field, first-seen order
    let mut groups: Vec<(Field, Vec<&Token>)> = Vec::new();
    for token in &query.tokens {
        match groups.iter_mut().find(|(field, _)| *field == token.field) {
            Some((_, group)) => group.push(token),
            None => groups.push((token.field, vec![token])),
        }
    }

    let free_text = query.free_text.to_lowercase();

    records
        .iter()
        .filter(|record| {
            // Every field group must match; any token within a group suffices
            let groups_match = groups
                .iter()
                .all(|(_, group)| group.iter().any(|token| token.matches(record)));

            let text_match = free_text.is_empty()
                || Field::all()
                    .iter()
                    .any(|field| field.text_value(record).to_lowercase().contains(&free_text));

            groups_match && text_match
        })
        .cloned()
        .collect()
}
