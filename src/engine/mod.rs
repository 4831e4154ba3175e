//! The study pipeline engine.
//!
//! Pure, stateless computation over in-memory study records. Data flows
//! one way: raw records -> classify (per-record enrichment) -> filter ->
//! sort -> paginate; the aggregations consume the same enriched set
//! independently for chart output. No function here mutates its input;
//! each returns a new derived sequence.

pub mod aggregate;
pub mod classify;
pub mod export;
pub mod filter;
pub mod paginate;
pub mod sort;

pub use classify::{classify, enrich_all};
pub use export::{project, ExportTable};
pub use filter::{Field, Operator, Query, Token};
pub use paginate::{page_count, paginate};
pub use sort::sort_by;
