//! CLI argument definitions for Cohort.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::{Field, Token};
use crate::models::{Phase, Status};

/// Cohort - a clinical trial study tracking tool.
///
/// Track studies, their enrollment progress, and derived risk insights.
/// Start with `ct system init`, then `ct study add` or `ct import`.
#[derive(Parser, Debug)]
#[command(name = "ct")]
#[command(author, version, about = "A CLI tool for clinical teams to track trial studies", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Data directory holding the study snapshot and action log.
    /// Defaults to the platform data dir (e.g. ~/.local/share/cohort).
    #[arg(short = 'C', long = "data-dir", global = true, env = "COHORT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Evaluate enrollment insights as of this date (YYYY-MM-DD)
    /// instead of today
    #[arg(long = "as-of", global = true, env = "COHORT_AS_OF")]
    pub as_of: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// System management commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },

    /// Study record commands
    Study {
        #[command(subcommand)]
        command: StudyCommands,
    },

    /// Bulk import studies from a JSON file
    ///
    /// The file holds an array of study records. Records whose IDs
    /// already exist are skipped and reported; pass --override to
    /// replace them instead.
    Import {
        /// Path to a JSON array of study records
        file: PathBuf,

        /// Replace stored records on ID collision instead of skipping
        #[arg(long = "override")]
        override_duplicates: bool,
    },

    /// Project the filtered, sorted study set onto visible columns
    Export {
        /// Comma-separated column names (wire keys, e.g.
        /// studyId,title,progress). Defaults to every column.
        #[arg(long, value_delimiter = ',')]
        columns: Vec<Field>,

        /// Filter clause `field<op>value` (repeatable)
        #[arg(long = "filter")]
        filters: Vec<Token>,

        /// Free-text match against any field
        #[arg(long)]
        find: Option<String>,

        /// Keep only these phases (repeatable)
        #[arg(long = "phase")]
        phases: Vec<Phase>,

        /// Keep only these statuses (repeatable)
        #[arg(long = "status")]
        statuses: Vec<Status>,

        /// Earliest start date to keep
        #[arg(long = "start-from")]
        start_from: Option<NaiveDate>,

        /// Latest start date to keep
        #[arg(long = "start-to")]
        start_to: Option<NaiveDate>,

        /// Earliest planned end date to keep
        #[arg(long = "end-from")]
        end_from: Option<NaiveDate>,

        /// Latest planned end date to keep
        #[arg(long = "end-to")]
        end_to: Option<NaiveDate>,

        /// Sort field
        #[arg(long = "sort-by", default_value = "studyId")]
        sort_by: Field,

        /// Sort descending
        #[arg(long)]
        descending: bool,
    },

    /// Chart aggregations over the study set
    Metrics {
        #[command(subcommand)]
        command: MetricsCommands,
    },

    /// Show recent entries from the action log
    Log {
        /// Maximum number of entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// System commands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Create the data directory and an empty study snapshot
    Init,

    /// Show version and build information
    Version,
}

/// Study record commands
#[derive(Subcommand, Debug)]
pub enum StudyCommands {
    /// Add a study (duplicate IDs are rejected)
    Add {
        /// Study ID (normalized to trimmed uppercase)
        id: String,

        /// Study title
        title: String,

        /// Trial phase ("Phase 1" .. "Phase 4")
        #[arg(long)]
        phase: Phase,

        /// Recruitment status ("Recruiting", "Not yet recruiting",
        /// "Completed")
        #[arg(long)]
        status: Status,

        /// Target enrollment
        #[arg(long, default_value_t = 0)]
        target: u32,

        /// Current enrollment
        #[arg(long, default_value_t = 0)]
        current: u32,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Planned end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// List studies: classify, filter, sort, paginate
    List {
        /// Filter clause `field<op>value` (repeatable). Operators:
        /// = != < <= > >= : (contains). Example: `phase=Phase 2`
        #[arg(long = "filter")]
        filters: Vec<Token>,

        /// Free-text match against any field
        #[arg(long)]
        find: Option<String>,

        /// Sort field (wire key, e.g. studyId, startDate, progress)
        #[arg(long = "sort-by", default_value = "studyId")]
        sort_by: Field,

        /// Sort descending
        #[arg(long)]
        descending: bool,

        /// 1-based page index
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Page size
        #[arg(long = "page-size", default_value_t = 10)]
        page_size: usize,
    },

    /// Show one study with its derived insight
    Show {
        /// Study ID
        id: String,
    },

    /// Update fields of a study
    Update {
        /// Study ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New phase
        #[arg(long)]
        phase: Option<Phase>,

        /// New status
        #[arg(long)]
        status: Option<Status>,

        /// New target enrollment
        #[arg(long)]
        target: Option<u32>,

        /// New current enrollment
        #[arg(long)]
        current: Option<u32>,

        /// New start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// New planned end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Remove a study
    Rm {
        /// Study ID
        id: String,
    },
}

/// Chart aggregation commands
#[derive(Subcommand, Debug)]
pub enum MetricsCommands {
    /// Study count per status (pie chart)
    Status,

    /// Study count per (status, phase) pair (bar chart)
    StatusPhase,

    /// Trial initiations per start month and phase (line chart)
    Monthly,

    /// Enrollment risk alert buckets (dashboard strip)
    Alerts,
}
