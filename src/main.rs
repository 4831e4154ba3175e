//! Cohort CLI - a clinical trial study tracking tool.

use chrono::{NaiveDate, Utc};
use clap::Parser;
use cohort::action_log;
use cohort::cli::{Cli, Commands, MetricsCommands, StudyCommands, SystemCommands};
use cohort::commands::{self, DateRanges, Output};
use cohort::engine::{Query, Token};
use cohort::models::StudyPatch;
use cohort::store::resolve_data_dir;
use std::path::Path;
use std::process;
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Data dir: --data-dir flag > COHORT_DATA_DIR env (clap) > platform default
    let data_dir = resolve_data_dir(cli.data_dir.clone());

    // Insights evaluate against today unless --as-of overrides it
    let today = cli.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let (cmd_name, args_json) = describe_command(&cli.command);

    let start = Instant::now();
    let result = run_command(cli.command, &data_dir, today, human);
    let duration = start.elapsed().as_millis() as u64;

    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    // Audit trail; silently skipped when logging is disabled or fails
    action_log::log_action(&data_dir, &cmd_name, args_json, success, error, duration);

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn run_command(
    command: Option<Commands>,
    data_dir: &Path,
    today: NaiveDate,
    human: bool,
) -> Result<(), cohort::Error> {
    match command {
        Some(Commands::System { command }) => match command {
            SystemCommands::Init => {
                let result = commands::system_init(data_dir)?;
                output(&result, human);
            }
            SystemCommands::Version => {
                output(&commands::system_version(), human);
            }
        },

        Some(Commands::Study { command }) => match command {
            StudyCommands::Add {
                id,
                title,
                phase,
                status,
                target,
                current,
                start,
                end,
            } => {
                let result = commands::study_add(
                    data_dir, &id, &title, phase, status, target, current, start, end, today,
                )?;
                output(&result, human);
            }

            StudyCommands::List {
                filters,
                find,
                sort_by,
                descending,
                page,
                page_size,
            } => {
                let query = build_query(filters, find);
                let result = commands::study_list(
                    data_dir, &query, sort_by, descending, page, page_size, today,
                )?;
                output(&result, human);
            }

            StudyCommands::Show { id } => {
                let result = commands::study_show(data_dir, &id, today)?;
                output(&result, human);
            }

            StudyCommands::Update {
                id,
                title,
                phase,
                status,
                target,
                current,
                start,
                end,
            } => {
                let patch = StudyPatch {
                    title,
                    phase,
                    status,
                    enrollment_target: target,
                    current_enrollment: current,
                    start_date: start,
                    planned_end_date: end,
                };
                if patch.is_empty() {
                    return Err(cohort::Error::InvalidInput(
                        "no fields to update; pass at least one --option".to_string(),
                    ));
                }
                let result = commands::study_update(data_dir, &id, &patch, today)?;
                output(&result, human);
            }

            StudyCommands::Rm { id } => {
                let result = commands::study_rm(data_dir, &id)?;
                output(&result, human);
            }
        },

        Some(Commands::Import {
            file,
            override_duplicates,
        }) => {
            let result = commands::import_file(data_dir, &file, override_duplicates)?;
            output(&result, human);
        }

        Some(Commands::Export {
            columns,
            filters,
            find,
            phases,
            statuses,
            start_from,
            start_to,
            end_from,
            end_to,
            sort_by,
            descending,
        }) => {
            let mut tokens = filters;
            // Categorical conveniences become ordinary tokens: same-field
            // tokens OR-combine, which is exactly the in-set semantics
            for phase in phases {
                tokens.push(Token::new(
                    cohort::engine::Field::Phase,
                    cohort::engine::Operator::Eq,
                    &phase.to_string(),
                ));
            }
            for status in statuses {
                tokens.push(Token::new(
                    cohort::engine::Field::Status,
                    cohort::engine::Operator::Eq,
                    &status.to_string(),
                ));
            }
            let query = build_query(tokens, find);
            let ranges = DateRanges {
                start_from,
                start_to,
                end_from,
                end_to,
            };
            let result = commands::export(
                data_dir, &columns, &query, ranges, sort_by, descending, today,
            )?;
            output(&result, human);
        }

        Some(Commands::Metrics { command }) => match command {
            MetricsCommands::Status => {
                let result = commands::metrics_status(data_dir)?;
                output(&result, human);
            }
            MetricsCommands::StatusPhase => {
                let result = commands::metrics_status_phase(data_dir)?;
                output(&result, human);
            }
            MetricsCommands::Monthly => {
                let result = commands::metrics_monthly(data_dir)?;
                output(&result, human);
            }
            MetricsCommands::Alerts => {
                let result = commands::metrics_alerts(data_dir, today)?;
                output(&result, human);
            }
        },

        Some(Commands::Log { limit }) => {
            let result = commands::log_show(data_dir, limit)?;
            output(&result, human);
        }

        None => {
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
        }
    }

    Ok(())
}

fn build_query(tokens: Vec<Token>, find: Option<String>) -> Query {
    Query {
        tokens,
        free_text: find.unwrap_or_default(),
    }
}

/// Command name and argument summary for the action log.
fn describe_command(command: &Option<Commands>) -> (String, serde_json::Value) {
    let name = match command {
        Some(Commands::System {
            command: SystemCommands::Init,
        }) => "system init",
        Some(Commands::System {
            command: SystemCommands::Version,
        }) => "system version",
        Some(Commands::Study { command }) => match command {
            StudyCommands::Add { .. } => "study add",
            StudyCommands::List { .. } => "study list",
            StudyCommands::Show { .. } => "study show",
            StudyCommands::Update { .. } => "study update",
            StudyCommands::Rm { .. } => "study rm",
        },
        Some(Commands::Import { .. }) => "import",
        Some(Commands::Export { .. }) => "export",
        Some(Commands::Metrics { command }) => match command {
            MetricsCommands::Status => "metrics status",
            MetricsCommands::StatusPhase => "metrics status-phase",
            MetricsCommands::Monthly => "metrics monthly",
            MetricsCommands::Alerts => "metrics alerts",
        },
        Some(Commands::Log { .. }) => "log",
        None => "help",
    };
    let args: Vec<String> = std::env::args().skip(1).collect();
    (name.to_string(), serde_json::json!(args))
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
