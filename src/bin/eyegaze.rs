//! Eyegaze CLI - Command-line interface for Eyegaze Flux
//!
//! Commands:
//! - load: Load the corpus and print the load report
//! - bubble: Bubble chart points for one participant and condition
//! - radar: Normalized radar dataset against all participants
//! - events: Event timeline messages
//! - schema: Print the event schema registry and metric vocabulary
//! - doctor: Diagnose data root and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use eyegaze_flux::metrics::{
    bubble_points, event_message, tail, time_extent, AverageMode, BubbleScale, ExclusiveWindow,
    LookAheadWindow, RadarChart, TimeWindow,
};
use eyegaze_flux::pipeline::{LoadOutcome, SlotStatus};
use eyegaze_flux::schema::{SchemaRegistry, METRIC_VOCABULARY};
use eyegaze_flux::types::{ParticipantId, Timed, VisualizationCondition};
use eyegaze_flux::{
    load, Corpus, FsSource, GazeError, LoadReport, LoaderConfig, FLUX_VERSION, PRODUCER_NAME,
};

/// Eyegaze - Eye-tracking session log parser and derived-metrics engine
#[derive(Parser)]
#[command(name = "eyegaze")]
#[command(version = FLUX_VERSION)]
#[command(about = "Parse eye-tracking logs and compute derived metrics", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data root, overrides the configuration
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the corpus and print the load report
    Load {
        /// Participants to load (default: all configured)
        #[arg(short, long)]
        participant: Vec<String>,

        /// Load a single condition
        #[arg(long, value_enum)]
        condition: Option<Condition>,

        /// Fail if any slot is unavailable
        #[arg(long)]
        strict: bool,

        /// Output report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bubble chart points for one participant and condition
    Bubble {
        #[arg(short, long)]
        participant: String,

        #[arg(long, value_enum, default_value = "graph")]
        condition: Condition,

        /// Keep records with MIN < time < MAX
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], conflicts_with = "playback")]
        window: Option<Vec<f64>>,

        /// Playback range; keeps LO + offset < time <= HI + offset
        #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
        playback: Option<Vec<f64>>,

        /// Keep only the last N records
        #[arg(long)]
        last: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalized radar dataset for a participant
    Radar {
        #[arg(short, long)]
        participant: String,

        #[arg(long, value_enum, default_value = "graph")]
        condition: Condition,

        /// Average with the arithmetic mean instead of the pairwise fold
        #[arg(long)]
        mean: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Event timeline messages
    Events {
        #[arg(short, long)]
        participant: String,

        #[arg(long, value_enum, default_value = "graph")]
        condition: Condition,

        /// Playback range; keeps LO + offset < time <= HI + offset
        #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
        playback: Option<Vec<f64>>,

        /// Keep only the last N events
        #[arg(long)]
        last: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the event schema registry and metric vocabulary
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose data root and configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Condition {
    /// Node-link graph visualization
    Graph,
    /// Indented tree visualization
    Tree,
}

impl From<Condition> for VisualizationCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Graph => VisualizationCondition::Graph,
            Condition::Tree => VisualizationCondition::Tree,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so JSON output on stdout stays parseable
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), EyegazeCliError> {
    let config = resolve_config(cli.config.as_deref(), cli.data_root)?;

    match cli.command {
        Commands::Load {
            participant,
            condition,
            strict,
            json,
        } => cmd_load(&config, &participant, condition, strict, json),

        Commands::Bubble {
            participant,
            condition,
            window,
            playback,
            last,
            json,
        } => {
            let window = parse_window(window.as_deref(), playback.as_deref(), &config)?;
            cmd_bubble(&config, &participant, condition.into(), window, last, json)
        }

        Commands::Radar {
            participant,
            condition,
            mean,
            json,
        } => cmd_radar(&config, &participant, condition.into(), mean, json),

        Commands::Events {
            participant,
            condition,
            playback,
            last,
            json,
        } => {
            let window = parse_window(None, playback.as_deref(), &config)?;
            cmd_events(&config, &participant, condition.into(), window, last, json)
        }

        Commands::Schema { json } => cmd_schema(json),

        Commands::Doctor { json } => cmd_doctor(&config, json),
    }
}

fn resolve_config(
    path: Option<&Path>,
    data_root: Option<PathBuf>,
) -> Result<LoaderConfig, EyegazeCliError> {
    let mut config = match path {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(root) = data_root {
        config.data_root = root;
    }
    Ok(config)
}

fn cmd_load(
    config: &LoaderConfig,
    participants: &[String],
    condition: Option<Condition>,
    strict: bool,
    json: bool,
) -> Result<(), EyegazeCliError> {
    let participants = if participants.is_empty() {
        config.participants.clone()
    } else {
        participants.iter().map(ParticipantId::new).collect()
    };
    let conditions = match condition {
        Some(condition) => vec![condition.into()],
        None => config.conditions.clone(),
    };

    let outcome = load_corpus(config, &participants, &conditions)?;
    let report = &outcome.report;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print_load_report(report);
    }

    let unavailable = report.unavailable().count();
    if strict && unavailable > 0 {
        return Err(EyegazeCliError::Incomplete(unavailable));
    }
    Ok(())
}

fn cmd_bubble(
    config: &LoaderConfig,
    participant: &str,
    condition: VisualizationCondition,
    window: Option<Window>,
    last: Option<usize>,
    json: bool,
) -> Result<(), EyegazeCliError> {
    let participant = ParticipantId::new(participant);
    let outcome = load_corpus(config, &[participant.clone()], &[condition])?;
    let corpus = &outcome.corpus;

    let fixations = apply_window(corpus.fixations(&participant, condition)?, window.as_ref());
    let events = apply_window(corpus.events(&participant, condition)?, window.as_ref());
    let amount = last.unwrap_or(0);
    let fixations = tail(&fixations, amount);
    let events = tail(&events, amount);

    let set = bubble_points(fixations, events, BubbleScale::from(&config.metrics));
    let extent = time_extent(corpus.fixations(&participant, condition)?);

    if json {
        let output = serde_json::json!({
            "participant": participant,
            "condition": condition,
            "time_extent": extent,
            "bubbles": set,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_participant_summary(corpus, &participant, condition)?;
        println!("Time extent: {}", format_optional(extent));
        println!("Multiplier:  {}", set.multiplier);
        println!(
            "Points:      {} fixations, {} clicks",
            set.fixation_points().count(),
            set.click_points().count()
        );
        println!();
        for point in &set.points {
            println!("  {:>10.2} {:>10.2} {:>10.2}", point.x, point.y, point.r);
        }
    }

    Ok(())
}

fn cmd_radar(
    config: &LoaderConfig,
    participant: &str,
    condition: VisualizationCondition,
    mean: bool,
    json: bool,
) -> Result<(), EyegazeCliError> {
    let participant = ParticipantId::new(participant);
    if !config.participants.contains(&participant) {
        return Err(GazeError::UnknownParticipant(participant).into());
    }

    let outcome = load_corpus(config, &config.participants, &[condition])?;
    let mode = if mean {
        AverageMode::ArithmeticMean
    } else {
        config.metrics.average_mode
    };
    let chart = RadarChart::build(&outcome.corpus, &participant, condition, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        println!(
            "Radar: {} ({}) against {} participants, {:?}",
            chart.participant, chart.condition, chart.stats.participants, chart.stats.mode
        );
        println!();
        println!(
            "  {:<28} {:>6} {:>12} {:>8} {:>8}",
            "metric", "unit", "value", "norm", "average"
        );
        for (i, label) in chart.labels.iter().enumerate() {
            println!(
                "  {:<28} {:>6} {:>12.3} {:>8} {:>8}",
                label,
                chart.units[i],
                chart.raw[i],
                chart.normalized[i],
                chart.average.get(i).copied().unwrap_or(f64::NAN)
            );
        }
    }

    Ok(())
}

fn cmd_events(
    config: &LoaderConfig,
    participant: &str,
    condition: VisualizationCondition,
    window: Option<Window>,
    last: Option<usize>,
    json: bool,
) -> Result<(), EyegazeCliError> {
    let participant = ParticipantId::new(participant);
    let outcome = load_corpus(config, &[participant.clone()], &[condition])?;

    let events = apply_window(outcome.corpus.events(&participant, condition)?, window.as_ref());
    let events = tail(&events, last.unwrap_or(0));

    if json {
        let lines: Vec<_> = events
            .iter()
            .map(|event| {
                serde_json::json!({
                    "time": event.time(),
                    "message": event_message(event),
                    "event": event,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for event in events {
            println!("{}", event_message(event));
        }
    }

    Ok(())
}

fn cmd_schema(json: bool) -> Result<(), EyegazeCliError> {
    if json {
        let events: Vec<_> = SchemaRegistry::entries()
            .map(|(key, fields)| {
                serde_json::json!({
                    "code": key.code(),
                    "name": key.name(),
                    "tokens": key.token_count(),
                    "fields": fields,
                })
            })
            .collect();
        let metrics: Vec<_> = METRIC_VOCABULARY
            .iter()
            .map(|(description, unit)| serde_json::json!({ "description": description, "unit": unit }))
            .collect();
        let output = serde_json::json!({ "events": events, "metrics": metrics });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Fixation lines (FXD): <id> <time> <duration> <x> <y>");
    println!();
    println!("Event lines (EVD): <time> <tag> <key> <trailing fields>");
    for (key, fields) in SchemaRegistry::entries() {
        let names: Vec<String> = fields
            .iter()
            .map(|field| format!("{}:{}", field.name, field.kind))
            .collect();
        println!("  {:<20} {}", key.to_string(), names.join(" "));
    }
    println!();
    println!("Generated lines: <description>:<value>[:<description>:<value>...]");
    for (description, unit) in METRIC_VOCABULARY {
        if unit.is_empty() {
            println!("  {}", description);
        } else {
            println!("  {} ({})", description, unit);
        }
    }
    println!();
    println!("Gaze-zone lines (GZD): not supported");

    Ok(())
}

fn cmd_doctor(config: &LoaderConfig, json: bool) -> Result<(), EyegazeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "flux_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Flux version {}", FLUX_VERSION),
    });

    checks.push(match config.validate() {
        Ok(()) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} participants, {} conditions",
                config.participants.len(),
                config.conditions.len()
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    checks.push(if config.data_root.is_dir() {
        DoctorCheck {
            name: "data_root".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} exists", config.data_root.display()),
        }
    } else {
        DoctorCheck {
            name: "data_root".to_string(),
            status: CheckStatus::Error,
            message: format!("{} is not a directory", config.data_root.display()),
        }
    });

    let metadata_path = config.metadata_path();
    checks.push(match std::fs::read_to_string(&metadata_path) {
        Ok(text) => {
            let table = eyegaze_flux::metadata::MetadataTable::parse(&text);
            let missing: Vec<&str> = config
                .participants
                .iter()
                .filter(|p| !table.contains(p))
                .map(ParticipantId::as_str)
                .collect();
            if missing.is_empty() && table.dropped == 0 {
                DoctorCheck {
                    name: "metadata".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("{} participants in table", table.len()),
                }
            } else if missing.is_empty() {
                DoctorCheck {
                    name: "metadata".to_string(),
                    status: CheckStatus::Warning,
                    message: format!("{} unusable groups dropped", table.dropped),
                }
            } else {
                DoctorCheck {
                    name: "metadata".to_string(),
                    status: CheckStatus::Error,
                    message: format!("no rows for {}", missing.join(", ")),
                }
            }
        }
        Err(e) => DoctorCheck {
            name: "metadata".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read {}: {}", metadata_path.display(), e),
        },
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FLUX_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Eyegaze Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(EyegazeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn load_corpus(
    config: &LoaderConfig,
    participants: &[ParticipantId],
    conditions: &[VisualizationCondition],
) -> Result<LoadOutcome, EyegazeCliError> {
    config.validate()?;
    let source = FsSource::new(config.clone());
    Ok(load(&source, participants, conditions)?)
}

enum Window {
    Exclusive(ExclusiveWindow),
    LookAhead(LookAheadWindow),
}

fn parse_window(
    window: Option<&[f64]>,
    playback: Option<&[f64]>,
    config: &LoaderConfig,
) -> Result<Option<Window>, EyegazeCliError> {
    match (window, playback) {
        (Some([min, max]), None) => Ok(Some(Window::Exclusive(ExclusiveWindow::new(*min, *max)))),
        (None, Some([lo, hi])) => Ok(Some(Window::LookAhead(LookAheadWindow::with_offset(
            *lo,
            *hi,
            config.metrics.look_ahead_ms,
        )))),
        (None, None) => Ok(None),
        _ => Err(EyegazeCliError::InvalidWindow(
            "expected exactly two bounds for one window".to_string(),
        )),
    }
}

fn apply_window<T: Timed + Clone>(records: &[T], window: Option<&Window>) -> Vec<T> {
    match window {
        Some(Window::Exclusive(w)) => w.select(records),
        Some(Window::LookAhead(w)) => w.select(records),
        None => records.to_vec(),
    }
}

fn print_load_report(report: &LoadReport) {
    println!("Corpus {}", report.corpus_id);
    println!(
        "Loaded {} participants x {} conditions in {} ms",
        report.participants.len(),
        report.conditions.len(),
        (report.finished_at - report.started_at).num_milliseconds()
    );
    println!("Dropped lines:          {}", report.dropped_lines());
    println!("Dropped metadata groups: {}", report.metadata_dropped);

    let unavailable: Vec<_> = report.unavailable().collect();
    if unavailable.is_empty() {
        println!("All slots loaded");
        return;
    }

    println!("\nUnavailable slots ({}):", unavailable.len());
    for slot in unavailable {
        if let SlotStatus::Unavailable { reason } = &slot.status {
            println!("  [{:?}] {}: {}", slot.origin, slot.slot, reason);
        }
    }
}

fn print_participant_summary(
    corpus: &Corpus,
    participant: &ParticipantId,
    condition: VisualizationCondition,
) -> Result<(), EyegazeCliError> {
    println!("Participant: {} ({})", participant, condition);
    if let Some(row) = corpus.metadata_for(participant, condition)? {
        println!("Ontology:    {}", row.ontology.display_name());
        println!("Task Success: {}", row.success_label());
    }
    Ok(())
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

// Error types

#[derive(Debug)]
enum EyegazeCliError {
    Io(io::Error),
    Gaze(GazeError),
    Json(serde_json::Error),
    InvalidWindow(String),
    Incomplete(usize),
    DoctorFailed,
}

impl From<io::Error> for EyegazeCliError {
    fn from(e: io::Error) -> Self {
        EyegazeCliError::Io(e)
    }
}

impl From<GazeError> for EyegazeCliError {
    fn from(e: GazeError) -> Self {
        EyegazeCliError::Gaze(e)
    }
}

impl From<serde_json::Error> for EyegazeCliError {
    fn from(e: serde_json::Error) -> Self {
        EyegazeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EyegazeCliError> for CliError {
    fn from(e: EyegazeCliError) -> Self {
        match e {
            EyegazeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EyegazeCliError::Gaze(e) => {
                let (code, hint) = match &e {
                    GazeError::MissingMetadata(_) => (
                        "MISSING_METADATA",
                        "Add the participant to the metadata table or drop it from the list",
                    ),
                    GazeError::SourceUnavailable(_) => {
                        ("SOURCE_UNAVAILABLE", "Check --data-root and the path templates")
                    }
                    GazeError::UnknownParticipant(_) => (
                        "UNKNOWN_PARTICIPANT",
                        "Run 'eyegaze load' to list loaded participants",
                    ),
                    GazeError::Config(_) => ("CONFIG_ERROR", "Run 'eyegaze doctor' for details"),
                    _ => ("LOAD_ERROR", "Run 'eyegaze doctor' for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            EyegazeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EyegazeCliError::InvalidWindow(msg) => CliError {
                code: "INVALID_WINDOW".to_string(),
                message: msg,
                hint: Some("Use --window MIN MAX or --playback LO HI".to_string()),
            },
            EyegazeCliError::Incomplete(count) => CliError {
                code: "INCOMPLETE_LOAD".to_string(),
                message: format!("{} slots unavailable", count),
                hint: Some("Drop --strict to accept partial data".to_string()),
            },
            EyegazeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
