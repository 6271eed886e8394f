//! studyloop command-line front end.
//!
//! # Responsibility
//! - Wire config, logging and SQLite persistence around `PlannerService`.
//! - Render planner views as plain text or JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use studyloop_core::db::{open_db, open_db_in_memory};
use studyloop_core::{
    core_version, default_log_level, flush_logging, format_study_date, init_logging,
    init_stderr_logging, pick_quiz_card, PlannerConfig, PlannerService, ReflectionDraft,
    SnapshotRepository, SqliteSnapshotRepository, UnitKey,
};
use uuid::Uuid;

/// Spaced-repetition study planner
#[derive(Parser)]
#[command(name = "studyloop")]
#[command(version = core_version())]
#[command(about = "Plan study sessions, reviews and quick practice")]
struct Cli {
    /// SQLite database file; state is kept in memory when omitted
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON planner config; missing keys use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logs go to stderr otherwise
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Progress, due reviews, upcoming sessions and practice suggestions
    Dashboard,

    /// List topics and their units
    Topics,

    /// Add a topic
    AddTopic {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Add a unit to a topic
    AddUnit {
        topic_id: Uuid,
        name: String,
        /// Estimated minutes; the configured default when omitted
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Record a study pass for a unit now
    Study { topic_id: Uuid, unit_id: Uuid },

    /// Units due for review today
    Due,

    /// Forward study calendar
    Calendar {
        /// Maximum sessions to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Unfinished units that fit a time budget
    QuickWins {
        #[arg(long, default_value = "15")]
        max_minutes: u32,
    },

    /// One random unit per topic
    Mixed,

    /// Add a retrieval practice card
    AddCard {
        question: String,
        answer: String,
        /// Related unit as TOPIC_ID:UNIT_ID
        #[arg(long, value_parser = parse_unit_key)]
        unit: Option<UnitKey>,
    },

    /// Draw a random quiz card
    Quiz,

    /// Record the outcome of a quiz attempt
    Answer {
        card_id: Uuid,
        /// Mark the attempt as wrong
        #[arg(long)]
        wrong: bool,
    },

    /// Write an elaboration note
    Elaborate {
        text: String,
        #[arg(long, value_parser = parse_unit_key)]
        unit: Option<UnitKey>,
    },

    /// Write an end-of-session reflection
    Reflect {
        learned: String,
        #[arg(long)]
        connections: Option<String>,
        #[arg(long)]
        open_questions: Option<String>,
        #[arg(long)]
        applications: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let result = run_cli(cli);
    // File logs are buffered until flushed.
    flush_logging();
    result
}

fn run_cli(cli: Cli) -> Result<()> {
    init_cli_logging(cli.log_dir.as_deref(), cli.log_level.as_deref())?;
    let config = load_config(cli.config.as_deref())?;

    let conn = match &cli.db {
        Some(path) => open_db(path)
            .with_context(|| format!("failed to open database `{}`", path.display()))?,
        None => open_db_in_memory().context("failed to open in-memory database")?,
    };
    let repo = SqliteSnapshotRepository::try_new(&conn)?;
    let mut service = PlannerService::open(repo, config)?;
    info!(
        "event=cli_start module=cli status=ok persistent={} core_version={}",
        cli.db.is_some(),
        core_version()
    );

    run(&mut service, cli.command, cli.json)
}

fn run<R: SnapshotRepository>(
    service: &mut PlannerService<R>,
    command: Commands,
    json: bool,
) -> Result<()> {
    let now = Utc::now();
    let mut rng = rand::thread_rng();

    match command {
        Commands::Dashboard => {
            let dashboard = service.dashboard(now, &mut rng);
            if json {
                return print_json(&dashboard);
            }
            println!(
                "Progress: {}/{} units ({}%)",
                dashboard.completed_units, dashboard.total_units, dashboard.overall_progress_percent
            );
            for topic in &dashboard.topics {
                println!(
                    "  {:<32} {}/{} ({}%)",
                    topic.name, topic.completed, topic.total, topic.percent
                );
            }
            println!(
                "Due for review: {} (showing {})",
                dashboard.due_review_total,
                dashboard.due_reviews.len()
            );
            for entry in &dashboard.due_reviews {
                println!("  {} / {}", entry.topic_name, entry.unit_name);
            }
            println!("Upcoming sessions:");
            for session in &dashboard.upcoming_sessions {
                println!("  {}  {} unit(s)", session.date, session.units.len());
            }
            println!(
                "Quick wins: {} micro, {} short",
                dashboard.micro_wins.len(),
                dashboard.short_wins.len()
            );
        }
        Commands::Topics => {
            let snapshot = service.snapshot();
            if json {
                let topics: Vec<_> = snapshot.topics().collect();
                return print_json(&topics);
            }
            for topic in snapshot.topics() {
                println!(
                    "{}. {} [{}] {}%",
                    topic.ordinal,
                    topic.name,
                    topic.id,
                    topic.progress_percent()
                );
                for unit in &topic.units {
                    let mark = if unit.completed { "x" } else { " " };
                    println!(
                        "   [{mark}] {}.{} {} [{}] last studied: {}",
                        topic.ordinal,
                        unit.ordinal,
                        unit.name,
                        unit.id,
                        format_study_date(unit.last_studied)
                    );
                }
            }
        }
        Commands::AddTopic { name, description } => {
            let Some(topic_id) = service.add_topic_with_description(&name, description.as_deref())?
            else {
                bail!("topic was not added; the name must not be blank");
            };
            println!("{topic_id}");
        }
        Commands::AddUnit {
            topic_id,
            name,
            minutes,
        } => {
            let added = match minutes {
                Some(minutes) => service.add_unit_with_estimate(topic_id, &name, minutes)?,
                None => service.add_unit(topic_id, &name)?,
            };
            let Some(unit_id) = added else {
                bail!("unit was not added; check the topic id, the name and the estimate");
            };
            println!("{unit_id}");
        }
        Commands::Study { topic_id, unit_id } => {
            if !service.mark_studied(topic_id, unit_id)? {
                bail!("unit {unit_id} not found in topic {topic_id}");
            }
            println!("studied {unit_id}");
        }
        Commands::Due => {
            let due = service.due_for_review(now);
            if json {
                return print_json(&due);
            }
            for entry in &due {
                println!("{} / {}", entry.topic_name, entry.unit_name);
            }
        }
        Commands::Calendar { limit } => {
            let mut sessions = service.upcoming_sessions(now);
            if let Some(limit) = limit {
                sessions.truncate(limit);
            }
            if json {
                return print_json(&sessions);
            }
            for session in &sessions {
                let tags: Vec<_> = session.tags.iter().map(ToString::to_string).collect();
                println!("{} [{}]", session.date.format("%a, %b %-d"), tags.join(", "));
                for unit in &session.units {
                    println!("  {} / {}", unit.topic_name, unit.unit_name);
                }
            }
        }
        Commands::QuickWins { max_minutes } => {
            let wins = service.quick_wins(max_minutes);
            if json {
                return print_json(&wins);
            }
            for entry in &wins {
                println!(
                    "{:>3} min  {} / {}",
                    entry.estimated_minutes, entry.unit.topic_name, entry.unit.unit_name
                );
            }
        }
        Commands::Mixed => {
            let session = service.mixed_session(&mut rng);
            if json {
                return print_json(&session);
            }
            for entry in &session {
                println!("{} / {}", entry.unit.topic_name, entry.unit.unit_name);
            }
        }
        Commands::AddCard {
            question,
            answer,
            unit,
        } => {
            let Some(card_id) = service.add_quiz_card(&question, &answer, unit)? else {
                bail!("card was not added; question and answer are required");
            };
            println!("{card_id}");
        }
        Commands::Quiz => {
            let snapshot = service.snapshot();
            let Some(card) = pick_quiz_card(&snapshot, &mut rng) else {
                bail!("no quiz cards yet; add one with `add-card`");
            };
            if json {
                return print_json(card);
            }
            println!("[{}] {}", card.id, card.question);
            println!("answer: {}", card.answer);
        }
        Commands::Answer { card_id, wrong } => {
            if !service.record_quiz_attempt(card_id, !wrong, now)? {
                bail!("quiz card {card_id} not found");
            }
            let snapshot = service.snapshot();
            if let Some(accuracy) = snapshot
                .quiz_card(card_id)
                .and_then(|card| card.accuracy_percent())
            {
                println!("accuracy {accuracy}%");
            }
        }
        Commands::Elaborate { text, unit } => {
            let Some(id) = service.add_elaboration(&text, unit, now)? else {
                bail!("elaboration was not added; check the text and related unit");
            };
            println!("{id}");
        }
        Commands::Reflect {
            learned,
            connections,
            open_questions,
            applications,
        } => {
            let draft = ReflectionDraft {
                learned,
                connections,
                open_questions,
                applications,
            };
            let Some(id) = service.add_reflection(&draft, now)? else {
                bail!("reflection was not added; `learned` must not be blank");
            };
            println!("{id}");
        }
    }
    Ok(())
}

fn init_cli_logging(log_dir: Option<&str>, level: Option<&str>) -> Result<()> {
    match log_dir {
        Some(dir) => init_logging(level.unwrap_or(default_log_level()), dir)?,
        None => init_stderr_logging(level.unwrap_or("warn"))?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config `{}`", path.display()))?;
    let config: PlannerConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config `{}`", path.display()))?;
    Ok(config)
}

fn parse_unit_key(value: &str) -> Result<UnitKey, String> {
    let (topic_id, unit_id) = value
        .split_once(':')
        .ok_or_else(|| "expected TOPIC_ID:UNIT_ID".to_string())?;
    let parse = |text: &str| Uuid::parse_str(text.trim()).map_err(|err| err.to_string());
    Ok(UnitKey::new(parse(topic_id)?, parse(unit_id)?))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_unit_key, Cli};
    use clap::CommandFactory;
    use uuid::Uuid;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_unit_key_accepts_pair_and_rejects_garbage() {
        let topic_id = Uuid::new_v4();
        let unit_id = Uuid::new_v4();
        let key = parse_unit_key(&format!("{topic_id}:{unit_id}")).unwrap();
        assert_eq!(key.topic_id, topic_id);
        assert_eq!(key.unit_id, unit_id);

        assert!(parse_unit_key("no-colon").is_err());
        assert!(parse_unit_key("a:b").is_err());
    }
}
