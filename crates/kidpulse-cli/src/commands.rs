//! Subcommand parsing and the read-side queries behind them.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local, NaiveDate};
use kidpulse_store::SummaryStore;
use serde_json::json;

const DEFAULT_LIMIT: usize = 30;

#[derive(Debug, PartialEq)]
pub enum Command {
    Ingest {
        file: PathBuf,
        child: String,
        date: Option<NaiveDate>,
    },
    Show {
        date: NaiveDate,
    },
    History {
        limit: usize,
    },
    Log {
        limit: usize,
    },
    Help,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some(name) = args.first() else {
        return Ok(Command::Help);
    };

    match name.as_str() {
        "ingest" => {
            let mut file = None;
            let mut child = None;
            let mut date = None;
            let mut rest = args[1..].iter();
            while let Some(arg) = rest.next() {
                match arg.as_str() {
                    "--child" => {
                        child = Some(rest.next().ok_or_else(|| anyhow!("--child needs a name"))?.clone())
                    }
                    "--date" => {
                        let value = rest.next().ok_or_else(|| anyhow!("--date needs a value"))?;
                        date = Some(parse_date(value)?);
                    }
                    other if file.is_none() && !other.starts_with("--") => file = Some(PathBuf::from(other)),
                    other => bail!("Unexpected argument: {}", other),
                }
            }
            Ok(Command::Ingest {
                file: file.ok_or_else(|| anyhow!("Usage: kidpulse ingest <file> --child <name> [--date YYYY-MM-DD]"))?,
                child: child.ok_or_else(|| anyhow!("--child is required"))?,
                date,
            })
        }
        "show" => {
            let value = args.get(1).ok_or_else(|| anyhow!("Usage: kidpulse show <YYYY-MM-DD>"))?;
            Ok(Command::Show {
                date: parse_date(value)?,
            })
        }
        "history" => Ok(Command::History {
            limit: parse_limit(args.get(1))?,
        }),
        "log" => Ok(Command::Log {
            limit: parse_limit(args.get(1))?,
        }),
        "--help" | "-h" | "help" => Ok(Command::Help),
        other => bail!("Unknown command: {}. Use 'kidpulse help' for usage.", other),
    }
}

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

fn parse_limit(value: Option<&String>) -> anyhow::Result<usize> {
    match value {
        None => Ok(DEFAULT_LIMIT),
        Some(v) => v.parse().with_context(|| format!("Invalid limit '{}'", v)),
    }
}

pub fn print_help() {
    println!("KidPulse - childcare feed extraction");
    println!();
    println!("Usage: kidpulse <command>");
    println!();
    println!("Commands:");
    println!("  ingest <file> --child <name> [--date YYYY-MM-DD]");
    println!("                           Extract events from a captured feed and save them");
    println!("  show <YYYY-MM-DD>        Print the stored summary for a date");
    println!("  history [limit]          List dates with data");
    println!("  log [limit]              Show recent scrape results");
    println!("  help                     Show this help message");
    println!();
    println!("Data directory: $KIDPULSE_DATA_DIR (default: data)");
}

/// Stored summary for a date with its timestamps, or `None`.
pub fn show_json(store: &dyn SummaryStore, date: NaiveDate) -> anyhow::Result<Option<serde_json::Value>> {
    let Some(stored) = store.get_summary(date)? else {
        return Ok(None);
    };
    Ok(Some(json!({
        "date": stored.date,
        "children": stored.summary.children,
        "createdAt": format_millis(stored.created_at),
        "updatedAt": format_millis(stored.updated_at),
    })))
}

pub fn history_lines(store: &dyn SummaryStore, limit: usize) -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::new();
    for date in store.available_dates(limit)? {
        let events = store
            .get_summary(date)?
            .map(|s| s.summary.event_count())
            .unwrap_or(0);
        lines.push(format!("{}  {} events", date, events));
    }
    Ok(lines)
}

pub fn log_lines(store: &dyn SummaryStore, limit: usize) -> anyhow::Result<Vec<String>> {
    Ok(store
        .scrape_history(limit)?
        .into_iter()
        .map(|entry| {
            format!(
                "{}  {}  {}",
                format_millis(entry.timestamp),
                if entry.success { "ok    " } else { "FAILED" },
                entry.message.as_deref().unwrap_or("")
            )
        })
        .collect())
}

fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}
