//! Configuration and data directory management.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Paths to the KidPulse data directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db_dir: PathBuf,
    /// Classroom attribution config (`data/classrooms.json`).
    pub classrooms_file: PathBuf,
    /// AI backend config (`data/ai-config.json`).
    pub ai_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db_dir: root.join("db"),
            classrooms_file: root.join("classrooms.json"),
            ai_config_file: root.join("ai-config.json"),
            root,
        };
        std::fs::create_dir_all(&paths.db_dir)?;
        Ok(paths)
    }
}

/// Top-level KidPulse configuration.
#[derive(Debug, Clone)]
pub struct KidPulseConfig {
    pub data_paths: DataPaths,
    /// Local timezone every feed timestamp is interpreted in.
    pub timezone: Tz,
    /// Keep raw feed captures next to the database for inspection.
    pub debug: bool,
}

impl KidPulseConfig {
    /// Default timezone, debug off.
    pub fn new(data_paths: DataPaths) -> Self {
        Self {
            data_paths,
            timezone: chrono_tz::America::New_York,
            debug: false,
        }
    }

    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let tz_name = std::env::var("TZ").unwrap_or_else(|_| DEFAULT_TIMEZONE.into());
        let timezone = parse_timezone(&tz_name)?;
        let debug = env_flag("KIDPULSE_DEBUG");
        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            data_paths,
            timezone,
            debug,
        })
    }

    /// Current wall-clock time in the configured timezone.
    pub fn reference_now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::Config(format!("invalid timezone '{}': {}", name, e)))
}

/// Boolean environment flag: `true`, `1`, `yes` and `on` are truthy.
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Which classrooms' caregivers may author events for which child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    /// Lower-cased child name (full or first) to expected classroom ids.
    #[serde(default)]
    pub classrooms: HashMap<String, Vec<String>>,
    /// Every classroom label a staff recorder string may carry.
    #[serde(default = "default_known_labels")]
    pub known_classroom_labels: Vec<String>,
}

fn default_known_labels() -> Vec<String> {
    ["Infant", "Older", "Toddler", "Pre-K", "Preschool"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            classrooms: HashMap::new(),
            known_classroom_labels: default_known_labels(),
        }
    }
}

impl AttributionConfig {
    /// Load from file, falling back to `KIDPULSE_CLASSROOMS` and defaults.
    pub fn load(config_path: &Path) -> Self {
        let from_file: Option<AttributionConfig> = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| match serde_json::from_str(&s) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("Ignoring malformed {}: {}", config_path.display(), e);
                    None
                }
            });

        let mut config = from_file.unwrap_or_default();
        if config.classrooms.is_empty() {
            if let Ok(value) = std::env::var("KIDPULSE_CLASSROOMS") {
                config.classrooms = parse_classroom_map(&value);
            }
        }
        config.classrooms = config
            .classrooms
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();

        if !config.classrooms.is_empty() {
            info!("Loaded classroom attribution for {} children", config.classrooms.len());
        }
        config
    }

    /// Expected classrooms for a child, looked up by full name then first name.
    pub fn expected_classrooms(&self, child_name: &str) -> &[String] {
        let full = child_name.trim().to_lowercase();
        if let Some(rooms) = self.classrooms.get(&full) {
            return rooms;
        }
        full.split_whitespace()
            .next()
            .and_then(|first| self.classrooms.get(first))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn with_child(mut self, child: &str, rooms: &[&str]) -> Self {
        self.classrooms.insert(
            child.trim().to_lowercase(),
            rooms.iter().map(|r| r.to_string()).collect(),
        );
        self
    }
}

/// Parse `Name=Room A,Room B;Other=Room C`.
pub fn parse_classroom_map(value: &str) -> HashMap<String, Vec<String>> {
    value
        .split(';')
        .filter_map(|entry| {
            let (name, rooms) = entry.split_once('=')?;
            let name = name.trim().to_lowercase();
            let rooms: Vec<String> = rooms
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
            if name.is_empty() || rooms.is_empty() {
                None
            } else {
                Some((name, rooms))
            }
        })
        .collect()
}
