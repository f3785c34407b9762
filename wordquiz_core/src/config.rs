//! Environment-driven settings

use std::path::PathBuf;
use tracing::warn;

use crate::model::Level;
use crate::speech::{CommandPronouncer, Pronouncer, SilentPronouncer};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
    pub default_level: Level,
    pub tts_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("wordquiz.db"),
            log_level: "info".to_string(),
            default_level: Level::A1,
            tts_command: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("WORDQUIZ_DB")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let log_level = lookup("RUST_LOG").unwrap_or(defaults.log_level);

        let default_level = match lookup("WORDQUIZ_LEVEL") {
            Some(value) => value.parse::<Level>().unwrap_or_else(|_| {
                warn!(value = %value, "ignoring invalid WORDQUIZ_LEVEL");
                defaults.default_level
            }),
            None => defaults.default_level,
        };

        let tts_command = lookup("WORDQUIZ_TTS").filter(|v| !v.trim().is_empty());

        Self {
            db_path,
            log_level,
            default_level,
            tts_command,
        }
    }

    pub fn pronouncer(&self) -> Box<dyn Pronouncer> {
        match self.tts_command.as_deref().and_then(CommandPronouncer::from_command_line) {
            Some(tts) => Box::new(tts),
            None => Box::new(SilentPronouncer),
        }
    }
}
