//! Vocabulary data model: CEFR levels, stored entries, drafts and patches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{VocabError, VocabResult};

/// CEFR proficiency level, easiest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    pub const ALL: [Level; 6] = [Level::A1, Level::A2, Level::B1, Level::B2, Level::C1, Level::C2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A1" => Ok(Level::A1),
            "A2" => Ok(Level::A2),
            "B1" => Ok(Level::B1),
            "B2" => Ok(Level::B2),
            "C1" => Ok(Level::C1),
            "C2" => Ok(Level::C2),
            other => Err(VocabError::Validation(format!("invalid level '{}'", other))),
        }
    }
}

/// Word entry as stored in the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub id: Option<i64>,
    pub english: String,
    pub thai: String,
    pub level: Level,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VocabularyEntry {
    /// Unsaved entry, mostly useful for building quiz pools by hand
    pub fn new(english: &str, thai: &str, level: Level) -> Self {
        Self {
            id: None,
            english: english.to_string(),
            thai: thai.to_string(),
            level,
            category: String::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Entry that has not been persisted yet (create, bulk upsert, import)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub english: String,
    pub thai: String,
    pub level: Level,
    #[serde(default)]
    pub category: String,
}

impl EntryDraft {
    pub fn new(english: &str, thai: &str, level: Level) -> Self {
        Self {
            english: english.trim().to_string(),
            thai: thai.trim().to_string(),
            level,
            category: String::new(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.trim().to_string();
        self
    }

    /// Copy with surrounding whitespace removed, rejecting blank required fields
    pub fn validated(&self) -> VocabResult<EntryDraft> {
        Ok(EntryDraft {
            english: required("english", &self.english)?,
            thai: required("thai", &self.thai)?,
            level: self.level,
            category: self.category.trim().to_string(),
        })
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    pub english: Option<String>,
    pub thai: Option<String>,
    pub level: Option<Level>,
    pub category: Option<String>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.english.is_none() && self.thai.is_none() && self.level.is_none() && self.category.is_none()
    }

    /// Apply onto a stored entry, validating the patched fields
    pub fn apply_to(&self, entry: &VocabularyEntry) -> VocabResult<VocabularyEntry> {
        let mut updated = entry.clone();
        if let Some(english) = &self.english {
            updated.english = required("english", english)?;
        }
        if let Some(thai) = &self.thai {
            updated.thai = required("thai", thai)?;
        }
        if let Some(level) = self.level {
            updated.level = level;
        }
        if let Some(category) = &self.category {
            updated.category = category.trim().to_string();
        }
        Ok(updated)
    }
}

/// Outcome counts of a bulk upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpsertSummary {
    pub inserted: usize,
    pub modified: usize,
    pub matched: usize,
}

/// Number of stored words for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCount {
    pub level: Level,
    pub word_count: usize,
}

fn required(field: &str, value: &str) -> VocabResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VocabError::Validation(format!("'{}' is required", field)));
    }
    Ok(trimmed.to_string())
}
