//! Multiple-choice quiz engine for one level's word pool
//!
//! The engine owns the pool, picks the next unanswered word, builds up to four
//! translation options and records correct answers. It never touches storage;
//! the session controller feeds it a pool fetched from the repository.

use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

use crate::model::{Level, VocabularyEntry};
use crate::speech::{Pronouncer, SilentPronouncer};

/// Maximum number of wrong options shown next to the correct one
pub const DISTRACTOR_COUNT: usize = 3;

/// Externally observable phase of a quiz session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizState {
    /// No level selected yet
    Init,
    /// Selected level has no words
    EmptyLevel,
    InProgress,
    /// Every word of the pool was answered correctly
    Complete,
}

/// Quiz state for one level's pool, driven by an injected random source
pub struct QuizEngine<R: Rng = ThreadRng> {
    level: Option<Level>,
    pool: Vec<VocabularyEntry>,
    completed: Vec<String>,
    current: Option<usize>,
    options: Vec<String>,
    rng: R,
    pronouncer: Box<dyn Pronouncer>,
}

impl QuizEngine<ThreadRng> {
    /// Engine backed by the thread-local RNG
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for QuizEngine<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> QuizEngine<R> {
    /// Engine with no level selected, using `rng` for every random pick
    pub fn with_rng(rng: R) -> Self {
        Self {
            level: None,
            pool: Vec::new(),
            completed: Vec::new(),
            current: None,
            options: Vec::new(),
            rng,
            pronouncer: Box::new(SilentPronouncer),
        }
    }

    /// Replace the silent default with a speech backend
    pub fn with_pronouncer(mut self, pronouncer: Box<dyn Pronouncer>) -> Self {
        self.pronouncer = pronouncer;
        self
    }

    /// Start a fresh session on `pool` and move to the first question
    pub fn select_level(&mut self, level: Level, pool: Vec<VocabularyEntry>) {
        self.level = Some(level);
        self.pool = pool;
        self.completed.clear();
        self.advance();
    }

    /// Pick the next unanswered word and build its options
    pub fn advance(&mut self) {
        let done: HashSet<&str> = self.completed.iter().map(String::as_str).collect();
        let available: Vec<usize> = (0..self.pool.len())
            .filter(|&i| !done.contains(self.pool[i].english.as_str()))
            .collect();

        let Some(&index) = available.choose(&mut self.rng) else {
            self.current = None;
            self.options.clear();
            return;
        };

        let target = &self.pool[index];
        let correct = target.thai.clone();

        // whole pool, completed words included, duplicates kept
        let mut distractors: Vec<String> = self
            .pool
            .iter()
            .filter(|w| w.thai != correct)
            .map(|w| w.thai.clone())
            .collect();
        distractors.shuffle(&mut self.rng);
        distractors.truncate(DISTRACTOR_COUNT);

        let mut options = Vec::with_capacity(distractors.len() + 1);
        options.push(correct);
        options.extend(distractors);
        options.shuffle(&mut self.rng);

        self.current = Some(index);
        self.options = options;
        self.pronouncer.speak(&target.english);
    }

    /// Check `choice` against the current word. A correct answer completes the
    /// word and advances; a wrong one leaves everything as it was.
    pub fn submit_answer(&mut self, choice: &str) -> bool {
        let Some(index) = self.current else {
            return false;
        };

        let word = &self.pool[index];
        if choice != word.thai {
            return false;
        }

        if !self.completed.iter().any(|e| e == &word.english) {
            self.completed.push(word.english.clone());
        }
        self.advance();
        true
    }

    /// Clear progress and start over on the same pool
    pub fn restart(&mut self) {
        self.completed.clear();
        self.advance();
    }

    /// Current phase; empty level and complete both have no current word
    pub fn state(&self) -> QuizState {
        match (self.level, self.current) {
            (None, _) => QuizState::Init,
            (Some(_), Some(_)) => QuizState::InProgress,
            (Some(_), None) if self.pool.is_empty() => QuizState::EmptyLevel,
            (Some(_), None) => QuizState::Complete,
        }
    }

    /// Selected level, `None` before the first `select_level`
    pub fn level(&self) -> Option<Level> {
        self.level
    }

    /// Word being asked, if any
    pub fn current(&self) -> Option<&VocabularyEntry> {
        self.current.map(|i| &self.pool[i])
    }

    /// Translations offered for the current word, in display order
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// English words answered correctly, in the order they were completed
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    /// Size of the level pool
    pub fn total_words(&self) -> usize {
        self.pool.len()
    }

    /// Every word loaded for the level
    pub fn pool(&self) -> &[VocabularyEntry] {
        &self.pool
    }

    /// Correct translation of the current word
    pub fn show_answer(&self) -> Option<&str> {
        self.current().map(|w| w.thai.as_str())
    }

    /// Pronounce the current word again
    pub fn speak_current(&self) {
        if let Some(word) = self.current() {
            self.pronouncer.speak(&word.english);
        }
    }
}
