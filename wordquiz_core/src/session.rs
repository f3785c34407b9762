//! Quiz session controller
//!
//! Ties the repository to the quiz engine: loads a level's pool, forwards
//! answers and restarts, and publishes a [`QuizSnapshot`] to observers after
//! every command. Level loads are tagged with a ticket so that a response for
//! an older request never overwrites a newer one.

use rand::rngs::ThreadRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::WordRepository;
use crate::error::VocabResult;
use crate::model::{Level, VocabularyEntry};
use crate::progress::AttemptStats;
use crate::questions::{QuizEngine, QuizState};

/// Message shown when a level could not be loaded
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load vocabulary words";

/// Everything a presentation layer needs to render the game
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSnapshot {
    pub level: Level,
    #[serde(rename = "currentWord")]
    pub current: Option<VocabularyEntry>,
    pub options: Vec<String>,
    #[serde(rename = "completedWords")]
    pub completed: Vec<String>,
    pub total_words: usize,
    pub is_loading: bool,
    pub error: Option<String>,
    pub state: QuizState,
    pub stats: AttemptStats,
}

impl QuizSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Pending level load issued by [`QuizController::begin_level`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRequest {
    ticket: u64,
    level: Level,
}

impl LevelRequest {
    pub fn level(&self) -> Level {
        self.level
    }
}

type Observer = Box<dyn FnMut(&QuizSnapshot)>;

/// Session controller owning the repository, the engine and the published state
pub struct QuizController<P: WordRepository, R: Rng = ThreadRng> {
    repository: P,
    engine: QuizEngine<R>,
    level: Level,
    is_loading: bool,
    error: Option<String>,
    stats: AttemptStats,
    latest_ticket: u64,
    observers: Vec<Observer>,
}

impl<P: WordRepository> QuizController<P, ThreadRng> {
    /// Controller over `repository` with an unseeded engine
    pub fn new(repository: P) -> Self {
        Self::with_engine(repository, QuizEngine::new())
    }
}

impl<P: WordRepository, R: Rng> QuizController<P, R> {
    /// Controller over `repository` driving a preconfigured engine
    pub fn with_engine(repository: P, engine: QuizEngine<R>) -> Self {
        Self {
            repository,
            engine,
            level: Level::default(),
            is_loading: false,
            error: None,
            stats: AttemptStats::default(),
            latest_ticket: 0,
            observers: Vec::new(),
        }
    }

    /// Register a callback invoked with every published snapshot
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&QuizSnapshot) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Load `level` from the repository and start a new session on it.
    /// Returns false when the load failed; the previous session stays in place
    /// and the snapshot carries an error message.
    pub fn set_level(&mut self, level: Level) -> bool {
        let request = self.begin_level(level);
        let result = self.repository.list(Some(level));
        let ok = result.is_ok();
        self.complete_level(request, result);
        ok
    }

    /// Same as [`set_level`](Self::set_level)
    pub fn change_level(&mut self, level: Level) -> bool {
        self.set_level(level)
    }

    /// Mark a load of `level` as in flight. Any earlier outstanding request
    /// becomes stale.
    pub fn begin_level(&mut self, level: Level) -> LevelRequest {
        self.latest_ticket += 1;
        self.is_loading = true;
        self.error = None;
        self.publish();
        LevelRequest {
            ticket: self.latest_ticket,
            level,
        }
    }

    /// Apply the repository response for `request`. Responses to anything but
    /// the most recent request are dropped; returns whether it was applied.
    pub fn complete_level(
        &mut self,
        request: LevelRequest,
        result: VocabResult<Vec<VocabularyEntry>>,
    ) -> bool {
        if request.ticket != self.latest_ticket {
            debug!(
                level = %request.level,
                ticket = request.ticket,
                latest = self.latest_ticket,
                "discarding stale level response"
            );
            return false;
        }

        self.is_loading = false;
        match result {
            Ok(pool) => {
                info!(level = %request.level, words = pool.len(), "loaded quiz level");
                self.level = request.level;
                self.error = None;
                self.stats.reset();
                self.engine.select_level(request.level, pool);
            }
            Err(e) => {
                warn!(level = %request.level, error = %e, "failed to load quiz level");
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        self.publish();
        true
    }

    /// Forward an answer to the engine and tally it; false with no current word
    pub fn submit_answer(&mut self, choice: &str) -> bool {
        if self.engine.current().is_none() {
            return false;
        }
        let is_correct = self.engine.submit_answer(choice);
        self.stats.record(is_correct);
        self.publish();
        is_correct
    }

    /// Start the current level over with a fresh tally
    pub fn restart(&mut self) {
        self.stats.reset();
        self.engine.restart();
        self.publish();
    }

    /// Correct translation of the current word
    pub fn show_answer(&self) -> Option<&str> {
        self.engine.show_answer()
    }

    /// Pronounce the current word again
    pub fn speak_current(&self) {
        self.engine.speak_current();
    }

    /// State as seen by observers
    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            level: self.level,
            current: self.engine.current().cloned(),
            options: self.engine.options().to_vec(),
            completed: self.engine.completed().to_vec(),
            total_words: self.engine.total_words(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            state: self.engine.state(),
            stats: self.stats,
        }
    }

    /// Underlying quiz engine
    pub fn engine(&self) -> &QuizEngine<R> {
        &self.engine
    }

    /// Injected repository
    pub fn repository(&self) -> &P {
        &self.repository
    }

    /// Mutable access to the injected repository
    pub fn repository_mut(&mut self) -> &mut P {
        &mut self.repository
    }

    /// Give the repository back, e.g. to close it
    pub fn into_repository(self) -> P {
        self.repository
    }

    fn publish(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in self.observers.iter_mut() {
            observer(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteRepository;
    use crate::error::VocabError;
    use crate::model::{BulkUpsertSummary, EntryDraft, EntryPatch};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// In-memory repository whose list call can be switched to fail
    struct FlakyRepository {
        inner: SqliteRepository,
        failing: Cell<bool>,
    }

    impl WordRepository for FlakyRepository {
        fn list(&self, level: Option<Level>) -> VocabResult<Vec<VocabularyEntry>> {
            if self.failing.get() {
                return Err(VocabError::Transport(rusqlite::Error::InvalidQuery));
            }
            self.inner.list(level)
        }
        fn get(&self, id: i64) -> VocabResult<VocabularyEntry> {
            self.inner.get(id)
        }
        fn create(&self, draft: &EntryDraft) -> VocabResult<VocabularyEntry> {
            self.inner.create(draft)
        }
        fn update(&self, id: i64, patch: &EntryPatch) -> VocabResult<VocabularyEntry> {
            self.inner.update(id, patch)
        }
        fn delete(&self, id: i64) -> VocabResult<VocabularyEntry> {
            self.inner.delete(id)
        }
        fn delete_all(&self) -> VocabResult<usize> {
            self.inner.delete_all()
        }
        fn bulk_upsert(&self, drafts: &[EntryDraft]) -> VocabResult<BulkUpsertSummary> {
            self.inner.bulk_upsert(drafts)
        }
    }

    fn seeded_repository() -> FlakyRepository {
        let inner = SqliteRepository::open_in_memory().unwrap();
        inner
            .bulk_upsert(&[
                EntryDraft::new("cat", "แมว", Level::A1),
                EntryDraft::new("dog", "สุนัข", Level::A1),
                EntryDraft::new("bird", "นก", Level::A1),
                EntryDraft::new("fish", "ปลา", Level::A1),
                EntryDraft::new("negotiate", "เจรจา", Level::B2),
            ])
            .unwrap();
        FlakyRepository {
            inner,
            failing: Cell::new(false),
        }
    }

    fn controller() -> QuizController<FlakyRepository, StdRng> {
        QuizController::with_engine(
            seeded_repository(),
            QuizEngine::with_rng(StdRng::seed_from_u64(7)),
        )
    }

    #[test]
    fn set_level_loads_pool_and_starts_session() {
        let mut controller = controller();
        assert_eq!(controller.snapshot().state, QuizState::Init);

        assert!(controller.set_level(Level::A1));
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.level, Level::A1);
        assert_eq!(snapshot.total_words, 4);
        assert_eq!(snapshot.options.len(), 4);
        assert!(!snapshot.is_loading);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.state, QuizState::InProgress);
    }

    #[test]
    fn empty_level_is_distinct_from_complete() {
        let mut controller = controller();
        controller.set_level(Level::C2);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, QuizState::EmptyLevel);
        assert_eq!(snapshot.total_words, 0);
        assert!(snapshot.current.is_none());
    }

    #[test]
    fn failed_load_keeps_previous_session_and_sets_error() {
        let mut controller = controller();
        controller.set_level(Level::A1);
        let before = controller.snapshot();

        controller.repository().failing.set(true);
        assert!(!controller.set_level(Level::B2));

        let after = controller.snapshot();
        assert_eq!(after.error.as_deref(), Some(LOAD_ERROR_MESSAGE));
        assert!(!after.is_loading);
        assert_eq!(after.level, Level::A1);
        assert_eq!(after.current, before.current);
        assert_eq!(after.total_words, 4);

        controller.repository().failing.set(false);
        assert!(controller.set_level(Level::B2));
        assert!(controller.snapshot().error.is_none());
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut controller = controller();
        let first = controller.begin_level(Level::A1);
        let second = controller.begin_level(Level::B2);

        let b2 = controller.repository().list(Some(Level::B2));
        assert!(controller.complete_level(second, b2));

        let a1 = controller.repository().list(Some(Level::A1));
        assert!(!controller.complete_level(first, a1));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.level, Level::B2);
        assert_eq!(snapshot.total_words, 1);
        assert!(!snapshot.is_loading);
    }

    #[test]
    fn outstanding_newer_request_keeps_loading_flag() {
        let mut controller = controller();
        let first = controller.begin_level(Level::A1);
        let _second = controller.begin_level(Level::B2);

        let a1 = controller.repository().list(Some(Level::A1));
        assert!(!controller.complete_level(first, a1));
        assert!(controller.snapshot().is_loading);
        assert_eq!(controller.snapshot().state, QuizState::Init);
    }

    #[test]
    fn answers_update_completion_and_stats() {
        let mut controller = controller();
        controller.set_level(Level::A1);

        assert!(!controller.submit_answer("wrong"));
        let answer = controller.show_answer().unwrap().to_string();
        assert!(controller.submit_answer(&answer));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.completed.len(), 1);
        assert_eq!(snapshot.stats.total_attempts, 2);
        assert_eq!(snapshot.stats.correct_count, 1);
    }

    #[test]
    fn restart_after_completion_starts_fresh() {
        let mut controller = controller();
        controller.set_level(Level::A1);
        while let Some(answer) = controller.show_answer().map(str::to_string) {
            controller.submit_answer(&answer);
        }
        assert_eq!(controller.snapshot().state, QuizState::Complete);
        assert!(!controller.submit_answer("แมว"));

        controller.restart();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, QuizState::InProgress);
        assert!(snapshot.completed.is_empty());
        assert_eq!(snapshot.stats, AttemptStats::default());
    }

    #[test]
    fn observers_see_every_published_snapshot() {
        let seen: Rc<RefCell<Vec<QuizSnapshot>>> = Rc::default();
        let sink = seen.clone();

        let mut controller = controller();
        controller.subscribe(move |s| sink.borrow_mut().push(s.clone()));

        controller.set_level(Level::A1);
        {
            let seen = seen.borrow();
            assert_eq!(seen.len(), 2);
            assert!(seen[0].is_loading);
            assert!(!seen[1].is_loading);
        }

        let answer = controller.show_answer().unwrap().to_string();
        controller.submit_answer(&answer);
        controller.restart();
        assert_eq!(seen.borrow().len(), 4);
    }

    #[test]
    fn snapshot_json_uses_game_state_field_names() {
        let mut controller = controller();
        controller.set_level(Level::A1);
        let json: serde_json::Value =
            serde_json::from_str(&controller.snapshot().to_json().unwrap()).unwrap();

        assert_eq!(json["level"], "A1");
        assert_eq!(json["totalWords"], 4);
        assert_eq!(json["isLoading"], false);
        assert_eq!(json["state"], "in_progress");
        assert!(json["currentWord"]["english"].is_string());
        assert!(json["completedWords"].as_array().unwrap().is_empty());
    }
}
