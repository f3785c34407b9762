//! Python bindings (feature `python`)

use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::db::{SqliteRepository, WordRepository};
use crate::error::VocabError;
use crate::import::{parse_file, parse_import_text};
use crate::model::{EntryDraft, EntryPatch, Level};
use crate::questions::QuizEngine;
use crate::session::QuizController;
use crate::speech::{CommandPronouncer, Pronouncer, SilentPronouncer};

fn to_py_err(e: VocabError) -> PyErr {
    match e {
        VocabError::NotFound(_) => PyKeyError::new_err(e.to_string()),
        VocabError::Conflict(_) | VocabError::Validation(_) | VocabError::Import(_) => {
            PyValueError::new_err(e.to_string())
        }
        VocabError::Transport(_) => PyRuntimeError::new_err(e.to_string()),
    }
}

fn json_err(e: serde_json::Error) -> PyErr {
    PyRuntimeError::new_err(e.to_string())
}

fn parse_level(level: &str) -> PyResult<Level> {
    level.parse::<Level>().map_err(to_py_err)
}

fn open(db_path: &str) -> PyResult<SqliteRepository> {
    SqliteRepository::open(db_path).map_err(to_py_err)
}

/// Quiz session bound to one database file
#[pyclass(unsendable, name = "QuizGame")]
pub struct PyQuizGame {
    inner: QuizController<SqliteRepository>,
}

#[pymethods]
impl PyQuizGame {
    #[new]
    #[pyo3(signature = (db_path, tts_command=None))]
    fn new(db_path: &str, tts_command: Option<&str>) -> PyResult<Self> {
        let pronouncer: Box<dyn Pronouncer> = match tts_command.and_then(CommandPronouncer::from_command_line) {
            Some(tts) => Box::new(tts),
            None => Box::new(SilentPronouncer),
        };
        let engine = QuizEngine::new().with_pronouncer(pronouncer);
        Ok(Self {
            inner: QuizController::with_engine(open(db_path)?, engine),
        })
    }

    fn set_level(&mut self, level: &str) -> PyResult<bool> {
        Ok(self.inner.set_level(parse_level(level)?))
    }

    fn submit_answer(&mut self, choice: &str) -> bool {
        self.inner.submit_answer(choice)
    }

    fn restart(&mut self) {
        self.inner.restart();
    }

    fn show_answer(&self) -> Option<String> {
        self.inner.show_answer().map(str::to_string)
    }

    fn speak(&self) {
        self.inner.speak_current();
    }

    fn snapshot_json(&self) -> PyResult<String> {
        self.inner.snapshot().to_json().map_err(json_err)
    }

    fn __repr__(&self) -> String {
        let snapshot = self.inner.snapshot();
        format!(
            "QuizGame(level='{}', completed={}/{})",
            snapshot.level,
            snapshot.completed.len(),
            snapshot.total_words
        )
    }
}

#[pyfunction]
#[pyo3(name = "list_words", signature = (db_path, level=None))]
pub fn py_list_words(db_path: &str, level: Option<&str>) -> PyResult<String> {
    let level = level.map(parse_level).transpose()?;
    let words = open(db_path)?.list(level).map_err(to_py_err)?;
    serde_json::to_string(&words).map_err(json_err)
}

#[pyfunction]
#[pyo3(name = "add_word", signature = (db_path, english, thai, level, category=""))]
pub fn py_add_word(db_path: &str, english: &str, thai: &str, level: &str, category: &str) -> PyResult<i64> {
    let draft = EntryDraft::new(english, thai, parse_level(level)?).with_category(category);
    let entry = open(db_path)?.create(&draft).map_err(to_py_err)?;
    entry
        .id
        .ok_or_else(|| PyRuntimeError::new_err("created entry has no id"))
}

#[pyfunction]
#[pyo3(name = "update_word", signature = (db_path, word_id, english=None, thai=None, level=None, category=None))]
pub fn py_update_word(
    db_path: &str,
    word_id: i64,
    english: Option<String>,
    thai: Option<String>,
    level: Option<&str>,
    category: Option<String>,
) -> PyResult<String> {
    let patch = EntryPatch {
        english,
        thai,
        level: level.map(parse_level).transpose()?,
        category,
    };
    let entry = open(db_path)?.update(word_id, &patch).map_err(to_py_err)?;
    serde_json::to_string(&entry).map_err(json_err)
}

#[pyfunction]
#[pyo3(name = "delete_word")]
pub fn py_delete_word(db_path: &str, word_id: i64) -> PyResult<()> {
    open(db_path)?.delete(word_id).map(|_| ()).map_err(to_py_err)
}

#[pyfunction]
#[pyo3(name = "delete_all_words")]
pub fn py_delete_all_words(db_path: &str) -> PyResult<usize> {
    open(db_path)?.delete_all().map_err(to_py_err)
}

#[pyfunction]
#[pyo3(name = "import_text")]
pub fn py_import_text(db_path: &str, text: &str, level: &str) -> PyResult<(usize, usize, usize)> {
    let drafts = parse_import_text(text, parse_level(level)?);
    let summary = open(db_path)?.bulk_upsert(&drafts).map_err(to_py_err)?;
    Ok((summary.inserted, summary.modified, summary.matched))
}

#[pyfunction]
#[pyo3(name = "import_file")]
pub fn py_import_file(db_path: &str, file_path: &str, level: &str) -> PyResult<(usize, usize, usize)> {
    let drafts = parse_file(file_path, parse_level(level)?).map_err(to_py_err)?;
    let summary = open(db_path)?.bulk_upsert(&drafts).map_err(to_py_err)?;
    Ok((summary.inserted, summary.modified, summary.matched))
}
