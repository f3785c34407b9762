//! WordQuiz Core - Thai/English vocabulary quiz in Rust
//!
//! Provides SQLite word storage, word list import, and the multiple-choice
//! quiz engine with its session controller.

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod logging;
pub mod model;
pub mod progress;
pub mod questions;
pub mod session;
pub mod speech;

#[cfg(feature = "python")]
mod python;

pub use config::Config;
pub use db::{SqliteRepository, WordRepository};
pub use error::{VocabError, VocabResult};
pub use import::{parse_csv_file, parse_excel_file, parse_file, parse_import_text};
pub use model::{BulkUpsertSummary, EntryDraft, EntryPatch, Level, LevelCount, VocabularyEntry};
pub use progress::AttemptStats;
pub use questions::{QuizEngine, QuizState};
pub use session::{LevelRequest, QuizController, QuizSnapshot};
pub use speech::{CommandPronouncer, Pronouncer, SilentPronouncer};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// WordQuiz Core Python Module
#[cfg(feature = "python")]
#[pymodule]
fn wordquiz_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    logging::init_tracing(&Config::from_env().log_level);

    // Word management
    m.add_function(wrap_pyfunction!(python::py_list_words, m)?)?;
    m.add_function(wrap_pyfunction!(python::py_add_word, m)?)?;
    m.add_function(wrap_pyfunction!(python::py_update_word, m)?)?;
    m.add_function(wrap_pyfunction!(python::py_delete_word, m)?)?;
    m.add_function(wrap_pyfunction!(python::py_delete_all_words, m)?)?;

    // Import
    m.add_function(wrap_pyfunction!(python::py_import_text, m)?)?;
    m.add_function(wrap_pyfunction!(python::py_import_file, m)?)?;

    // Quiz session
    m.add_class::<python::PyQuizGame>()?;

    Ok(())
}
