//! Word list import: pasted text, CSV and Excel files

use calamine::{open_workbook, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

use crate::error::{VocabError, VocabResult};
use crate::model::{EntryDraft, Level};

/// Parse file (text, CSV or Excel) into drafts tagged with `level`
pub fn parse_file<P: AsRef<Path>>(file_path: P, level: Level) -> VocabResult<Vec<EntryDraft>> {
    let path = file_path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| VocabError::Import(format!("Failed to read {}: {}", path.display(), e)))?;
            Ok(parse_import_text(&text, level))
        }
        "csv" => parse_csv_file(path, level),
        "xlsx" | "xls" => parse_excel_file(path, level),
        _ => Err(VocabError::Validation(format!("Unsupported file format: .{}", extension))),
    }
}

/// One `english,thai` pair per line. Lines missing either field are skipped,
/// extra columns are ignored.
pub fn parse_import_text(text: &str, level: Level) -> Vec<EntryDraft> {
    text.trim()
        .lines()
        .filter_map(|line| {
            let mut parts = line.split(',').map(str::trim);
            let english = parts.next().unwrap_or("");
            let thai = parts.next().unwrap_or("");
            if english.is_empty() || thai.is_empty() {
                None
            } else {
                Some(EntryDraft::new(english, thai, level))
            }
        })
        .collect()
}

/// Column index mapping
#[derive(Debug, Default, Clone)]
struct ColumnMapping {
    english: usize,
    thai: usize,
    level: Option<usize>,
    category: Option<usize>,
}

/// Detect column indices from header names
fn detect_columns(headers: &[String]) -> VocabResult<ColumnMapping> {
    let mut english = None;
    let mut thai = None;
    let mut mapping = ColumnMapping::default();

    for (i, header) in headers.iter().enumerate() {
        match header.to_lowercase().trim() {
            "english" | "word" | "words" | "vocabulary" => english = english.or(Some(i)),
            "thai" | "meaning" | "translation" => thai = thai.or(Some(i)),
            "level" | "cefr" => mapping.level = Some(i),
            "category" => mapping.category = Some(i),
            _ => {}
        }
    }

    mapping.english = english
        .ok_or_else(|| VocabError::Import("Missing required 'English' column in file header".to_string()))?;
    mapping.thai = thai
        .ok_or_else(|| VocabError::Import("Missing required 'Thai' column in file header".to_string()))?;
    Ok(mapping)
}

/// Build a draft from one row of cells; `None` when a required cell is blank
fn draft_from_cells(cells: &[String], mapping: &ColumnMapping, default_level: Level) -> Option<EntryDraft> {
    let cell = |i: usize| cells.get(i).map(|s| s.trim()).unwrap_or("");

    let english = cell(mapping.english);
    let thai = cell(mapping.thai);
    if english.is_empty() || thai.is_empty() {
        return None;
    }

    let level = mapping
        .level
        .and_then(|i| cell(i).parse::<Level>().ok())
        .unwrap_or(default_level);
    let category = mapping.category.map(cell).unwrap_or("");

    Some(EntryDraft::new(english, thai, level).with_category(category))
}

/// Parse a CSV file with a header row
pub fn parse_csv_file<P: AsRef<Path>>(file_path: P, level: Level) -> VocabResult<Vec<EntryDraft>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(file_path.as_ref())
        .map_err(|e| VocabError::Import(format!("Failed to open CSV file: {}", e)))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| VocabError::Import(format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mapping = detect_columns(&headers)?;

    let mut drafts = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| VocabError::Import(format!("Failed to read CSV row: {}", e)))?;
        let cells: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        if let Some(draft) = draft_from_cells(&cells, &mapping, level) {
            drafts.push(draft);
        }
    }

    debug!(path = %file_path.as_ref().display(), count = drafts.len(), "parsed CSV import");
    Ok(drafts)
}

/// Parse the first sheet of an Excel workbook with a header row
pub fn parse_excel_file<P: AsRef<Path>>(file_path: P, level: Level) -> VocabResult<Vec<EntryDraft>> {
    let mut workbook: Xlsx<_> = open_workbook(file_path.as_ref())
        .map_err(|e| VocabError::Import(format!("Failed to open Excel file: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| VocabError::Import("No sheets found in Excel file".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| VocabError::Import(format!("Failed to read sheet: {}", e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| VocabError::Import("Empty file - no header row".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(get_cell_string).collect();
    let mapping = detect_columns(&headers)?;

    let drafts: Vec<EntryDraft> = rows
        .filter_map(|row| {
            let cells: Vec<String> = row.iter().map(get_cell_string).collect();
            draft_from_cells(&cells, &mapping, level)
        })
        .collect();

    debug!(path = %file_path.as_ref().display(), count = drafts.len(), "parsed Excel import");
    Ok(drafts)
}

/// Helper to extract string from Excel cell
fn get_cell_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn text_import_skips_incomplete_lines() {
        let text = "cat, แมว\n\ndog,\n,นก\nfish,ปลา,extra\n  bird , นก  ";
        let drafts = parse_import_text(text, Level::A2);

        let pairs: Vec<(&str, &str)> = drafts
            .iter()
            .map(|d| (d.english.as_str(), d.thai.as_str()))
            .collect();
        assert_eq!(pairs, vec![("cat", "แมว"), ("fish", "ปลา"), ("bird", "นก")]);
        assert!(drafts.iter().all(|d| d.level == Level::A2 && d.category.is_empty()));
    }

    #[test]
    fn text_import_of_blank_input_is_empty() {
        assert!(parse_import_text("   \n  ", Level::A1).is_empty());
    }

    #[test]
    fn csv_import_detects_headers_and_row_levels() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Category,English,Thai,Level").unwrap();
        writeln!(file, "animals,cat,แมว,").unwrap();
        writeln!(file, "verbs,negotiate,เจรจา,b2").unwrap();
        writeln!(file, "animals,dog,,A1").unwrap();
        file.flush().unwrap();

        let drafts = parse_file(file.path(), Level::A1).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].category, "animals");
        assert_eq!(drafts[0].level, Level::A1);
        assert_eq!(drafts[1].english, "negotiate");
        assert_eq!(drafts[1].level, Level::B2);
    }

    #[test]
    fn csv_import_requires_english_and_thai_columns() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "word,synonyms").unwrap();
        writeln!(file, "cat,feline").unwrap();
        file.flush().unwrap();

        let err = parse_csv_file(file.path(), Level::A1).unwrap_err();
        assert!(matches!(err, VocabError::Import(_)));
    }

    #[test]
    fn txt_files_use_line_format() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "cat,แมว").unwrap();
        writeln!(file, "dog,สุนัข").unwrap();
        file.flush().unwrap();

        assert_eq!(parse_file(file.path(), Level::C2).unwrap().len(), 2);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = parse_file("words.json", Level::A1).unwrap_err();
        assert!(matches!(err, VocabError::Validation(_)));
    }
}
