//! Reading and writing formula lists.
//!
//! Lists are written in a length-prefixed format:
//!
//! ```text
//! % mathmemo-list v2
//! 7
//! x^2 + 1
//! ```
//!
//! Each formula is its byte length on a line of its own, the formula bytes,
//! then a newline, so any text survives a round trip. Files without the
//! header are read in the older `\[formula\]` format.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

pub const LIST_HEADER: &str = "% mathmemo-list v2";

const LEGACY_OPEN: &str = "\\[";
const LEGACY_CLOSE: &str = "\\]\n";
const LEGACY_DELIMITER: &str = "\\]\n\\[";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed list at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("Formula {index} contains the legacy delimiter and cannot be written in the legacy format")]
    Unrepresentable { index: usize },
}

pub fn load_file(path: &Path) -> Result<Vec<String>, PersistError> {
    let content = fs::read_to_string(path).map_err(|source| PersistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let formulas = parse_list(&content)?;
    info!("Loaded {} formulas from {}", formulas.len(), path.display());
    Ok(formulas)
}

/// Parses either format, picking by the header line.
pub fn parse_list(content: &str) -> Result<Vec<String>, PersistError> {
    match content.strip_prefix(LIST_HEADER) {
        Some(rest) => parse_current(rest),
        None => {
            debug!("No list header, reading legacy format");
            Ok(parse_legacy(content))
        }
    }
}

fn parse_current(body: &str) -> Result<Vec<String>, PersistError> {
    let mut formulas = Vec::new();
    let mut rest = body
        .strip_prefix('\n')
        .or_else(|| body.is_empty().then_some(body))
        .ok_or_else(|| PersistError::Malformed {
            line: 1,
            reason: "text after header".to_string(),
        })?;
    let mut line = 2;

    while !rest.is_empty() {
        let (count, after) = rest.split_once('\n').ok_or_else(|| PersistError::Malformed {
            line,
            reason: "missing length line".to_string(),
        })?;
        let len: usize = count.trim().parse().map_err(|_| PersistError::Malformed {
            line,
            reason: format!("bad length {:?}", count),
        })?;
        let formula = after.get(..len).ok_or_else(|| PersistError::Malformed {
            line: line + 1,
            reason: format!("formula shorter than {} bytes", len),
        })?;
        rest = after[len..]
            .strip_prefix('\n')
            .ok_or_else(|| PersistError::Malformed {
                line: line + 1,
                reason: "formula not followed by a newline".to_string(),
            })?;
        line += 2 + formula.matches('\n').count();
        formulas.push(formula.to_string());
    }
    Ok(formulas)
}

/// Reads the older format: every formula as `\[formula\]` plus a newline.
/// Empty formulas are skipped.
pub fn parse_legacy(content: &str) -> Vec<String> {
    let mut parts: Vec<&str> = content.split(LEGACY_DELIMITER).collect();
    if let Some(first) = parts.first_mut() {
        *first = first.strip_prefix(LEGACY_OPEN).unwrap_or(first);
    }
    if let Some(last) = parts.last_mut() {
        *last = last.strip_suffix(LEGACY_CLOSE).unwrap_or(last);
    }
    parts
        .into_iter()
        .filter(|formula| !formula.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn save_file(formulas: &[String], path: &Path) -> Result<(), PersistError> {
    let content = to_list_text(formulas);
    fs::write(path, content).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved {} formulas to {}", formulas.len(), path.display());
    Ok(())
}

pub fn to_list_text(formulas: &[String]) -> String {
    let mut out = String::from(LIST_HEADER);
    out.push('\n');
    for formula in formulas {
        out.push_str(&formula.len().to_string());
        out.push('\n');
        out.push_str(formula);
        out.push('\n');
    }
    out
}

/// Writes the older format. Formulas containing its delimiter would not
/// read back, so they are refused.
pub fn to_legacy_text(formulas: &[String]) -> Result<String, PersistError> {
    let mut out = String::new();
    for (index, formula) in formulas.iter().enumerate() {
        if formula.contains(LEGACY_DELIMITER) {
            return Err(PersistError::Unrepresentable { index });
        }
        out.push_str(LEGACY_OPEN);
        out.push_str(formula);
        out.push_str(LEGACY_CLOSE);
    }
    Ok(out)
}
