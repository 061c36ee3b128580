//! Loading and schema checking of the registration data file.

use std::path::Path;

use serde_json::error::Category;
use tracing::{debug, info};

use super::RegistrationRecord;
use crate::error::{Error, Result};

/// Rules every record must satisfy before it reaches the grouping stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    /// Exact number of ASCII digits in a verification code.
    pub code_length: usize,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self { code_length: 4 }
    }
}

impl RecordSchema {
    /// Create a schema expecting codes of `code_length` digits.
    #[must_use]
    pub fn new(code_length: usize) -> Self {
        Self { code_length }
    }

    /// Check one record, describing the first violation found.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the violation.
    pub fn check(&self, record: &RegistrationRecord) -> std::result::Result<(), String> {
        if record.school.trim().is_empty() {
            return Err("\"sekolah\" must not be empty".to_string());
        }
        if record.pdf_file.trim().is_empty() {
            return Err(format!("\"pdf_file\" of {:?} must not be empty", record.school));
        }
        if record.companions.len() != record.verification_codes.len() {
            return Err(format!(
                "{:?} lists {} companions but {} verification codes",
                record.school,
                record.companions.len(),
                record.verification_codes.len()
            ));
        }
        for (name, code) in record.companions.iter().zip(&record.verification_codes) {
            if !self.is_valid_code(code) {
                return Err(format!(
                    "verification code {code:?} for {name:?} is not {} digits",
                    self.code_length
                ));
            }
        }
        Ok(())
    }

    /// Whether `code` is exactly `code_length` ASCII digits.
    #[must_use]
    pub fn is_valid_code(&self, code: &str) -> bool {
        code.len() == self.code_length && code.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Read, parse and validate the data file at `path`.
///
/// Either every record is returned or the call fails; there is no partial
/// result.
///
/// # Errors
///
/// Returns [`Error::DataRead`] if the file cannot be read,
/// [`Error::DataParse`] if it is not well-formed JSON, and
/// [`Error::DataSchema`] if it does not match the record schema.
pub fn load_records(path: impl AsRef<Path>, schema: &RecordSchema) -> Result<Vec<RegistrationRecord>> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading data file");

    let text = std::fs::read_to_string(path).map_err(|source| Error::DataRead {
        path: path.to_path_buf(),
        source,
    })?;

    let records = parse_records(path, &text, schema)?;
    info!(path = %path.display(), records = records.len(), "Loaded registration data");
    Ok(records)
}

/// Parse and validate data file contents. `path` is only used in errors.
///
/// # Errors
///
/// Returns [`Error::DataParse`] for malformed JSON and [`Error::DataSchema`]
/// for well-formed JSON that does not match the record schema.
pub fn parse_records(
    path: &Path,
    text: &str,
    schema: &RecordSchema,
) -> Result<Vec<RegistrationRecord>> {
    let records: Vec<RegistrationRecord> =
        serde_json::from_str(text).map_err(|source| match source.classify() {
            Category::Data => Error::schema(path, source.to_string()),
            Category::Io | Category::Syntax | Category::Eof => Error::DataParse {
                path: path.to_path_buf(),
                source,
            },
        })?;

    for (index, record) in records.iter().enumerate() {
        schema
            .check(record)
            .map_err(|message| Error::schema(path, format!("record {index}: {message}")))?;
    }

    Ok(records)
}
