use serde::Serialize;
use std::fmt;

use super::csv_files::FileKind;
use crate::database::models::UpsertOutcome;

/// Why a data row was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipReason {
    /// 1-based data row number
    pub row: usize,
    /// Human-readable reason
    pub reason: String,
}

/// Counts for one imported file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// File name
    pub file: &'static str,
    /// Rows that created a record
    pub created: usize,
    /// Rows that changed a stored record
    pub updated: usize,
    /// Rows that matched what was already stored
    pub unchanged: usize,
    /// Rows that were skipped, with reasons
    pub skipped: Vec<SkipReason>,
}

impl FileSummary {
    pub fn new(kind: FileKind) -> Self {
        Self {
            file: kind.file_name(),
            created: 0,
            updated: 0,
            unchanged: 0,
            skipped: Vec::new(),
        }
    }

    /// Count one applied row
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Count one skipped row
    pub fn skip(&mut self, row: usize, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("{} row {}: skipped, {}", self.file, row, reason);
        self.skipped.push(SkipReason { row, reason });
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Whether any row created or changed a record
    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0
    }
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} created, {} updated, {} unchanged, {} skipped",
            self.file,
            self.created,
            self.updated,
            self.unchanged,
            self.skipped.len()
        )?;
        for skip in &self.skipped {
            write!(f, "\n  row {}: {}", skip.row, skip.reason)?;
        }
        Ok(())
    }
}

/// Summary of an importer run, one entry per processed file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub files: Vec<FileSummary>,
}

impl ImportSummary {
    /// Summary of the given file, if it was processed
    pub fn file(&self, kind: FileKind) -> Option<&FileSummary> {
        self.files.iter().find(|file| file.file == kind.file_name())
    }

    /// Whether any file created or changed a record
    pub fn has_changes(&self) -> bool {
        self.files.iter().any(FileSummary::has_changes)
    }

    pub fn total_created(&self) -> usize {
        self.files.iter().map(|file| file.created).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.files.iter().map(|file| file.updated).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.files.iter().map(FileSummary::skipped_count).sum()
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{}", file)?;
        }
        write!(
            f,
            "Total: {} created, {} updated, {} skipped",
            self.total_created(),
            self.total_updated(),
            self.total_skipped()
        )
    }
}
