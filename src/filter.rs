use log::{debug, warn};
use thiserror::Error;

use crate::record::Record;

/// Records with fewer words than this skip the analyzers but are still written out.
pub const MIN_WORD_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("blank line")]
    Blank,
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("missing or empty text")]
    MissingText,
    #[error("analyzer failure: {0}")]
    AnalyzerFailure(String),
}

/// What became of one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Kept(Record),
    Dropped(DropReason),
}

/// The decision for a parsed line before any analyzer has run.
#[derive(Debug, PartialEq)]
pub enum Screened {
    /// Long enough to go through the analyzer pipeline.
    Enrich(Record),
    /// Kept exactly as parsed.
    Bypass(Record),
    Drop(DropReason),
}

/// Parses and validates one raw line. `line_number` is the 1-based position in the input file.
pub fn screen(line: &str, line_number: usize, min_word_count: usize) -> Screened {
    if line.trim().is_empty() {
        return Screened::Drop(DropReason::Blank);
    }

    let record = match Record::parse(line) {
        Ok(record) => record,
        Err(e) => {
            warn!("Error decoding JSON on line {}: {} ({})", line_number, line, e);
            return Screened::Drop(DropReason::Malformed(e.to_string()));
        }
    };

    // Absent, empty or non-string text all drop the record.
    if record.text().is_none() {
        debug!("Skipping line {}: missing or empty text", line_number);
        return Screened::Drop(DropReason::MissingText);
    }

    if record.word_count() < min_word_count {
        Screened::Bypass(record)
    } else {
        Screened::Enrich(record)
    }
}
