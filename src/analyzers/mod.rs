//! Text analyzers consumed by the enrichment pipeline.
//!
//! The pipeline only sees the three capability traits below. Lexicon tables
//! are loaded once per run and shared read-only; every worker builds its own
//! analyzer instances on top of them.

pub mod contractions;
pub mod emotion;
pub mod sentiment;

use anyhow::Result;
use log::info;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub use contractions::Contractions;
pub use emotion::{Emotion, EmotionLexicon, NrcEmotionAnalyzer};
pub use sentiment::{SentimentLexicon, VaderSentimentAnalyzer};

/// Emotion label to occurrence count, highest count first.
pub type EmotionScores = Vec<(Emotion, u32)>;

/// Sentiment dimension to score, in the analyzer's own order.
pub type SentimentScores = Vec<(&'static str, f64)>;

pub trait EmotionAnalyzer: Send {
    fn emotion_scores(&self, text: &str) -> Result<EmotionScores>;
}

pub trait SentimentAnalyzer: Send {
    fn polarity_scores(&self, text: &str) -> Result<SentimentScores>;
}

pub trait ContractionExpander: Send {
    fn expand(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed lexicon '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("lexicon '{path}' line {line}: {message}")]
    Entry {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

/// Lexicon tables shared by every worker of a run.
#[derive(Debug, Clone)]
pub struct Lexicons {
    pub emotion: Arc<EmotionLexicon>,
    pub sentiment: Arc<SentimentLexicon>,
}

impl Lexicons {
    /// Loads lexicon files where given and falls back to the built-in tables otherwise.
    pub fn load(emotion: Option<&Path>, sentiment: Option<&Path>) -> Result<Self, LexiconError> {
        let emotion = match emotion {
            Some(path) => EmotionLexicon::from_path(path)?,
            None => EmotionLexicon::builtin(),
        };
        let sentiment = match sentiment {
            Some(path) => SentimentLexicon::from_path(path)?,
            None => SentimentLexicon::builtin(),
        };
        info!(
            "Lexicons ready: {} emotion words, {} sentiment tokens",
            emotion.len(),
            sentiment.len()
        );
        Ok(Self {
            emotion: Arc::new(emotion),
            sentiment: Arc::new(sentiment),
        })
    }
}

/// Opens a tab-separated lexicon file. Quoting is disabled since lexicon tokens may contain `"`.
pub(crate) fn tsv_reader(path: &Path) -> Result<csv::Reader<File>, LexiconError> {
    let file = File::open(path).map_err(|source| LexiconError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(file))
}
