use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{tsv_reader, EmotionAnalyzer, EmotionScores, LexiconError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Fear,
    Anger,
    Anticipation,
    Trust,
    Surprise,
    Positive,
    Negative,
    Sadness,
    Disgust,
    Joy,
}

impl Emotion {
    pub const ALL: [Emotion; 10] = [
        Emotion::Fear,
        Emotion::Anger,
        Emotion::Anticipation,
        Emotion::Trust,
        Emotion::Surprise,
        Emotion::Positive,
        Emotion::Negative,
        Emotion::Sadness,
        Emotion::Disgust,
        Emotion::Joy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Fear => "fear",
            Emotion::Anger => "anger",
            Emotion::Anticipation => "anticipation",
            Emotion::Trust => "trust",
            Emotion::Surprise => "surprise",
            Emotion::Positive => "positive",
            Emotion::Negative => "negative",
            Emotion::Sadness => "sadness",
            Emotion::Disgust => "disgust",
            Emotion::Joy => "joy",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|emotion| emotion.as_str() == label)
    }
}

use Emotion::*;

// Abridged word-level association table; emotions per word follow the
// alphabetical order of the NRC word-level file.
const BUILTIN: &[(&str, &[Emotion])] = &[
    ("abandon", &[Fear, Negative, Sadness]),
    ("abuse", &[Anger, Disgust, Fear, Negative, Sadness]),
    ("accident", &[Fear, Negative, Sadness, Surprise]),
    ("achieve", &[Joy, Positive, Trust]),
    ("admire", &[Positive, Trust]),
    ("afraid", &[Fear, Negative]),
    ("alone", &[Negative, Sadness]),
    ("amazing", &[Joy, Positive, Surprise]),
    ("anger", &[Anger, Negative]),
    ("angry", &[Anger, Disgust, Negative]),
    ("anxiety", &[Anger, Anticipation, Fear, Negative, Sadness]),
    ("awful", &[Anger, Disgust, Fear, Negative, Sadness]),
    ("bad", &[Anger, Disgust, Fear, Negative, Sadness]),
    ("beautiful", &[Joy, Positive]),
    ("believe", &[Trust]),
    ("betray", &[Anger, Disgust, Negative, Sadness, Surprise]),
    ("birthday", &[Anticipation, Joy, Positive, Surprise]),
    ("bless", &[Anticipation, Joy, Positive, Trust]),
    ("broken", &[Anger, Fear, Negative, Sadness]),
    ("calm", &[Positive]),
    ("celebrate", &[Anticipation, Joy, Positive]),
    ("celebration", &[Anticipation, Joy, Positive, Surprise]),
    ("cheer", &[Joy, Positive, Surprise, Trust]),
    ("confident", &[Joy, Positive, Trust]),
    ("crash", &[Fear, Negative, Sadness, Surprise]),
    ("cry", &[Negative, Sadness]),
    ("danger", &[Fear, Negative]),
    ("death", &[Anger, Anticipation, Disgust, Fear, Negative, Sadness, Surprise]),
    ("delight", &[Anticipation, Joy, Positive]),
    ("depressed", &[Anger, Fear, Negative, Sadness]),
    ("despair", &[Anger, Disgust, Fear, Negative, Sadness]),
    ("disaster", &[Anger, Disgust, Fear, Negative, Sadness, Surprise]),
    ("disgusting", &[Anger, Disgust, Fear, Negative]),
    ("excited", &[Anticipation, Joy, Positive, Surprise]),
    ("fail", &[Disgust, Fear, Negative, Sadness]),
    ("failure", &[Disgust, Fear, Negative, Sadness]),
    ("fear", &[Anger, Fear, Negative]),
    (
        "feeling",
        &[Anger, Anticipation, Disgust, Fear, Joy, Negative, Positive, Sadness, Surprise, Trust],
    ),
    ("friend", &[Joy, Positive, Trust]),
    ("friendly", &[Anticipation, Joy, Positive, Trust]),
    ("fun", &[Anticipation, Joy, Positive]),
    ("gift", &[Anticipation, Joy, Positive, Surprise]),
    ("glad", &[Joy, Positive]),
    ("good", &[Anticipation, Joy, Positive, Surprise, Trust]),
    ("grateful", &[Positive]),
    ("grief", &[Negative, Sadness]),
    ("guilty", &[Anger, Negative, Sadness]),
    ("happiness", &[Anticipation, Joy, Positive]),
    ("happy", &[Anticipation, Joy, Positive, Trust]),
    ("hate", &[Anger, Disgust, Fear, Negative, Sadness]),
    ("hope", &[Anticipation, Joy, Positive, Surprise, Trust]),
    ("horrible", &[Anger, Disgust, Fear, Negative]),
    ("hurt", &[Anger, Fear, Negative, Sadness]),
    ("kill", &[Fear, Negative, Sadness]),
    ("laugh", &[Joy, Positive, Surprise]),
    ("lonely", &[Anger, Disgust, Fear, Negative, Sadness]),
    ("lose", &[Anger, Disgust, Fear, Negative, Sadness, Surprise]),
    ("love", &[Joy, Positive]),
    ("lucky", &[Joy, Positive, Surprise]),
    ("mad", &[Anger, Disgust, Fear, Negative, Sadness]),
    ("miserable", &[Anger, Disgust, Negative, Sadness]),
    ("nervous", &[Anticipation, Fear, Negative]),
    ("pain", &[Fear, Negative, Sadness]),
    ("panic", &[Fear, Negative]),
    ("peace", &[Anticipation, Joy, Positive, Trust]),
    ("perfect", &[Anticipation, Joy, Positive, Trust]),
    ("pleasant", &[Anticipation, Joy, Positive, Surprise, Trust]),
    ("proud", &[Anticipation, Joy, Positive, Trust]),
    ("rage", &[Anger, Negative]),
    ("sad", &[Negative, Sadness]),
    ("scared", &[Fear, Negative, Surprise]),
    ("shock", &[Anger, Fear, Negative, Surprise]),
    ("sick", &[Disgust, Negative, Sadness]),
    ("smile", &[Joy, Positive, Surprise, Trust]),
    ("sorrow", &[Negative, Sadness]),
    ("sorry", &[Negative, Sadness]),
    ("success", &[Anticipation, Joy, Positive]),
    ("surprise", &[Fear, Joy, Positive, Surprise]),
    ("terrible", &[Anger, Disgust, Fear, Negative, Sadness]),
    ("terror", &[Fear, Negative]),
    ("thank", &[Positive]),
    ("thrilled", &[Anticipation, Joy, Positive, Surprise]),
    ("trust", &[Trust]),
    ("ugly", &[Disgust, Negative]),
    ("unhappy", &[Anger, Disgust, Negative, Sadness]),
    ("victory", &[Anticipation, Joy, Positive, Trust]),
    ("win", &[Anticipation, Joy, Positive, Surprise, Trust]),
    ("wonderful", &[Joy, Positive, Surprise, Trust]),
    ("worry", &[Anticipation, Fear, Negative, Sadness]),
    ("wrong", &[Negative]),
];

/// Word to associated emotions.
#[derive(Debug, Clone, Default)]
pub struct EmotionLexicon {
    words: HashMap<String, Vec<Emotion>>,
}

impl EmotionLexicon {
    pub fn builtin() -> Self {
        let words = BUILTIN
            .iter()
            .map(|(word, emotions)| (word.to_string(), emotions.to_vec()))
            .collect();
        Self { words }
    }

    /// Reads an NRC word-level file: `word<TAB>emotion<TAB>0|1`, one association per line.
    /// Only rows flagged `1` are kept; an emotion outside the fixed vocabulary is an error.
    pub fn from_path(path: &Path) -> Result<Self, LexiconError> {
        let mut reader = tsv_reader(path)?;
        let mut lexicon = Self::default();
        for row in reader.records() {
            let row = row.map_err(|source| LexiconError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let line = row.position().map_or(0, |p| p.line());
            let entry_error = |message: String| LexiconError::Entry {
                path: path.to_path_buf(),
                line,
                message,
            };
            if row.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let (Some(word), Some(label), Some(flag)) = (row.get(0), row.get(1), row.get(2)) else {
                return Err(entry_error(format!("expected 3 columns, found {}", row.len())));
            };
            match flag.trim() {
                "0" => continue,
                "1" => {}
                other => return Err(entry_error(format!("association flag '{}' is not 0 or 1", other))),
            }
            let emotion = Emotion::from_label(label.trim())
                .ok_or_else(|| entry_error(format!("unknown emotion '{}'", label.trim())))?;
            lexicon.add(word.trim(), emotion);
        }
        Ok(lexicon)
    }

    fn add(&mut self, word: &str, emotion: Emotion) {
        let emotions = self.words.entry(word.to_lowercase()).or_default();
        if !emotions.contains(&emotion) {
            emotions.push(emotion);
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Looks a token up as given, then as a naive singular.
    fn lookup(&self, token: &str) -> Option<&[Emotion]> {
        if let Some(emotions) = self.words.get(token) {
            return Some(emotions.as_slice());
        }
        ["es", "s"]
            .iter()
            .filter_map(|suffix| token.strip_suffix(suffix))
            .filter(|stem| stem.len() > 2)
            .find_map(|stem| self.words.get(stem))
            .map(Vec::as_slice)
    }
}

/// Counts lexicon hits per emotion.
pub struct NrcEmotionAnalyzer {
    lexicon: Arc<EmotionLexicon>,
}

impl NrcEmotionAnalyzer {
    pub fn new(lexicon: Arc<EmotionLexicon>) -> Self {
        Self { lexicon }
    }
}

impl EmotionAnalyzer for NrcEmotionAnalyzer {
    fn emotion_scores(&self, text: &str) -> Result<EmotionScores> {
        let lowered = text.to_lowercase();
        let mut scores: EmotionScores = Vec::new();
        for token in word_tokens(&lowered) {
            let Some(emotions) = self.lexicon.lookup(token) else {
                continue;
            };
            for emotion in emotions {
                match scores.iter_mut().find(|(seen, _)| seen == emotion) {
                    Some((_, count)) => *count += 1,
                    None => scores.push((*emotion, 1)),
                }
            }
        }
        // Stable: equal counts stay in first-encountered order.
        scores.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(scores)
    }
}

fn word_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
        .map(|token| token.trim_matches(|c| c == '\'' || c == '’'))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn analyzer() -> NrcEmotionAnalyzer {
        NrcEmotionAnalyzer::new(Arc::new(EmotionLexicon::builtin()))
    }

    #[test]
    fn counts_are_sorted_descending_with_stable_ties() {
        // "happy" yields anticipation, joy, positive, trust; "sad" adds negative, sadness;
        // "love" bumps joy and positive to 2.
        let scores = analyzer().emotion_scores("Happy, sad... and in LOVE").unwrap();
        assert_eq!(
            scores,
            vec![
                (Joy, 2),
                (Positive, 2),
                (Anticipation, 1),
                (Trust, 1),
                (Negative, 1),
                (Sadness, 1),
            ]
        );
    }

    #[test]
    fn unknown_words_give_empty_scores() {
        assert!(analyzer().emotion_scores("the quick brown fox jumps").unwrap().is_empty());
    }

    #[test]
    fn plural_forms_fall_back_to_singular() {
        let scores = analyzer().emotion_scores("so many gifts").unwrap();
        assert_eq!(scores.len(), 4);
        assert!(scores.iter().all(|(_, count)| *count == 1));
    }

    #[test]
    fn every_builtin_label_is_in_the_vocabulary() {
        for (_, emotions) in BUILTIN {
            for emotion in *emotions {
                assert_eq!(Emotion::from_label(emotion.as_str()), Some(*emotion));
            }
        }
    }

    #[test]
    fn loads_nrc_word_level_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gleeful\tjoy\t1").unwrap();
        writeln!(file, "gleeful\tsadness\t0").unwrap();
        writeln!(file, "gleeful\tpositive\t1").unwrap();
        writeln!(file, "gloom\tsadness\t1").unwrap();
        let lexicon = EmotionLexicon::from_path(file.path()).unwrap();
        assert_eq!(lexicon.len(), 2);

        let scores = NrcEmotionAnalyzer::new(Arc::new(lexicon))
            .emotion_scores("gleeful not gloom")
            .unwrap();
        assert_eq!(scores, vec![(Joy, 1), (Positive, 1), (Sadness, 1)]);
    }

    #[test]
    fn rejects_labels_outside_the_vocabulary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "meh\tboredom\t1").unwrap();
        let err = EmotionLexicon::from_path(file.path()).unwrap_err();
        assert!(matches!(err, LexiconError::Entry { .. }));
        assert!(err.to_string().contains("boredom"));
    }
}
