//! Rule-based polarity scoring in the style of VADER.
//!
//! Each token takes its valence from the lexicon, adjusted by preceding booster
//! words, ALL-CAPS emphasis and negation. The per-token valences are then
//! summed into a normalized `compound` score and split into `neg`/`neu`/`pos`
//! proportions.

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{tsv_reader, LexiconError, SentimentAnalyzer, SentimentScores};

const BOOSTER_INCREMENT: f64 = 0.293;
const BOOSTER_DECREMENT: f64 = -0.293;
const CAPS_INCREMENT: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZATION_ALPHA: f64 = 15.0;

const BUILTIN: &[(&str, f64)] = &[
    ("afraid", -2.2),
    ("amazing", 2.8),
    ("angry", -2.3),
    ("annoyed", -1.6),
    ("awesome", 3.1),
    ("awful", -2.0),
    ("bad", -2.5),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("boring", -1.3),
    ("broken", -2.0),
    ("calm", 1.3),
    ("cry", -2.1),
    ("death", -2.9),
    ("delight", 2.9),
    ("disappointed", -1.9),
    ("disaster", -3.1),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("excellent", 2.7),
    ("excited", 1.4),
    ("fail", -2.5),
    ("failure", -2.3),
    ("fear", -2.2),
    ("fun", 2.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("grateful", 2.0),
    ("great", 3.1),
    ("happy", 2.7),
    ("hate", -2.7),
    ("hated", -3.2),
    ("hope", 1.9),
    ("horrible", -2.5),
    ("hurt", -2.4),
    ("kill", -3.7),
    ("laugh", 2.6),
    ("like", 2.0),
    ("lonely", -1.5),
    ("love", 3.2),
    ("loved", 2.9),
    ("lucky", 1.8),
    ("miserable", -2.5),
    ("nervous", -1.1),
    ("nice", 1.8),
    ("no", -1.2),
    ("ok", 1.2),
    ("okay", 0.9),
    ("pain", -2.3),
    ("peace", 2.5),
    ("perfect", 2.7),
    ("proud", 2.1),
    ("sad", -2.1),
    ("scared", -1.9),
    ("sick", -1.7),
    ("smile", 1.5),
    ("sorry", -0.3),
    ("stupid", -2.4),
    ("success", 2.7),
    ("terrible", -2.1),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("thrilled", 2.6),
    ("ugly", -2.3),
    ("upset", -1.6),
    ("win", 2.8),
    ("wonderful", 2.7),
    ("worry", -1.9),
    ("worst", -3.1),
];

const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOSTER_INCREMENT),
    ("amazingly", BOOSTER_INCREMENT),
    ("awfully", BOOSTER_INCREMENT),
    ("completely", BOOSTER_INCREMENT),
    ("deeply", BOOSTER_INCREMENT),
    ("enormously", BOOSTER_INCREMENT),
    ("entirely", BOOSTER_INCREMENT),
    ("especially", BOOSTER_INCREMENT),
    ("exceptionally", BOOSTER_INCREMENT),
    ("extremely", BOOSTER_INCREMENT),
    ("greatly", BOOSTER_INCREMENT),
    ("highly", BOOSTER_INCREMENT),
    ("hugely", BOOSTER_INCREMENT),
    ("incredibly", BOOSTER_INCREMENT),
    ("intensely", BOOSTER_INCREMENT),
    ("most", BOOSTER_INCREMENT),
    ("particularly", BOOSTER_INCREMENT),
    ("quite", BOOSTER_INCREMENT),
    ("really", BOOSTER_INCREMENT),
    ("remarkably", BOOSTER_INCREMENT),
    ("so", BOOSTER_INCREMENT),
    ("totally", BOOSTER_INCREMENT),
    ("tremendously", BOOSTER_INCREMENT),
    ("truly", BOOSTER_INCREMENT),
    ("utterly", BOOSTER_INCREMENT),
    ("very", BOOSTER_INCREMENT),
    ("almost", BOOSTER_DECREMENT),
    ("barely", BOOSTER_DECREMENT),
    ("hardly", BOOSTER_DECREMENT),
    ("kinda", BOOSTER_DECREMENT),
    ("less", BOOSTER_DECREMENT),
    ("little", BOOSTER_DECREMENT),
    ("marginally", BOOSTER_DECREMENT),
    ("occasionally", BOOSTER_DECREMENT),
    ("partly", BOOSTER_DECREMENT),
    ("scarcely", BOOSTER_DECREMENT),
    ("slightly", BOOSTER_DECREMENT),
    ("somewhat", BOOSTER_DECREMENT),
    ("sorta", BOOSTER_DECREMENT),
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "didnt", "doesnt", "dont", "hadnt", "hasnt",
    "havent", "isnt", "neither", "never", "none", "nope", "nor", "not", "nothing", "nowhere",
    "rarely", "seldom", "shouldnt", "wasnt", "werent", "without", "wont", "wouldnt",
];

/// Token to mean valence.
#[derive(Debug, Clone, Default)]
pub struct SentimentLexicon {
    valences: HashMap<String, f64>,
}

impl SentimentLexicon {
    pub fn builtin() -> Self {
        let valences = BUILTIN
            .iter()
            .map(|(token, valence)| (token.to_string(), *valence))
            .collect();
        Self { valences }
    }

    /// Reads a VADER lexicon file: `token<TAB>mean<TAB>...`; trailing columns are ignored.
    pub fn from_path(path: &Path) -> Result<Self, LexiconError> {
        let mut reader = tsv_reader(path)?;
        let mut valences = HashMap::new();
        for row in reader.records() {
            let row = row.map_err(|source| LexiconError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let line = row.position().map_or(0, |p| p.line());
            let (Some(token), Some(mean)) = (row.get(0), row.get(1)) else {
                if row.iter().all(|field| field.trim().is_empty()) {
                    continue;
                }
                return Err(LexiconError::Entry {
                    path: path.to_path_buf(),
                    line,
                    message: format!("expected at least 2 columns, found {}", row.len()),
                });
            };
            let mean: f64 = mean.trim().parse().map_err(|_| LexiconError::Entry {
                path: path.to_path_buf(),
                line,
                message: format!("valence '{}' is not a number", mean.trim()),
            })?;
            if !mean.is_finite() {
                return Err(LexiconError::Entry {
                    path: path.to_path_buf(),
                    line,
                    message: format!("valence '{}' is not finite", mean),
                });
            }
            valences.insert(token.trim().to_lowercase(), mean);
        }
        Ok(Self { valences })
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    fn valence(&self, token: &str) -> Option<f64> {
        self.valences.get(token).copied()
    }
}

pub struct VaderSentimentAnalyzer {
    lexicon: Arc<SentimentLexicon>,
    boosters: HashMap<&'static str, f64>,
}

impl VaderSentimentAnalyzer {
    pub fn new(lexicon: Arc<SentimentLexicon>) -> Self {
        Self {
            lexicon,
            boosters: BOOSTERS.iter().copied().collect(),
        }
    }

    fn token_valence(&self, tokens: &[Token], index: usize, caps_differential: bool) -> f64 {
        let token = &tokens[index];
        if self.boosters.contains_key(token.lower.as_str()) {
            return 0.0;
        }
        let Some(mut valence) = self.lexicon.valence(&token.lower) else {
            return 0.0;
        };
        if token.shouting && caps_differential {
            valence += CAPS_INCREMENT.copysign(valence);
        }
        for distance in 1..=3 {
            let Some(preceding) = index.checked_sub(distance).map(|i| &tokens[i]) else {
                break;
            };
            if self.lexicon.valence(&preceding.lower).is_some() {
                continue;
            }
            let damping = match distance {
                1 => 1.0,
                2 => 0.95,
                _ => 0.9,
            };
            valence += self.booster_scalar(preceding, valence, caps_differential) * damping;
            if is_negation(&preceding.lower) {
                valence *= NEGATION_SCALAR;
            }
        }
        valence
    }

    fn booster_scalar(&self, token: &Token, valence: f64, caps_differential: bool) -> f64 {
        let Some(&base) = self.boosters.get(token.lower.as_str()) else {
            return 0.0;
        };
        let mut scalar = if valence < 0.0 { -base } else { base };
        if token.shouting && caps_differential {
            scalar += if valence < 0.0 { -CAPS_INCREMENT } else { CAPS_INCREMENT };
        }
        scalar
    }
}

impl SentimentAnalyzer for VaderSentimentAnalyzer {
    fn polarity_scores(&self, text: &str) -> Result<SentimentScores> {
        let tokens = tokenize(text);
        let shouting = tokens.iter().filter(|token| token.shouting).count();
        let caps_differential = shouting > 0 && shouting < tokens.len();

        let mut valences: Vec<f64> = (0..tokens.len())
            .map(|index| self.token_valence(&tokens, index, caps_differential))
            .collect();

        if let Some(pivot) = tokens.iter().position(|token| token.lower == "but") {
            for (index, valence) in valences.iter_mut().enumerate() {
                if index < pivot {
                    *valence *= 0.5;
                } else if index > pivot {
                    *valence *= 1.5;
                }
            }
        }

        Ok(summarize(&valences, punctuation_emphasis(text)))
    }
}

struct Token {
    lower: String,
    shouting: bool,
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .map(|raw| {
            let stripped = raw.trim_matches(|c: char| c.is_ascii_punctuation());
            // Short tokens such as ":)" keep their punctuation.
            let word = if stripped.chars().count() <= 2 { raw } else { stripped };
            Token {
                lower: word.to_lowercase().replace('’', "'"),
                shouting: is_shouting(word),
            }
        })
        .collect()
}

fn is_shouting(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

fn is_negation(lower: &str) -> bool {
    lower.contains("n't") || NEGATIONS.contains(&lower)
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * 0.292;
    let questions = match text.matches('?').count() {
        0 | 1 => 0.0,
        n @ 2..=3 => n as f64 * 0.18,
        _ => 0.96,
    };
    exclamations + questions
}

fn summarize(valences: &[f64], emphasis: f64) -> SentimentScores {
    if valences.is_empty() {
        return vec![("neg", 0.0), ("neu", 0.0), ("pos", 0.0), ("compound", 0.0)];
    }

    let mut total: f64 = valences.iter().sum();
    if total > 0.0 {
        total += emphasis;
    } else if total < 0.0 {
        total -= emphasis;
    }
    let compound = (total / (total * total + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0);

    let mut positive = 0.0;
    let mut negative = 0.0;
    let mut neutral = 0.0;
    for &valence in valences {
        if valence > 0.0 {
            positive += valence + 1.0;
        } else if valence < 0.0 {
            negative += valence - 1.0;
        } else {
            neutral += 1.0;
        }
    }
    if positive > negative.abs() {
        positive += emphasis;
    } else if positive < negative.abs() {
        negative -= emphasis;
    }
    let magnitude = positive + negative.abs() + neutral;

    vec![
        ("neg", round_to(negative.abs() / magnitude, 3)),
        ("neu", round_to(neutral / magnitude, 3)),
        ("pos", round_to(positive / magnitude, 3)),
        ("compound", round_to(compound, 4)),
    ]
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
