//! Ordered enrichment stages applied to one record.
//!
//! Scoring stages always read the text exactly as it arrived. Rewrite stages
//! run after every scoring stage has finished, whatever order the stages were
//! registered in.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Number, Value};

use crate::analyzers::{
    Contractions, ContractionExpander, EmotionAnalyzer, Lexicons, NrcEmotionAnalyzer,
    SentimentAnalyzer, VaderSentimentAnalyzer,
};
use crate::record::{Record, TEXT_FIELD};

pub const EMOTION_FIELD: &str = "emotion_scores";
pub const SENTIMENT_FIELD: &str = "vader_emotion_scores";

/// Reads the original text and produces the value stored under `field()`.
pub trait ScoringStage: Send {
    fn field(&self) -> &str;
    fn score(&self, text: &str) -> Result<Value>;
}

/// Produces a new `text` from the current one.
pub trait RewriteStage: Send {
    fn name(&self) -> &str;
    fn rewrite(&self, text: &str) -> Result<String>;
}

pub struct EmotionStage<A>(pub A);

impl<A: EmotionAnalyzer> ScoringStage for EmotionStage<A> {
    fn field(&self) -> &str {
        EMOTION_FIELD
    }

    fn score(&self, text: &str) -> Result<Value> {
        let scores = self.0.emotion_scores(text)?;
        let map: Map<String, Value> = scores
            .into_iter()
            .map(|(emotion, count)| (emotion.as_str().to_string(), Value::from(count)))
            .collect();
        Ok(Value::Object(map))
    }
}

pub struct SentimentStage<A> {
    analyzer: A,
    field: String,
}

impl<A: SentimentAnalyzer> SentimentStage<A> {
    pub fn new(analyzer: A, field: impl Into<String>) -> Self {
        Self {
            analyzer,
            field: field.into(),
        }
    }
}

impl<A: SentimentAnalyzer> ScoringStage for SentimentStage<A> {
    fn field(&self) -> &str {
        &self.field
    }

    fn score(&self, text: &str) -> Result<Value> {
        let mut map = Map::new();
        for (dimension, score) in self.analyzer.polarity_scores(text)? {
            let number = Number::from_f64(score)
                .ok_or_else(|| anyhow!("{} score for '{}' is not finite", self.field, dimension))?;
            map.insert(dimension.to_string(), Value::Number(number));
        }
        Ok(Value::Object(map))
    }
}

pub struct ExpansionStage<E>(pub E);

impl<E: ContractionExpander> RewriteStage for ExpansionStage<E> {
    fn name(&self) -> &str {
        "contraction expansion"
    }

    fn rewrite(&self, text: &str) -> Result<String> {
        self.0.expand(text)
    }
}

enum Stage {
    Score(Box<dyn ScoringStage>),
    Rewrite(Box<dyn RewriteStage>),
}

#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn score(mut self, stage: impl ScoringStage + 'static) -> Self {
        self.stages.push(Stage::Score(Box::new(stage)));
        self
    }

    pub fn rewrite(mut self, stage: impl RewriteStage + 'static) -> Self {
        self.stages.push(Stage::Rewrite(Box::new(stage)));
        self
    }

    /// Splits the registered stages into scorers and rewriters, each keeping
    /// its registration order. Scorers may not write `text` or share a field.
    pub fn build(self) -> Result<AnalyzerPipeline> {
        let mut scorers: Vec<Box<dyn ScoringStage>> = Vec::new();
        let mut rewriters = Vec::new();
        for stage in self.stages {
            match stage {
                Stage::Score(stage) => {
                    let field = stage.field();
                    if field == TEXT_FIELD {
                        bail!("scoring stages may not write the '{}' field", TEXT_FIELD);
                    }
                    if scorers.iter().any(|existing| existing.field() == field) {
                        bail!("more than one scoring stage writes '{}'", field);
                    }
                    scorers.push(stage);
                }
                Stage::Rewrite(stage) => rewriters.push(stage),
            }
        }
        Ok(AnalyzerPipeline { scorers, rewriters })
    }
}

pub struct AnalyzerPipeline {
    scorers: Vec<Box<dyn ScoringStage>>,
    rewriters: Vec<Box<dyn RewriteStage>>,
}

impl AnalyzerPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Emotion scores, VADER polarity, then contraction expansion.
    pub fn standard(lexicons: &Lexicons) -> Result<Self> {
        Self::builder()
            .score(EmotionStage(NrcEmotionAnalyzer::new(lexicons.emotion.clone())))
            .score(SentimentStage::new(
                VaderSentimentAnalyzer::new(lexicons.sentiment.clone()),
                SENTIMENT_FIELD,
            ))
            .rewrite(ExpansionStage(Contractions::new()?))
            .build()
    }

    /// Enriches a record. Either every stage succeeds and the record gains all
    /// fields, or an error is returned and the record is left to the caller to drop.
    pub fn run(&self, mut record: Record) -> Result<Record> {
        let original = record
            .text()
            .ok_or_else(|| anyhow!("record has no text to analyze"))?
            .to_string();

        let mut scores = Vec::with_capacity(self.scorers.len());
        for stage in &self.scorers {
            let value = stage
                .score(&original)
                .with_context(|| format!("scoring stage '{}' failed", stage.field()))?;
            scores.push((stage.field(), value));
        }

        let mut text = original;
        for stage in &self.rewriters {
            text = stage
                .rewrite(&text)
                .with_context(|| format!("rewrite stage '{}' failed", stage.name()))?;
        }

        for (field, value) in scores {
            record.insert(field, value);
        }
        record.set_text(text);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::Lexicons;
    use std::sync::Arc;

    struct Replace(&'static str);

    impl RewriteStage for Replace {
        fn name(&self) -> &str {
            "replace"
        }

        fn rewrite(&self, _text: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Echo(&'static str);

    impl ScoringStage for Echo {
        fn field(&self) -> &str {
            self.0
        }

        fn score(&self, text: &str) -> Result<Value> {
            Ok(Value::String(text.to_string()))
        }
    }

    struct Failing;

    impl ScoringStage for Failing {
        fn field(&self) -> &str {
            "broken"
        }

        fn score(&self, _text: &str) -> Result<Value> {
            bail!("lexicon exploded")
        }
    }

    fn lexicons() -> Lexicons {
        Lexicons::load(None, None).unwrap()
    }

    #[test]
    fn scoring_sees_the_contracted_text() {
        let lexicons = lexicons();
        let contracted = "I can't believe it's happening and I'm thrilled";
        let record = Record::parse(&format!(r#"{{"text":"{}"}}"#, contracted)).unwrap();

        let enriched = AnalyzerPipeline::standard(&lexicons).unwrap().run(record).unwrap();
        let output = serde_json::to_value(&enriched).unwrap();

        let emotion = EmotionStage(NrcEmotionAnalyzer::new(lexicons.emotion.clone()));
        let sentiment = SentimentStage::new(
            VaderSentimentAnalyzer::new(Arc::clone(&lexicons.sentiment)),
            SENTIMENT_FIELD,
        );
        assert_eq!(output[EMOTION_FIELD], emotion.score(contracted).unwrap());
        assert_eq!(output[SENTIMENT_FIELD], sentiment.score(contracted).unwrap());
        assert_eq!(
            output[TEXT_FIELD],
            "I cannot believe it is happening and I am thrilled"
        );
    }

    #[test]
    fn rewrite_registered_first_still_runs_after_scoring() {
        let pipeline = AnalyzerPipeline::builder()
            .rewrite(Replace("rewritten"))
            .score(Echo("seen"))
            .build()
            .unwrap();
        let record = Record::parse(r#"{"text":"original words"}"#).unwrap();
        let output = serde_json::to_value(pipeline.run(record).unwrap()).unwrap();
        assert_eq!(output["seen"], "original words");
        assert_eq!(output[TEXT_FIELD], "rewritten");
    }

    #[test]
    fn rewrites_chain_in_registration_order() {
        struct Append(&'static str);
        impl RewriteStage for Append {
            fn name(&self) -> &str {
                "append"
            }
            fn rewrite(&self, text: &str) -> Result<String> {
                Ok(format!("{}{}", text, self.0))
            }
        }
        let pipeline = AnalyzerPipeline::builder()
            .rewrite(Append("-a"))
            .rewrite(Append("-b"))
            .build()
            .unwrap();
        let record = Record::parse(r#"{"text":"x"}"#).unwrap();
        assert_eq!(serde_json::to_value(pipeline.run(record).unwrap()).unwrap()[TEXT_FIELD], "x-a-b");
    }

    #[test]
    fn failing_stage_fails_the_whole_record() {
        let pipeline = AnalyzerPipeline::builder()
            .score(Echo("seen"))
            .score(Failing)
            .build()
            .unwrap();
        let err = pipeline
            .run(Record::parse(r#"{"text":"some words"}"#).unwrap())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("lexicon exploded"));
    }

    #[test]
    fn builder_rejects_conflicting_fields() {
        assert!(AnalyzerPipeline::builder().score(Echo("text")).build().is_err());
        assert!(AnalyzerPipeline::builder()
            .score(Echo("scores"))
            .score(Echo("scores"))
            .build()
            .is_err());
    }

    #[test]
    fn emotion_scores_are_sorted_and_from_the_vocabulary() {
        let record = Record::parse(r#"{"text":"I am happy today and feeling great"}"#).unwrap();
        let enriched = AnalyzerPipeline::standard(&lexicons()).unwrap().run(record).unwrap();
        let output = serde_json::to_value(&enriched).unwrap();
        let scores = output[EMOTION_FIELD].as_object().unwrap();
        assert!(!scores.is_empty());
        let counts: Vec<u64> = scores.values().map(|v| v.as_u64().unwrap()).collect();
        assert!(counts.windows(2).all(|pair| pair[0] >= pair[1]));
        assert!(scores
            .keys()
            .all(|label| crate::analyzers::Emotion::from_label(label).is_some()));
        assert!(output[SENTIMENT_FIELD]["compound"].as_f64().unwrap() > 0.0);
    }
}
