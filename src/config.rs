use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::filter::MIN_WORD_COUNT;
use crate::output::DEFAULT_OUTPUT_FILE;
use crate::pool::DEFAULT_MAX_TASKS_PER_WORKER;

pub const DEFAULT_INPUT_FILE: &str = "data.json";

#[derive(Parser, Clone, Debug)]
#[command(name = "Mood Marker")]
#[command(about = "Adds emotion and sentiment scores to a batch of JSON text records, in parallel.")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[arg(short, long, help = "Input file of JSON records, one per line after a header line [default: data.json]")]
    pub input: Option<PathBuf>,
    #[arg(short, long, help = "Output JSON file [default: mood-marked.json]")]
    pub output: Option<PathBuf>,
    #[arg(short, long, help = "Path to a YAML run configuration file")]
    pub config: Option<PathBuf>,
    #[arg(short, long, help = "Number of worker threads to use (0 for auto)")]
    pub threads: Option<usize>,
    #[arg(long, help = "Tasks a worker handles before it is replaced (0 to never replace) [default: 10]")]
    pub max_tasks_per_worker: Option<usize>,
    #[arg(long, help = "Records with fewer words are written out without analysis [default: 5]")]
    pub min_word_count: Option<usize>,
    #[arg(long, help = "NRC word-level emotion lexicon (word, emotion, 0/1; tab-separated)")]
    pub emotion_lexicon: Option<PathBuf>,
    #[arg(long, help = "VADER sentiment lexicon (token, mean valence, ...; tab-separated)")]
    pub sentiment_lexicon: Option<PathBuf>,
    #[arg(long, help = "Pretty-print the output document")]
    pub pretty: bool,
    #[arg(short, long, default_value = "INFO", help = "Logging level (DEBUG, INFO, WARN, ERROR)")]
    pub log_level: String,
}

impl Cli {
    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level.to_uppercase().as_str() {
            "DEBUG" => LevelFilter::Debug,
            "INFO" => LevelFilter::Info,
            "WARN" | "WARNING" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            _ => {
                eprintln!("Invalid log level '{}', defaulting to INFO.", self.log_level);
                LevelFilter::Info
            }
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub description: Option<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub threads: Option<usize>,
    pub max_tasks_per_worker: Option<usize>,
    pub min_word_count: Option<usize>,
    pub pretty: Option<bool>,
    #[serde(default)]
    pub lexicons: LexiconPaths,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LexiconPaths {
    pub emotion: Option<PathBuf>,
    pub sentiment: Option<PathBuf>,
}

pub fn load_run_config(path: &Path) -> Result<RunConfig> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open run configuration file: {}", path.display()))?;
    serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse run configuration YAML from {}", path.display()))
}

/// Effective settings for one run: command line over YAML over built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub threads: usize,
    pub max_tasks_per_worker: usize,
    pub min_word_count: usize,
    pub emotion_lexicon: Option<PathBuf>,
    pub sentiment_lexicon: Option<PathBuf>,
    pub pretty: bool,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: RunConfig) -> Self {
        let threads = match cli.threads.or(config.threads) {
            Some(0) | None => num_cpus::get(),
            Some(n) => n,
        };
        Self {
            input: cli
                .input
                .clone()
                .or(config.input)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FILE)),
            output: cli
                .output
                .clone()
                .or(config.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            threads,
            max_tasks_per_worker: cli
                .max_tasks_per_worker
                .or(config.max_tasks_per_worker)
                .unwrap_or(DEFAULT_MAX_TASKS_PER_WORKER),
            min_word_count: cli
                .min_word_count
                .or(config.min_word_count)
                .unwrap_or(MIN_WORD_COUNT),
            emotion_lexicon: cli.emotion_lexicon.clone().or(config.lexicons.emotion),
            sentiment_lexicon: cli.sentiment_lexicon.clone().or(config.lexicons.sentiment),
            pretty: cli.pretty || config.pretty.unwrap_or(false),
        }
    }
}
