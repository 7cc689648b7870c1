mod analyzers;
mod config;
mod dispatch;
mod filter;
mod loader;
mod memory;
mod output;
mod pipeline;
mod pool;
mod record;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use simple_logger::SimpleLogger;
use std::time::{Duration, Instant};
use time::macros::format_description;

use crate::analyzers::Lexicons;
use crate::config::{load_run_config, Cli, RunConfig, Settings};
use crate::pipeline::AnalyzerPipeline;
use crate::pool::WorkerPool;

#[derive(Debug)]
struct RunSummary {
    data_lines: usize,
    kept: usize,
    dropped: usize,
}

fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, elapsed.subsec_millis())
    }
}

fn completion_line(summary: &RunSummary, elapsed: Duration) -> String {
    format!("Finished processing {} rows in {}.", summary.kept, format_elapsed(elapsed))
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta} @ {per_sec}) {msg}")
            .context("Failed to create progress bar template")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

/// Load, enrich in parallel, aggregate, write. Only input, lexicon, config and
/// output failures end the run; problems with single lines never do.
fn run(settings: &Settings) -> Result<RunSummary> {
    let document = loader::load_input(&settings.input)?;
    let lines = document.data_lines();
    info!("Found {} data lines after the header", lines.len());

    let lexicons = Lexicons::load(
        settings.emotion_lexicon.as_deref(),
        settings.sentiment_lexicon.as_deref(),
    )?;

    let progress = progress_bar(lines.len())?;
    progress.set_message("Analyzing records...");
    let pool = WorkerPool::new(settings.threads, settings.max_tasks_per_worker)
        .with_progress(progress.clone());
    info!(
        "Using {} workers, each replaced after {} tasks",
        pool.size(),
        match settings.max_tasks_per_worker {
            0 => "no limit of".to_string(),
            n => n.to_string(),
        }
    );

    let outcomes = dispatch::enrich_lines(&pool, &lines, settings.min_word_count, || {
        AnalyzerPipeline::standard(&lexicons)
    })?;
    let aggregate = dispatch::aggregate(outcomes);
    progress.finish_with_message(format!(
        "{} kept, {} dropped",
        aggregate.records.len(),
        aggregate.dropped_total()
    ));

    for (reason, count) in &aggregate.dropped {
        info!("  - dropped ({}): {}", reason, count);
    }

    output::write_document(&settings.output, &aggregate.records, settings.pretty)?;

    Ok(RunSummary {
        data_lines: lines.len(),
        kept: aggregate.records.len(),
        dropped: aggregate.dropped_total(),
    })
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(cli.level_filter())
        .with_timestamp_format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .init()?;

    info!("Starting Mood Marker");
    info!("Run Timestamp: {}", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    memory::log_memory_usage("initial");

    let run_config = match &cli.config {
        Some(path) => {
            info!("Loading run configuration from: {}", path.display());
            let config = load_run_config(path)?;
            if let Some(description) = &config.description {
                info!("Run description: {}", description);
            }
            config
        }
        None => RunConfig::default(),
    };
    let settings = Settings::resolve(&cli, run_config);
    info!("Input: {}", settings.input.display());
    info!("Output: {}", settings.output.display());

    let summary = run(&settings)?;

    if summary.dropped > 0 {
        warn!(
            "{} of {} data lines were dropped",
            summary.dropped, summary.data_lines
        );
    }
    memory::log_memory_usage("final");
    // Printed outside the logger so --log-level cannot hide it.
    println!("{}", completion_line(&summary, start_time.elapsed()));
    Ok(())
}
