use anyhow::Result;
use log::error;
use std::collections::BTreeMap;

use crate::filter::{screen, DropReason, Outcome, Screened};
use crate::pipeline::AnalyzerPipeline;
use crate::pool::WorkerPool;
use crate::record::Record;

/// Data lines start on the second line of the file.
const FIRST_DATA_LINE: usize = 2;

/// Screens one line and, when it qualifies, runs it through the worker's pipeline.
pub fn process_line(
    pipeline: &AnalyzerPipeline,
    line: &str,
    line_number: usize,
    min_word_count: usize,
) -> Outcome {
    match screen(line, line_number, min_word_count) {
        Screened::Drop(reason) => Outcome::Dropped(reason),
        Screened::Bypass(record) => Outcome::Kept(record),
        Screened::Enrich(record) => match pipeline.run(record) {
            Ok(record) => Outcome::Kept(record),
            Err(e) => {
                error!("Error analyzing line {}: {:#}", line_number, e);
                Outcome::Dropped(DropReason::AnalyzerFailure(format!("{:#}", e)))
            }
        },
    }
}

/// Fans the data lines out over the pool and returns one outcome per line, in input order.
/// `make_pipeline` runs once for every worker start, recycled workers included.
pub fn enrich_lines<P>(
    pool: &WorkerPool,
    lines: &[&str],
    min_word_count: usize,
    make_pipeline: P,
) -> Result<Vec<Outcome>>
where
    P: Fn() -> Result<AnalyzerPipeline> + Sync,
{
    let results = pool.map_ordered(
        lines.to_vec(),
        |_worker| make_pipeline(),
        |pipeline, index, line| {
            process_line(pipeline, line, index + FIRST_DATA_LINE, min_word_count)
        },
    )?;

    Ok(results
        .into_iter()
        .map(|result| {
            result.unwrap_or_else(|fault| {
                error!(
                    "Worker fault on line {}: {}",
                    fault.index + FIRST_DATA_LINE,
                    fault.message
                );
                Outcome::Dropped(DropReason::AnalyzerFailure(fault.message))
            })
        })
        .collect())
}

/// Kept records in input order plus a count of dropped lines per reason.
#[derive(Debug, Default)]
pub struct Aggregate {
    pub records: Vec<Record>,
    pub dropped: BTreeMap<&'static str, usize>,
}

impl Aggregate {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

pub fn aggregate(outcomes: Vec<Outcome>) -> Aggregate {
    let mut result = Aggregate::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Kept(record) => result.records.push(record),
            Outcome::Dropped(reason) => {
                let key = match reason {
                    DropReason::Blank => "blank",
                    DropReason::Malformed(_) => "malformed",
                    DropReason::MissingText => "missing text",
                    DropReason::AnalyzerFailure(_) => "analyzer failure",
                };
                *result.dropped.entry(key).or_default() += 1;
            }
        }
    }
    result
}
