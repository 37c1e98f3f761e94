//! Rewrite command - instrument unit files
//!
//! Inputs are JSON unit files or directories of them. Rewritten units are
//! written under `--out-dir` at the same relative path.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use instrument_core::{
    instrument_units, instrument_units_with_threads, summarize, InstrumentedUnit, RewriteStats,
};
use instrument_types::env_utils::env_var;
use serde::Serialize;
use tracing::warn;

use super::output::{collect_unit_files, print_json, read_unit, write_unit};

#[derive(Parser, Debug)]
pub struct RewriteCmd {
    /// Unit files or directories containing `*.json` unit files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving the rewritten units
    #[arg(long, short)]
    pub out_dir: PathBuf,

    /// Worker threads (default: CLASSPATH_INSTRUMENT_THREADS, else one per core)
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Debug, Serialize)]
struct UnitReport {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<RewriteStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RewriteOutput {
    units: Vec<UnitReport>,
    total: RewriteStats,
    failed: usize,
}

impl RewriteCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let files = collect_unit_files(&self.inputs)?;
        let units = files
            .iter()
            .map(|(path, _)| read_unit(path))
            .collect::<Result<Vec<_>>>()?;

        let threads = self
            .threads
            .or_else(|| env_var("CLASSPATH_INSTRUMENT_THREADS"));
        let results = match threads {
            Some(n) if n > 0 => instrument_units_with_threads(&units, n)?,
            _ => instrument_units(&units),
        };
        let total = summarize(&results);

        let mut reports = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for ((input, relative), result) in files.iter().zip(results) {
            let report = match result {
                Ok(InstrumentedUnit { unit, stats }) => {
                    let output = self.out_dir.join(relative);
                    write_unit(&output, &unit)?;
                    UnitReport {
                        input: input.display().to_string(),
                        output: Some(output.display().to_string()),
                        stats: Some(stats),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(input = %input.display(), "unit rewrite failed: {:#}", e);
                    failed += 1;
                    UnitReport {
                        input: input.display().to_string(),
                        output: None,
                        stats: None,
                        error: Some(format!("{:#}", e)),
                    }
                }
            };
            reports.push(report);
        }

        let output = RewriteOutput {
            units: reports,
            total,
            failed,
        };
        if json_output {
            print_json(&output)?;
        } else {
            print_human(&output);
        }

        if output.failed > 0 {
            bail!(
                "{} of {} unit(s) failed to rewrite",
                output.failed,
                output.units.len()
            );
        }
        Ok(())
    }
}

fn print_human(output: &RewriteOutput) {
    for report in &output.units {
        match (&report.output, &report.stats, &report.error) {
            (Some(out), Some(stats), _) => {
                let wrapper = if stats.wrappers_synthesized > 0 {
                    ", call-site wrapper added"
                } else {
                    ""
                };
                println!(
                    "{} -> {} ({} redirected, {} factory call(s){})",
                    report.input, out, stats.redirected_calls, stats.factory_calls, wrapper
                );
            }
            (_, _, Some(error)) => println!("{}: FAILED: {}", report.input, error),
            _ => {}
        }
    }
    println!(
        "\n{} unit(s), {} call(s) redirected, {} wrapper(s) synthesized",
        output.units.len(),
        output.total.redirected_calls,
        output.total.wrappers_synthesized
    );
    for (target, count) in &output.total.by_target {
        println!("  {:<18} {}", target, count);
    }
}
