// Trace export — CSV rows and a JSON report

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::refinement::{IterationRecord, Trace};

/// One CSV row per iteration.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    iteration: usize,
    similarity: f64,
    guidance: &'a str,
    translation: &'a str,
    backtranslation: &'a str,
    critique: Option<&'a str>,
}

impl<'a> From<&'a IterationRecord> for CsvRow<'a> {
    fn from(r: &'a IterationRecord) -> Self {
        Self {
            iteration: r.iteration,
            similarity: r.similarity,
            guidance: &r.guidance_snapshot,
            translation: &r.translation,
            backtranslation: &r.backtranslation,
            critique: r.critique.as_deref(),
        }
    }
}

/// Write `trace` as CSV with a header row.
///
/// An empty trace still produces the header.
pub fn write_csv<W: Write>(trace: &Trace, writer: W) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record([
        "iteration",
        "similarity",
        "guidance",
        "translation",
        "backtranslation",
        "critique",
    ])?;
    for record in trace {
        csv.serialize(CsvRow::from(record))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn save_csv(trace: &Trace, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(trace, file).with_context(|| format!("Failed to write {}", path.display()))
}

/// JSON document describing one run.
#[derive(Debug, Serialize)]
pub struct TraceReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub text: &'a str,
    pub final_translation: Option<&'a str>,
    pub final_similarity: Option<f64>,
    pub converged: bool,
    pub iterations: &'a Trace,
}

impl<'a> TraceReport<'a> {
    pub fn new(text: &'a str, trace: &'a Trace, epsilon: f64) -> Self {
        Self {
            generated_at: Utc::now(),
            text,
            final_translation: trace.final_translation(),
            final_similarity: trace.final_similarity(),
            converged: trace.converged(epsilon),
            iterations: trace,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize trace report")
    }
}

pub fn save_json(report: &TraceReport<'_>, path: &Path) -> Result<()> {
    let json = report.to_json()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
