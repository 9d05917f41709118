// Survey batch driver
//
// Reads `{"survey": [{"question_number": 1, "text": "..."}]}` and runs every
// item through its own refinement, writing `results_<N>.csv` per item.

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::export::save_csv;
use crate::backend::Backend;
use crate::refinement::{refine, RefinementRequest, Trace};

/// Question identifier; surveys use plain numbers or labels like "3b".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(u64),
    Label(String),
}

impl QuestionId {
    /// Whether the id can stand in a file name inside the output directory.
    pub fn is_file_safe(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Label(label) => {
                !label.trim().is_empty()
                    && !label.contains("..")
                    && !label.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
            }
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurveyItem {
    pub question_number: QuestionId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Survey {
    pub survey: Vec<SurveyItem>,
}

impl Survey {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read survey file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid survey file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let survey: Self = serde_json::from_str(text)?;
        if let Some(item) = survey.survey.iter().find(|i| !i.question_number.is_file_safe()) {
            bail!(
                "question_number {:?} cannot be used in a result file name",
                item.question_number.to_string()
            );
        }
        Ok(survey)
    }
}

/// Output file for one question.
pub fn result_path(output_dir: &Path, question: &QuestionId) -> PathBuf {
    output_dir.join(format!("results_{question}.csv"))
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Items refined concurrently
    pub jobs: usize,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            show_progress: true,
        }
    }
}

/// What happened to one survey item.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub question_number: QuestionId,
    pub path: PathBuf,
    pub iterations: usize,
    pub final_similarity: Option<f64>,
    /// Set when the refinement or the CSV write failed
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Refine every survey item and write one CSV per item into `output_dir`.
///
/// `template` supplies everything but the text. A failing item is logged and
/// its partial trace is still written; the batch carries on. Outcomes are
/// returned in survey order.
pub async fn run_survey(
    backend: Arc<dyn Backend>,
    template: &RefinementRequest,
    survey: Survey,
    output_dir: &Path,
    options: BatchOptions,
) -> Result<Vec<ItemOutcome>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let progress = if options.show_progress {
        let pb = ProgressBar::new(survey.survey.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let indexed: Vec<(usize, SurveyItem)> = survey.survey.into_iter().enumerate().collect();
    let mut outcomes: Vec<(usize, ItemOutcome)> = stream::iter(indexed)
        .map(|(index, item)| {
            let backend = backend.clone();
            let progress = progress.clone();
            let mut request = template.clone();
            request.text = item.text;
            async move {
                progress.set_message(format!("question {}", item.question_number));
                let outcome =
                    run_item(backend, &request, item.question_number, output_dir).await;
                progress.inc(1);
                (index, outcome)
            }
        })
        .buffer_unordered(options.jobs.max(1))
        .collect()
        .await;

    progress.finish_and_clear();
    outcomes.sort_by_key(|(index, _)| *index);
    Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
}

async fn run_item(
    backend: Arc<dyn Backend>,
    request: &RefinementRequest,
    question_number: QuestionId,
    output_dir: &Path,
) -> ItemOutcome {
    let path = result_path(output_dir, &question_number);

    let (trace, mut error) = match refine(backend, request).await {
        Ok(trace) => (trace, None),
        Err(failure) => {
            tracing::warn!(
                question = %question_number,
                kind = failure.error.kind(),
                error = %failure.error,
                completed = failure.trace.len(),
                "Survey item failed"
            );
            let message = failure.error.to_string();
            (failure.trace, Some(message))
        }
    };

    if let Err(e) = save_csv(&trace, &path) {
        tracing::warn!(question = %question_number, error = %e, "Could not write results");
        error.get_or_insert_with(|| format!("{e:#}"));
    }

    log_item(&question_number, &trace);

    ItemOutcome {
        question_number,
        path,
        iterations: trace.len(),
        final_similarity: trace.final_similarity(),
        error,
    }
}

fn log_item(question: &QuestionId, trace: &Trace) {
    tracing::info!(
        question = %question,
        iterations = trace.len(),
        similarity = trace.final_similarity().unwrap_or(0.0),
        "Survey item done"
    );
}
