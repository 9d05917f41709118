// Command-line arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "backtranslate", version)]
#[command(about = "Refine a translation by translating it back and critiquing the round trip")]
pub struct Cli {
    /// Config file (default: $BACKTRANSLATE_CONFIG, then ~/.backtranslate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refine one text. Reads stdin when TEXT is omitted.
    Run(RunArgs),
    /// Refine every question of a survey file, one CSV per question.
    Batch(BatchArgs),
    /// Write a commented default config file.
    InitConfig {
        /// Target path (default: ~/.backtranslate/config.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Text to translate
    pub text: Option<String>,

    #[command(flatten)]
    pub overrides: RunOverrides,

    /// Write the trace as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write the trace as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Survey JSON: {"survey": [{"question_number": 1, "text": "..."}]}
    pub survey: PathBuf,

    /// Directory receiving results_<N>.csv
    #[arg(long, short, default_value = "results")]
    pub output_dir: PathBuf,

    /// Questions refined concurrently
    #[arg(long, short, default_value_t = 1)]
    pub jobs: usize,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    #[command(flatten)]
    pub overrides: RunOverrides,
}

/// Per-invocation overrides of the `[models]` and `[run]` config sections.
#[derive(Debug, Default, Args)]
pub struct RunOverrides {
    /// Model for source → target translation
    #[arg(long)]
    pub forward_model: Option<String>,

    /// Model for target → source back-translation
    #[arg(long)]
    pub backward_model: Option<String>,

    /// Model for similarity scoring and critique
    #[arg(long)]
    pub judge_model: Option<String>,

    #[arg(long, short = 's')]
    pub source_lang: Option<String>,

    #[arg(long, short = 't')]
    pub target_lang: Option<String>,

    /// Domain the translators are experts in
    #[arg(long)]
    pub expertise: Option<String>,

    /// Base instructions for every role
    #[arg(long, short = 'g')]
    pub guidance: Option<String>,

    /// Iteration budget
    #[arg(long, short = 'n')]
    pub max_iterations: Option<usize>,

    /// Stop once similarity is within this distance of 1.0
    #[arg(long)]
    pub epsilon: Option<f64>,
}

impl RunOverrides {
    pub fn apply(&self, config: &mut Config) {
        let set = |slot: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                *slot = v.clone();
            }
        };
        set(&mut config.models.forward, &self.forward_model);
        set(&mut config.models.backward, &self.backward_model);
        set(&mut config.models.judge, &self.judge_model);
        set(&mut config.run.source_lang, &self.source_lang);
        set(&mut config.run.target_lang, &self.target_lang);
        set(&mut config.run.expertise, &self.expertise);
        set(&mut config.run.guidance, &self.guidance);
        if let Some(n) = self.max_iterations {
            config.run.max_iterations = n;
        }
        if let Some(eps) = self.epsilon {
            config.run.convergence_epsilon = eps;
        }
    }
}
