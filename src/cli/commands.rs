// Subcommand handlers

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use super::args::{BatchArgs, Cli, Command, RunArgs, RunOverrides};
use crate::backend::Backend;
use crate::config::{default_config_path, load_config, write_default_config, Config};
use crate::refinement::{refine, RefinementRequest, Trace};
use crate::report::{
    render_summary, run_survey, save_csv, save_json, BatchOptions, ItemOutcome, Survey,
    TraceReport,
};

/// Dispatch a parsed command line.
pub async fn execute(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::InitConfig { path, force } => init_config(path.as_deref(), force),
        Command::Run(args) => {
            let config = prepare_config(cli.config.as_deref(), &args.overrides)?;
            run_single(config, args).await
        }
        Command::Batch(args) => {
            let config = prepare_config(cli.config.as_deref(), &args.overrides)?;
            run_batch(config, args).await
        }
    }
}

fn prepare_config(path: Option<&Path>, overrides: &RunOverrides) -> Result<Config> {
    let mut config = load_config(path)?;
    overrides.apply(&mut config);
    config
        .validate()
        .context("Invalid command-line overrides")?;
    Ok(config)
}

fn build_backend(config: &Config) -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(config.build_backend()?))
}

async fn run_single(config: Config, args: RunArgs) -> Result<ExitCode> {
    let text = match args.text.as_deref() {
        Some(text) => text.to_string(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        bail!("Nothing to translate: pass TEXT or pipe it on stdin");
    }

    let backend = build_backend(&config)?;
    let request = RefinementRequest::from_config(text.as_str(), &config);
    let epsilon = request.epsilon;

    match refine(backend, &request).await {
        Ok(trace) => {
            write_outputs(&text, &trace, epsilon, &args)?;
            print!("{}", render_summary(&trace, epsilon));
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            // Keep whatever finished before the failure
            if !failure.trace.is_empty() {
                write_outputs(&text, &failure.trace, epsilon, &args)?;
                eprint!("{}", render_summary(&failure.trace, epsilon));
            }
            Err(anyhow::Error::new(failure))
        }
    }
}

fn write_outputs(text: &str, trace: &Trace, epsilon: f64, args: &RunArgs) -> Result<()> {
    if let Some(path) = &args.csv {
        save_csv(trace, path)?;
        tracing::info!(path = %path.display(), "Wrote CSV");
    }
    if let Some(path) = &args.json {
        save_json(&TraceReport::new(text, trace, epsilon), path)?;
        tracing::info!(path = %path.display(), "Wrote JSON");
    }
    Ok(())
}

async fn run_batch(config: Config, args: BatchArgs) -> Result<ExitCode> {
    let survey = Survey::load(&args.survey)?;
    if survey.survey.is_empty() {
        tracing::warn!(path = %args.survey.display(), "Survey has no questions");
        return Ok(ExitCode::SUCCESS);
    }

    let backend = build_backend(&config)?;
    let template = RefinementRequest::from_config(String::new(), &config);
    let options = BatchOptions {
        jobs: args.jobs,
        show_progress: !args.no_progress,
    };

    let outcomes = run_survey(backend, &template, survey, &args.output_dir, options).await?;
    print_outcomes(&outcomes);

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    if failed > 0 {
        eprintln!("{failed} of {} question(s) failed", outcomes.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_outcomes(outcomes: &[ItemOutcome]) {
    println!("{:>8}  {:>5}  {:>8}  result", "question", "iters", "score");
    for outcome in outcomes {
        let score = outcome
            .final_similarity
            .map(|s| format!("{s:.4}"))
            .unwrap_or_else(|| "-".to_string());
        let result = match &outcome.error {
            Some(e) => format!("failed: {e}"),
            None => outcome.path.display().to_string(),
        };
        println!(
            "{:>8}  {:>5}  {:>8}  {}",
            outcome.question_number.to_string(),
            outcome.iterations,
            score,
            result
        );
    }
}

fn init_config(path: Option<&Path>, force: bool) -> Result<ExitCode> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path().context("Could not determine home directory")?,
    };
    let written = write_default_config(&path, force)?;
    println!("Wrote {}", written.display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refinement::RoleModels;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;
    use tempfile::TempDir;

    fn config_for(server: &ServerGuard) -> Config {
        let mut config = Config::default();
        config.backend.base_url = server.url();
        config.models = RoleModels {
            forward: "fwd".to_string(),
            backward: "bwd".to_string(),
            judge: "judge".to_string(),
        };
        config.run.source_lang = "English".to_string();
        config.run.target_lang = "French".to_string();
        config.run.max_iterations = 3;
        config
    }

    fn run_args(text: &str, dir: &TempDir) -> RunArgs {
        RunArgs {
            text: Some(text.to_string()),
            overrides: RunOverrides::default(),
            csv: Some(dir.path().join("trace.csv")),
            json: Some(dir.path().join("trace.json")),
        }
    }

    #[test]
    fn test_init_config_then_refuse_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        init_config(Some(&path), false).unwrap();
        assert!(path.exists());
        assert!(init_config(Some(&path), false).is_err());
        init_config(Some(&path), true).unwrap();
    }

    #[tokio::test]
    async fn test_execute_empty_survey_succeeds() {
        let dir = TempDir::new().unwrap();
        let survey = dir.path().join("survey.json");
        std::fs::write(&survey, r#"{"survey": []}"#).unwrap();
        let config_path = dir.path().join("config.toml");
        write_default_config(&config_path, false).unwrap();

        let cli = Cli {
            config: Some(config_path),
            verbose: false,
            command: Command::Batch(BatchArgs {
                survey,
                output_dir: dir.path().join("out"),
                jobs: 1,
                no_progress: true,
                overrides: RunOverrides::default(),
            }),
        };

        execute(cli).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_override() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        write_default_config(&config_path, false).unwrap();

        let cli = Cli {
            config: Some(config_path),
            verbose: false,
            command: Command::Run(RunArgs {
                text: Some("hello".to_string()),
                overrides: RunOverrides {
                    max_iterations: Some(0),
                    ..Default::default()
                },
                csv: None,
                json: None,
            }),
        };

        assert!(execute(cli).await.is_err());
    }

    #[tokio::test]
    async fn test_run_single_writes_outputs_for_untrimmed_text() {
        let mut server = Server::new_async().await;
        let _show = server
            .mock("POST", "/api/show")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let forward = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "model": "fwd" })),
                Matcher::Regex("Text:   hello".to_string()),
            ]))
            .with_status(200)
            .with_body(json!({ "response": "bonjour", "done": true }).to_string())
            .expect(1)
            .create_async()
            .await;
        let _backward = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(json!({ "model": "bwd" })))
            .with_status(200)
            .with_body(json!({ "response": "hello", "done": true }).to_string())
            .create_async()
            .await;
        let _embed = server
            .mock("POST", "/api/embed")
            .with_status(200)
            .with_body(json!({ "embeddings": [[0.6, 0.8]] }).to_string())
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let args = run_args("  hello\n", &dir);
        run_single(config_for(&server), args).await.unwrap();

        forward.assert_async().await;
        let csv = std::fs::read_to_string(dir.path().join("trace.csv")).unwrap();
        assert!(csv.contains("bonjour"));
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("trace.json")).unwrap())
                .unwrap();
        assert_eq!(report["text"], "  hello\n");
        assert_eq!(report["converged"], true);
    }

    #[tokio::test]
    async fn test_run_single_rejects_blank_text_without_requests() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let result = run_single(config_for(&server), run_args(" \n\t", &dir)).await;

        assert!(result.is_err());
        assert!(!dir.path().join("trace.csv").exists());
        any.assert_async().await;
    }
}
