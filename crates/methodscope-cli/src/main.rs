use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use methodscope_core::config_file;
use methodscope_core::{OllamaClient, RunContext, criteria, prompt, text};
use methodscope_pdf_mupdf::MupdfBackend;
use methodscope_reporting::ExportFormat;
use tokio_util::sync::CancellationToken;

mod logging;
mod output;
mod run;
mod settings;

use output::ColorMode;
use settings::ModelArgs;

/// Methodological transparency review - score academic PDFs against a fixed rubric with a local model
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate every PDF in a folder against the criteria catalog
    Evaluate {
        /// Folder containing the PDF articles
        folder: PathBuf,

        /// Path to the results file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Results format (json or csv); inferred from the output extension when omitted
        #[arg(long)]
        format: Option<ExportFormat>,

        #[command(flatten)]
        model: ModelArgs,

        /// Comma-separated list of criteria to evaluate (default: all)
        #[arg(long, value_delimiter = ',')]
        criteria: Vec<String>,

        /// Number of documents evaluated at the same time
        #[arg(long)]
        max_concurrent_docs: Option<usize>,

        /// Path to the log file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the evaluation criteria and their rubrics
    Criteria {
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Dry run: print the initial prompt for one PDF without calling the model
    Prompt {
        /// Path to the PDF file
        pdf: PathBuf,

        /// Criterion to build the prompt for
        #[arg(long)]
        criterion: String,
    },

    /// Check that the model endpoint is reachable
    Health {
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Criteria { no_color } => {
            let mut out = std::io::stdout().lock();
            output::print_criteria(&mut out, criteria::all(), ColorMode(!no_color))?;
            Ok(())
        }
        Command::Prompt { pdf, criterion } => dry_run_prompt(&pdf, &criterion).await,
        Command::Health { model } => health(model).await,
        Command::Evaluate {
            folder,
            output,
            format,
            model,
            criteria,
            max_concurrent_docs,
            log_file,
            no_color,
        } => {
            evaluate(
                folder,
                output,
                format,
                model,
                criteria,
                max_concurrent_docs,
                log_file,
                no_color,
            )
            .await
        }
    }
}

fn format_for_path(path: &Path) -> ExportFormat {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse().ok())
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
async fn evaluate(
    folder: PathBuf,
    output: Option<PathBuf>,
    format: Option<ExportFormat>,
    model_args: ModelArgs,
    criteria_names: Vec<String>,
    max_concurrent_docs: Option<usize>,
    log_file: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    // Resolve configuration: CLI flags > env vars > config file > defaults
    let file_config = config_file::load_config();
    let model_settings =
        settings::resolve_model_settings(&model_args, &file_config, |k| std::env::var(k).ok());
    let run_settings = settings::resolve_run_settings(
        output,
        log_file,
        max_concurrent_docs,
        criteria_names,
        &file_config,
    );
    let format = format.unwrap_or_else(|| format_for_path(&run_settings.output));
    let color = ColorMode(!no_color);

    let _log_guard = logging::init_file_logging(&run_settings.log_file)?;

    let selected = criteria::select(&run_settings.criteria)?;

    let model = OllamaClient::new(model_settings)?;
    let pinned = model.settings();
    tracing::info!(
        endpoint = %pinned.endpoint,
        model = %pinned.model,
        num_ctx = pinned.num_ctx,
        seed = pinned.seed,
        "model configured"
    );

    let ctx = RunContext {
        model: Arc::new(model),
        pdf_backend: Arc::new(MupdfBackend::new()),
        criteria: selected,
        max_concurrent_documents: run_settings.max_concurrent_documents,
    };

    let progress_cb = move |event: methodscope_core::ProgressEvent| {
        let mut out = std::io::stdout().lock();
        let _ = output::print_progress(&mut out, &event, color);
        let _ = out.flush();
    };

    let cancel = CancellationToken::new();

    // Set up Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let summary =
        run::evaluate_and_write(&ctx, &folder, &run_settings.output, format, progress_cb, cancel).await?;

    let mut out = std::io::stdout().lock();
    output::print_run_summary(&mut out, &summary, &run_settings.output, color)?;
    Ok(())
}

async fn dry_run_prompt(pdf: &Path, criterion_name: &str) -> anyhow::Result<()> {
    let criterion = criteria::select(&[criterion_name])?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No criterion selected"))?;

    if !pdf.exists() {
        anyhow::bail!("File not found: {}", pdf.display());
    }

    let path = pdf.to_path_buf();
    let document_text =
        tokio::task::spawn_blocking(move || text::extract_document_text(&path, &MupdfBackend::new()))
            .await
            .map_err(|e| anyhow::anyhow!("Extraction task failed: {}", e))?
            .map_err(|e| anyhow::anyhow!("Extraction failed for {}: {}", pdf.display(), e))?;

    let mut out = std::io::stdout().lock();
    write!(out, "{}", prompt::build_initial_prompt(criterion, &document_text))?;
    Ok(())
}

async fn health(model_args: ModelArgs) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use owo_colors::OwoColorize;

    let file_config = config_file::load_config();
    let model_settings =
        settings::resolve_model_settings(&model_args, &file_config, |k| std::env::var(k).ok());
    let client = OllamaClient::new(model_settings)?;

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Contacting {}...", client.settings().endpoint));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = client.health_check().await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            println!(
                "{} {} ({})",
                "OK".green(),
                client.settings().endpoint,
                client.settings().model
            );
            Ok(())
        }
        Err(e) => anyhow::bail!(
            "Model endpoint {} is not reachable: {}",
            client.settings().endpoint,
            e
        ),
    }
}
