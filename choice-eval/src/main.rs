//! choice-eval CLI

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use choice_eval::{
    config::{EvalConfig, DEFAULT_CONFIG_PATH},
    extraction::{AnswerExtractor, ExtractionResult},
    records::{discover_files, FileSelection, Mode, RunDescriptor},
    reporting::{build_sheets, print_console_report, write_sheets, JsonSummary},
    runner::{Executor, ExecutorConfig},
};

#[derive(Parser)]
#[command(name = "choice-eval")]
#[command(about = "Score multiple-choice LLM responses and aggregate accuracy by taxonomy")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score result files and build reports
    Evaluate {
        /// Model names whose result files should be scored
        #[arg(short, long, num_args = 1..)]
        models: Vec<String>,

        /// Data split encoded in the result file names
        #[arg(short, long)]
        split: Option<String>,

        /// Prompting modes to score (zero-shot, five-shot)
        #[arg(long, num_args = 1..)]
        modes: Vec<Mode>,

        /// Directory to read result files from
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory to save scored files and reports to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Score every .jsonl file in the input directory
        #[arg(long)]
        evaluate_all: bool,

        /// Write per-metric report tables
        #[arg(long)]
        table_output: bool,

        /// Write the JSON summary
        #[arg(long)]
        json_output: bool,

        /// Number of concurrent file workers (0 = available parallelism)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Extract the answer from a single response (for debugging patterns)
    Extract {
        /// Model response text
        #[arg(short, long)]
        response: String,

        /// Option texts, in order
        #[arg(long = "option", num_args = 1..)]
        options: Vec<String>,

        /// Prompting mode of the response
        #[arg(long, default_value = "zero-shot")]
        mode: Mode,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        output: PathBuf,
    },
}

/// Evaluation flags that override the loaded configuration
struct EvaluateArgs {
    models: Vec<String>,
    split: Option<String>,
    modes: Vec<Mode>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    evaluate_all: bool,
    table_output: bool,
    json_output: bool,
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("choice_eval=debug,info")
    } else {
        EnvFilter::new("choice_eval=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Evaluate {
            models,
            split,
            modes,
            input,
            output,
            evaluate_all,
            table_output,
            json_output,
            workers,
        } => {
            let config = EvalConfig::load_or_default(cli.config.as_deref())?;
            let args = EvaluateArgs {
                models,
                split,
                modes,
                input,
                output,
                evaluate_all,
                table_output,
                json_output,
                workers,
            };
            evaluate(config, args).await?;
        }

        Commands::Extract {
            response,
            options,
            mode,
        } => {
            extract(&response, &options, mode);
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }
    }

    Ok(())
}

async fn evaluate(config: EvalConfig, args: EvaluateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let started_at = Utc::now();
    let mut settings = config.evaluation;
    let mut outputs = config.output;

    if let Some(split) = args.split {
        settings.split = split;
    }
    if !args.modes.is_empty() {
        settings.modes = args.modes;
    }
    if let Some(input) = args.input {
        settings.output_dir = input.display().to_string();
    }
    if let Some(output) = args.output {
        settings.save_dir = output.display().to_string();
    }
    if let Some(workers) = args.workers {
        settings.max_workers = workers;
    }
    outputs.table |= args.table_output;
    outputs.json |= args.json_output;

    if !args.evaluate_all && args.models.is_empty() {
        eprintln!("Error: pass --models or --evaluate-all");
        std::process::exit(1);
    }

    let selection = FileSelection {
        evaluate_all: args.evaluate_all,
        models: args.models,
        split: settings.split.clone(),
        modes: settings.modes.clone(),
    };
    let input_dir = settings.input_dir();
    let save_dir = settings.save_path();

    println!("=== choice-eval ===");
    println!("Started: {}", started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Input:   {}", input_dir.display());
    println!("Split:   {}", selection.split);
    println!();

    let mut descriptors = Vec::new();
    for name in discover_files(&input_dir, &selection)? {
        match RunDescriptor::from_file_name(&name, &selection.split, &selection.modes) {
            Ok(Some(descriptor)) => descriptors.push(descriptor),
            Ok(None) => tracing::debug!("Ignoring {} (split or mode not selected)", name),
            Err(e) => tracing::warn!("Ignoring {}: {}", name, e),
        }
    }

    if descriptors.is_empty() {
        eprintln!("Error: No result files to evaluate in {}", input_dir.display());
        std::process::exit(1);
    }

    let executor = Executor::new(ExecutorConfig {
        max_workers: settings.max_workers,
        match_budget: settings.match_budget(),
        save_dir: outputs.scored_records.then(|| save_dir.clone()),
    });
    tracing::info!(
        "Scoring {} files with {} workers",
        descriptors.len(),
        executor.worker_count(descriptors.len())
    );

    let batch = executor.run(&input_dir, descriptors).await;
    print_console_report(&batch.files);

    for skipped in &batch.skipped {
        println!("Skipped {}: {}", skipped.file_name, skipped.reason);
    }

    let suffix = selection.output_suffix();
    if outputs.table {
        let report_dir = save_dir.join(format!("results_{}", suffix));
        write_sheets(&report_dir, &build_sheets(&batch.hierarchy))?;
        println!("Report tables saved to: {}", report_dir.display());
    }
    if outputs.json {
        let json_path = save_dir.join(format!("results_{}.json", suffix));
        JsonSummary::from_hierarchy(&batch.hierarchy).write_to_file(&json_path)?;
        println!("JSON results saved to: {}", json_path.display());
    }

    let elapsed = Utc::now() - started_at;
    println!(
        "\nScored {} samples from {} files in {:.1}s",
        batch.sample_count(),
        batch.files.len(),
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    Ok(())
}

fn extract(response: &str, options: &[String], mode: Mode) {
    let extractor = AnswerExtractor::new();
    let response = serde_json::Value::String(response.to_string());
    let options = serde_json::Value::from(options.to_vec());

    match extractor.extract_for_mode(&response, &options, mode) {
        ExtractionResult::Letter(letter) => println!("Extracted: {}", letter),
        ExtractionResult::NoMatch => println!("No answer found"),
        ExtractionResult::Malformed => println!("Malformed input"),
    }
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = EvalConfig::default();
    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}
