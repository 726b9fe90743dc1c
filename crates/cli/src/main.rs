//! Command-line front end for ticket triage.
//!
//! Usage:
//!     triage analyze tickets.txt --format json
//!     triage analyze tickets.txt --category tv
//!     triage count tickets.txt
//!     triage classify "нет сигнала на 2 тв" --contract "Интернет 100"

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use triage_aggregate::analyze_text;
use triage_classify::{Classification, Classifier};
use triage_explain::{explain_classification, summarize_analysis, Explanation};
use triage_model::Category;
use triage_parser::{count_blocks, parse_records};
use triage_terms::TermDictionaries;

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Parse support-ticket logs and group complaints by problem category")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file overriding the built-in term dictionaries
    #[arg(long, global = true)]
    dictionaries: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse tickets and print equipment, territory and category stats
    Analyze {
        /// Ticket text file ("-" or omitted for stdin)
        input: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Only report this category (label or short name, e.g. "tv")
        #[arg(long)]
        category: Option<String>,
    },

    /// Count customer blocks and how many were dropped as invalid
    Count {
        /// Ticket text file ("-" or omitted for stdin)
        input: Option<PathBuf>,
    },

    /// Classify a single problem description
    Classify {
        /// Problem text
        problem: String,

        /// Contract type of the customer
        #[arg(short, long, default_value = "")]
        contract: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Serialize)]
struct ClassifyOutput {
    classification: Classification,
    explanation: Explanation,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triage=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            format,
            category,
        } => {
            let category = category
                .map(|label| {
                    Category::from_label(&label)
                        .with_context(|| format!("Unknown category: {label}"))
                })
                .transpose()?;
            let classifier = load_classifier(cli.dictionaries.as_deref())?;
            run_analyze(&classifier, input.as_deref(), &format, category)?;
        }
        Commands::Count { input } => {
            run_count(input.as_deref())?;
        }
        Commands::Classify {
            problem,
            contract,
            format,
        } => {
            let classifier = load_classifier(cli.dictionaries.as_deref())?;
            run_classify(&classifier, &problem, &contract, &format)?;
        }
    }

    Ok(())
}

fn load_classifier(path: Option<&Path>) -> Result<Classifier> {
    let dictionaries = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading term dictionaries");
            TermDictionaries::from_path(path)?
        }
        None => TermDictionaries::default(),
    };
    Ok(Classifier::new(dictionaries)?)
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn run_analyze(
    classifier: &Classifier,
    input: Option<&Path>,
    format: &str,
    category: Option<Category>,
) -> Result<()> {
    let text = read_input(input)?;
    let (mut result, summary) = analyze_text(&text, classifier);

    if let Some(category) = category {
        result.categories.retain(|c, _| *c == category);
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", summarize_analysis(&result));
        println!("\n---");
        println!(
            "Records: {} of {} blocks ({} dropped)",
            summary.records, summary.blocks, summary.dropped
        );
    }

    Ok(())
}

fn run_count(input: Option<&Path>) -> Result<()> {
    let text = read_input(input)?;
    let blocks = count_blocks(&text);
    let records = parse_records(&text);

    println!("Blocks: {}", blocks);
    println!("Valid records: {}", records.len());
    println!("Dropped: {}", blocks.saturating_sub(records.len()));

    Ok(())
}

fn run_classify(classifier: &Classifier, problem: &str, contract: &str, format: &str) -> Result<()> {
    let Some(classification) = classifier.classify_text(problem, contract) else {
        println!("No category: problem text is empty");
        return Ok(());
    };
    let explanation = explain_classification(&classification);

    if format == "json" {
        let output = ClassifyOutput {
            classification,
            explanation,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", explanation.summary);
        println!("  {}", explanation.detail);
        for item in &explanation.evidence {
            match &item.context {
                Some(context) => println!("  - {}: {} ({})", item.kind, item.value, context),
                None => println!("  - {}: {}", item.kind, item.value),
            }
        }
    }

    Ok(())
}
