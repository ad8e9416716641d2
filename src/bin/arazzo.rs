//! CLI frontend over the analysis pipeline.
//!
//! Reads an Arazzo document as JSON, runs the full analysis and prints
//! diagnostics, graph IR or the symbol tree. Hosts with span-aware parsers
//! get real source ranges; this frontend settles for the adapter's
//! synthetic ones.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use arazzo_core::analysis::{analyze_with, AnalysisOptions};
use arazzo_core::document;
use arazzo_core::graph;

#[derive(Parser)]
#[command(name = "arazzo")]
#[command(about = "Validate Arazzo workflow documents and derive transition graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a document and print diagnostics
    Validate {
        /// Path to the document (JSON)
        file: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Emit transition graph IR as JSON
    Graph {
        file: PathBuf,
        /// Emit only this workflow's graph
        #[arg(long)]
        workflow: Option<String>,
    },
    /// Emit the symbol tree as JSON
    Symbols { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate { file, format } => validate(&file, format),
        Commands::Graph { file, workflow } => emit_graph(&file, workflow.as_deref()),
        Commands::Symbols { file } => emit_symbols(&file),
    }
}

fn load(file: &PathBuf) -> anyhow::Result<document::Node> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    document::load_json(&source).with_context(|| format!("failed to parse {}", file.display()))
}

fn validate(file: &PathBuf, format: Format) -> anyhow::Result<()> {
    let tree = load(file)?;
    let analysis = analyze_with(&tree, &AnalysisOptions::default());

    match format {
        Format::Text => {
            for diagnostic in &analysis.diagnostics {
                println!("{diagnostic}");
            }
            println!(
                "{} workflows, {} diagnostics",
                analysis.model.workflows.len(),
                analysis.diagnostics.len()
            );
        }
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&analysis.diagnostics)?);
        }
    }

    if analysis.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn emit_graph(file: &PathBuf, workflow: Option<&str>) -> anyhow::Result<()> {
    let tree = load(file)?;
    let analysis = analyze_with(
        &tree,
        &AnalysisOptions {
            build_graphs: true,
            build_symbols: false,
        },
    );

    match workflow {
        Some(id) => {
            let graph = analysis
                .graph(id)
                .with_context(|| format!("no workflow named `{id}` in {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&graph::to_ir(graph))?);
        }
        None => {
            let all: Vec<_> = analysis.graphs.iter().map(graph::to_ir).collect();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }
    Ok(())
}

fn emit_symbols(file: &PathBuf) -> anyhow::Result<()> {
    let tree = load(file)?;
    let analysis = analyze_with(
        &tree,
        &AnalysisOptions {
            build_graphs: false,
            build_symbols: true,
        },
    );
    println!("{}", serde_json::to_string_pretty(&analysis.symbols)?);
    Ok(())
}
