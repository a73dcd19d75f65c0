//! CLI entry point for `mailsleuth`.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use mailsleuth::config::{self, Config};
use mailsleuth::context;
use mailsleuth::corpus::{CorpusLoader, ScanOutcome};
use mailsleuth::error::SleuthError;
use mailsleuth::filter::{self, DateRange};
use mailsleuth::graph::{self, CommunicationGraph};
use mailsleuth::llm::{ChatSession, OllamaClient};

#[derive(Parser)]
#[command(name = "mailsleuth", version)]
#[command(about = "Forensic email corpus analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a corpus with the model backend and start interactive Q&A
    Analyze {
        /// Folder containing .eml/.mbox files
        folder: PathBuf,
        /// Start of the date range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: String,
        /// End of the date range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: String,
        /// Print the report and skip the interactive Q&A loop
        #[arg(long)]
        no_chat: bool,
    },
    /// Scan a corpus and report integrity counts
    Scan {
        /// Folder containing .eml/.mbox files
        folder: PathBuf,
    },
    /// Build the communication graph and print its statistics
    Graph {
        /// Folder containing .eml/.mbox files
        folder: PathBuf,
        /// Start of the date range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: String,
        /// End of the date range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: String,
        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    setup_logging(&log_level, &config);

    match cli.command {
        Commands::Analyze {
            folder,
            start,
            end,
            no_chat,
        } => cmd_analyze(&folder, &start, &end, no_chat, &config),
        Commands::Scan { folder } => cmd_scan(&folder),
        Commands::Graph {
            folder,
            start,
            end,
            json,
        } => cmd_graph(&folder, &start, &end, json, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailsleuth.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Scan a folder with a progress bar and print the integrity report.
fn scan_with_progress(folder: &Path) -> anyhow::Result<ScanOutcome> {
    let loader = CorpusLoader::new(folder)?;
    let total = loader.discover()?.len() as u64;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner} [{bar:40}] {pos}/{len} files")?
            .progress_chars("=> "),
    );

    let outcome = loader.scan(Some(&|done, _total| pb.set_position(done)))?;
    pb.finish_and_clear();

    println!(
        "Corpus: {} ({} records)",
        outcome.integrity_line(),
        outcome.records.len()
    );
    if !outcome.failures.is_empty() {
        println!("Skipped files:");
        for failure in &outcome.failures {
            println!("  {} — {}", failure.path.display(), failure.reason);
        }
    }

    Ok(outcome)
}

/// Filter, build the graph, and handle the empty-corpus condition.
fn build_filtered_graph(
    outcome: ScanOutcome,
    start: &str,
    end: &str,
    config: &Config,
) -> anyhow::Result<Option<(Vec<mailsleuth::model::record::MessageRecord>, CommunicationGraph)>> {
    let range = DateRange::parse(start, end)?;
    let filtered = filter::filter_by_range(outcome.records, &range);

    println!(
        "Date range {}: {} matching, {} out of range, {} undated (excluded)",
        range,
        filtered.records.len(),
        filtered.out_of_range,
        filtered.undated
    );

    match graph::build(&filtered.records, config.analysis.anomaly_k) {
        Ok(g) => Ok(Some((filtered.records, g))),
        Err(SleuthError::EmptyCorpus) => {
            println!("No emails match the specified date range.");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_analyze(
    folder: &Path,
    start: &str,
    end: &str,
    no_chat: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let outcome = scan_with_progress(folder)?;
    let Some((records, graph)) = build_filtered_graph(outcome, start, end, config)? else {
        return Ok(());
    };

    print_graph_text(&graph, config.analysis.top_connectors);

    let ctx = context::assemble(
        &records,
        &graph,
        config.analysis.context_budget,
        config.analysis.top_connectors,
    );

    println!("\nSending data to the model backend for analysis...\n");
    let client = OllamaClient::new(&config.model)?;
    let mut session = ChatSession::new(client);
    let report = session.initial_report(records.len(), &ctx)?;

    println!("======== Analysis Report ========\n");
    println!("{report}");

    if no_chat {
        return Ok(());
    }

    println!("\n======== Interactive Q&A ========");
    println!("Ask questions about the emails. Type 'exit' to quit.");
    loop {
        print!("\nQuestion: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit" | "q") {
            break;
        }
        match session.ask(question) {
            Ok(answer) => println!("\n{answer}"),
            Err(e) => println!("\nError: {e}"),
        }
    }
    println!("Exiting Q&A. Goodbye!");
    Ok(())
}

fn cmd_scan(folder: &Path) -> anyhow::Result<()> {
    let outcome = scan_with_progress(folder)?;
    let dated = outcome
        .records
        .iter()
        .filter(|r| r.timestamp.is_some())
        .count();
    println!(
        "Records: {} total, {} dated, {} undated",
        outcome.records.len(),
        dated,
        outcome.records.len() - dated
    );
    Ok(())
}

fn cmd_graph(
    folder: &Path,
    start: &str,
    end: &str,
    as_json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let outcome = scan_with_progress(folder)?;
    let Some((_, graph)) = build_filtered_graph(outcome, start, end, config)? else {
        return Ok(());
    };

    if as_json {
        let connectors: Vec<_> = graph
            .connectors()
            .into_iter()
            .map(|(address, degree)| json!({ "address": address, "degree": degree }))
            .collect();
        let payload = json!({
            "nodes": graph.nodes(),
            "edges": graph.edges(),
            "connectors": connectors,
            "burst_pairs": graph.burst_pairs(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_graph_text(&graph, config.analysis.top_connectors);
    }
    Ok(())
}

fn print_graph_text(graph: &CommunicationGraph, top: usize) {
    println!(
        "Graph: {} participants, {} messages",
        graph.node_count(),
        graph.edge_count()
    );
    println!("Top connectors:");
    for (address, degree) in graph.connectors().into_iter().take(top) {
        println!("  {address} (degree {degree})");
    }
    let flagged = graph.flagged_nodes();
    if !flagged.is_empty() {
        println!("Flagged participants:");
        for (address, flags) in flagged {
            let tags: Vec<String> = flags.iter().map(|f| f.to_string()).collect();
            println!("  {address}: {}", tags.join(", "));
        }
    }
    for (from, to) in graph.burst_pairs() {
        println!("Burst volume: {from} -> {to}");
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailsleuth", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}
