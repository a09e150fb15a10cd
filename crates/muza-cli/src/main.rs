mod engine;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use muza_core::{ContentType, Emotion, ProgressionContext};
use muza_store::resolve_data_dir;
use rmcp::{ServiceExt, transport::stdio};

use crate::engine::{Engine, NodeSummary};

#[derive(Parser)]
#[command(name = "muza", about = "Associative word memory engine CLI and MCP server")]
struct Cli {
    /// Data directory (default: $MUZA_DATA_DIR or ~/.muza)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport with physics and persistence running
    Serve,

    /// Learn text into memory
    Learn {
        /// Text to learn
        text: String,

        /// Content type tag (GENERAL, CODE, QUESTION, ...)
        #[arg(long = "type", value_parser = parse_content_type, default_value = "GENERAL")]
        content_type: ContentType,

        /// Emotion tag (NEUTRAL, HAPPY, CURIOUS, ...)
        #[arg(long, value_parser = parse_emotion, default_value = "NEUTRAL")]
        emotion: Emotion,

        /// Boost resonant nodes even when the word is absent
        #[arg(long)]
        adaptive: bool,

        /// Progression unlocks (repeatable); "adaptive_memory" enables adaptive mode
        #[arg(long = "unlock")]
        unlocked: Vec<String>,

        /// Logic skill level; 3 or more enables adaptive mode
        #[arg(long, default_value_t = 0)]
        logic_skill: u32,
    },

    /// Rank learned words by similarity to a query
    Search {
        query: String,

        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },

    /// Look up a high-energy memory matching the query
    Recall { query: String },

    /// Walk the association graph from a seed word
    Generate {
        seed: String,

        #[arg(long, default_value_t = 10)]
        length: usize,
    },

    /// List the most energetic nodes
    Active {
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// List every node instead of the top `count`
        #[arg(long)]
        all: bool,
    },

    /// Advance the physics simulation immediately
    Simulate {
        #[arg(long, default_value_t = 100)]
        ticks: usize,
    },

    /// Show memory statistics
    Stats,

    /// Export the graph to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Replace the graph with a JSON file
    Import {
        /// Input file path
        path: PathBuf,
    },
}

fn parse_content_type(s: &str) -> std::result::Result<ContentType, String> {
    s.parse()
}

fn parse_emotion(s: &str) -> std::result::Result<Emotion, String> {
    s.parse()
}

fn open_engine(cli: &Cli) -> Result<Engine> {
    let data_dir = resolve_data_dir(cli.data_dir.as_deref());
    Engine::open(&data_dir).with_context(|| format!("failed to open {}", data_dir.display()))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve => cmd_serve(&cli).await,
        command => {
            let engine = open_engine(&cli)?;
            run_command(&engine, command).await?;
            engine.stop().await.context("failed to save memory")?;
            Ok(())
        }
    }
}

/// One-shot commands: load, act, then the caller prunes and persists.
async fn run_command(engine: &Engine, command: &Commands) -> Result<()> {
    match command {
        Commands::Serve => anyhow::bail!("serve is not a one-shot command"),
        Commands::Learn {
            text,
            content_type,
            emotion,
            adaptive,
            unlocked,
            logic_skill,
        } => {
            let progression = ProgressionContext {
                unlocked_nodes: unlocked.clone(),
                logic_skill: *logic_skill,
            };
            let adaptive = *adaptive || progression.adaptive_memory_active();
            cmd_learn(engine, text, adaptive, *content_type, *emotion).await
        }
        Commands::Search { query, top_k } => cmd_search(engine, query, *top_k).await,
        Commands::Recall { query } => cmd_recall(engine, query).await,
        Commands::Generate { seed, length } => cmd_generate(engine, seed, *length).await,
        Commands::Active { count, all } => cmd_active(engine, *count, *all).await,
        Commands::Simulate { ticks } => cmd_simulate(engine, *ticks).await,
        Commands::Stats => cmd_stats(engine).await,
        Commands::Export { path } => cmd_export(engine, path).await,
        Commands::Import { path } => cmd_import(engine, path).await,
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let engine = Arc::new(open_engine(cli)?);
    engine.start();
    tracing::info!(
        tick_ms = engine.config().tick_interval_ms,
        "starting MCP server"
    );

    let server = server::MuzaServer::new(engine.clone());
    match server.serve(stdio()).await {
        Ok(service) => {
            tokio::select! {
                result = service.waiting() => {
                    if let Err(e) = result {
                        tracing::warn!("MCP service ended with error: {e}");
                    }
                }
                _ = shutdown_signal() => tracing::info!("shutdown signal received"),
            }
        }
        // Stdin closed before the handshake finished.
        Err(e) => tracing::info!("MCP session not established: {e}"),
    }

    let saved = engine.stop().await.context("failed to save memory")?;
    tracing::info!(nodes = saved, "final snapshot written");
    Ok(())
}

fn print_nodes(nodes: &[NodeSummary]) {
    if nodes.is_empty() {
        println!("(no memories)");
        return;
    }
    for node in nodes {
        match node.similarity {
            Some(sim) => println!(
                "{:<20} sim={:.3} energy={:.2} type={} emotion={}",
                node.id, sim, node.energy, node.content_type, node.emotion
            ),
            None => println!(
                "{:<20} energy={:.2} type={} emotion={} links={} seen={}",
                node.id,
                node.energy,
                node.content_type,
                node.emotion,
                node.associations,
                node.last_access
            ),
        }
    }
}

async fn cmd_learn(
    engine: &Engine,
    text: &str,
    adaptive: bool,
    content_type: ContentType,
    emotion: Emotion,
) -> Result<()> {
    let report = engine.learn(text, adaptive, content_type, emotion).await;
    println!(
        "learned {} tokens: {} new, {} reinforced, {} resonated, {} links",
        report.tokens, report.created, report.reinforced, report.resonated, report.links
    );
    Ok(())
}

async fn cmd_search(engine: &Engine, query: &str, top_k: usize) -> Result<()> {
    print_nodes(&engine.search(query, top_k).await);
    Ok(())
}

async fn cmd_recall(engine: &Engine, query: &str) -> Result<()> {
    match engine.recall(query).await {
        Some(id) => println!("{id}"),
        None => println!("(no recall)"),
    }
    Ok(())
}

async fn cmd_generate(engine: &Engine, seed: &str, length: usize) -> Result<()> {
    match engine.generate(seed, length).await {
        Some(text) => println!("{text}"),
        None => println!("(not found: {seed})"),
    }
    Ok(())
}

async fn cmd_active(engine: &Engine, count: usize, all: bool) -> Result<()> {
    if all {
        let nodes: Vec<NodeSummary> = engine
            .nodes()
            .await
            .iter()
            .map(|n| NodeSummary::from_node(n, None))
            .collect();
        print_nodes(&nodes);
    } else {
        print_nodes(&engine.most_active(count).await);
    }
    Ok(())
}

async fn cmd_simulate(engine: &Engine, ticks: usize) -> Result<()> {
    let report = engine.simulate(ticks).await;
    println!(
        "simulated {ticks} ticks over {} nodes, {} resets",
        report.nodes, report.resets
    );
    Ok(())
}

async fn cmd_stats(engine: &Engine) -> Result<()> {
    let stats = engine.stats().await;
    println!("nodes:        {}", stats.nodes);
    println!("associations: {}", stats.associations);
    println!("energy:       total={:.2}, mean={:.3}", stats.total_energy, stats.mean_energy);
    Ok(())
}

async fn cmd_export(engine: &Engine, path: &Path) -> Result<()> {
    let json = engine.export_json().await?;
    std::fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;
    println!("exported to {}", path.display());
    Ok(())
}

async fn cmd_import(engine: &Engine, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let nodes = engine.import_json(&json).await.context("failed to import JSON")?;
    println!("imported from {}. nodes={nodes}", path.display());
    Ok(())
}
