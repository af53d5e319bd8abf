//! Section Distance CLI
//!
//! Computes paragraph pair distances from the section outline of each page.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use section_distance::{
    config::Config,
    corpus::ParagraphCorpus,
    distance::{DistanceEngine, PairErrorPolicy, distance},
    lca::LcaResolver,
    logging::init_logging,
    persistence::{load_distance_file, results_exist, results_size, save_distances, save_passages},
    qrels::{paragraph_ids, read_qrels, sections_by_page},
    tree::{SectionTree, page_of},
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::warn;

/// Section Distance - paragraph distances from hierarchical page outlines
#[derive(Parser)]
#[command(name = "section-distance")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute distances for every paragraph pair of every page
    Distances {
        /// Path to the qrels label file
        #[arg(short, long)]
        qrels: Option<PathBuf>,

        /// Output path for the results (.json or .bin)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// What to do with a page when a pair fails (skip or abort)
        #[arg(long)]
        on_pair_error: Option<PairErrorPolicy>,
    },

    /// Print the section tree of one page
    Tree {
        /// Page identifier (first segment of its section paths)
        page: String,

        /// Path to the qrels label file
        #[arg(short, long)]
        qrels: Option<PathBuf>,
    },

    /// Show the lowest common ancestor and distance of two sections
    Lca {
        /// First section path
        sec1: String,

        /// Second section path (same page as the first)
        sec2: String,

        /// Path to the qrels label file
        #[arg(short, long)]
        qrels: Option<PathBuf>,
    },

    /// Resolve labeled paragraphs to plaintext from the corpus shards
    Passages {
        /// Path to the qrels label file
        #[arg(short, long)]
        qrels: Option<PathBuf>,

        /// Directory of corpus shards (plain or gzip JSON lines)
        #[arg(short, long)]
        corpus_dir: Option<PathBuf>,

        /// Output path for the passages JSON
        #[arg(short, long, default_value = "data/passages.json")]
        output: PathBuf,
    },

    /// Show information about a results file
    Info {
        /// Path to the results file
        #[arg(default_value = "data/para_distances.json")]
        results: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Distances {
            qrels,
            output,
            on_pair_error,
        } => cmd_distances(qrels, output, on_pair_error),
        Commands::Tree { page, qrels } => cmd_tree(page, qrels),
        Commands::Lca { sec1, sec2, qrels } => cmd_lca(sec1, sec2, qrels),
        Commands::Passages {
            qrels,
            corpus_dir,
            output,
        } => cmd_passages(qrels, corpus_dir, output),
        Commands::Info { results } => cmd_info(results),
    }
}

fn load_config(qrels: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if qrels.is_some() {
        config.data.qrels_path = qrels;
    }
    Ok(config)
}

fn cmd_distances(
    qrels: Option<PathBuf>,
    output: Option<PathBuf>,
    on_pair_error: Option<PairErrorPolicy>,
) -> Result<()> {
    let mut config = load_config(qrels)?;
    if let Some(output) = output {
        config.data.output = output;
    }
    if let Some(policy) = on_pair_error {
        config.batch.on_pair_error = policy;
    }
    config.validate().context("Invalid configuration")?;

    let start = Instant::now();
    let labels = read_qrels(config.require_qrels()?).context("Failed to read qrels")?;

    let engine = DistanceEngine::new()
        .with_policy(config.batch.on_pair_error)
        .with_progress_every(config.batch.progress_every);
    let outcome = engine.batch_page_distances(&labels);

    for failure in &outcome.page_failures {
        match &failure.pair {
            Some((p1, p2)) => warn!(page = %failure.page, %p1, %p2, error = %failure.error, "Page aborted"),
            None => warn!(page = %failure.page, error = %failure.error, "Page skipped"),
        }
    }

    save_distances(&outcome.distances, &config.data.output)
        .context("Failed to save distances")?;

    println!("\nParagraph Distances:");
    println!("  Pages:         {}", outcome.page_count());
    println!("  Pairs:         {}", outcome.pair_count());
    println!("  Failed pages:  {}", outcome.page_failures.len());
    println!("  Failed pairs:  {}", outcome.pair_failures.len());
    println!("  Time:          {:.2?}", start.elapsed());

    let size = results_size(&config.data.output)?;
    println!("\nResults saved to: {}", config.data.output.display());
    println!("  File size: {:.1} KB", size as f64 / 1024.0);

    Ok(())
}

fn build_page_tree(config: &Config, page: &str) -> Result<SectionTree> {
    let labels = read_qrels(config.require_qrels()?).context("Failed to read qrels")?;
    let sections = sections_by_page(&labels);
    let page_sections = sections
        .get(page)
        .with_context(|| format!("Page '{}' has no labeled paragraphs", page))?;

    SectionTree::build(page_sections)
        .with_context(|| format!("Failed to build section tree for '{}'", page))
}

fn cmd_tree(page: String, qrels: Option<PathBuf>) -> Result<()> {
    let config = load_config(qrels)?;
    let tree = build_page_tree(&config, &page)?;

    println!(
        "Page: {} ({} sections, max depth {})",
        tree.page_id(),
        tree.len(),
        tree.max_depth()
    );
    println!("{}", "─".repeat(50));
    print!("{}", tree.format());

    Ok(())
}

fn cmd_lca(sec1: String, sec2: String, qrels: Option<PathBuf>) -> Result<()> {
    let page = page_of(&sec1);
    if page != page_of(&sec2) {
        anyhow::bail!("'{}' and '{}' belong to different pages", sec1, sec2);
    }

    let config = load_config(qrels)?;
    let tree = build_page_tree(&config, page)?;

    let lca = LcaResolver::new(&tree)
        .lca_of_sections(&sec1, &sec2)
        .map(|id| tree.node(id).value.as_str())
        .unwrap_or("<none>");
    let d = distance(&sec1, &sec2, Some(&tree))?;

    println!("LCA of {} and {} is {}", sec1, sec2, lca);
    println!("Their distance is: {:.1}", d);

    Ok(())
}

fn cmd_passages(
    qrels: Option<PathBuf>,
    corpus_dir: Option<PathBuf>,
    output: PathBuf,
) -> Result<()> {
    let mut config = load_config(qrels)?;
    if corpus_dir.is_some() {
        config.data.corpus_dir = corpus_dir;
    }
    config.validate().context("Invalid configuration")?;

    let labels = read_qrels(config.require_qrels()?).context("Failed to read qrels")?;
    let wanted = paragraph_ids(&labels);

    let corpus = ParagraphCorpus::load_filtered(config.require_corpus_dir()?, &wanted)
        .context("Failed to load paragraph corpus")?;

    let missing = corpus.missing(&wanted);
    if !missing.is_empty() {
        warn!(count = missing.len(), "Paragraphs not found in corpus");
    }

    let found = corpus.len();
    if let Some(dir) = &corpus.path {
        println!("Corpus: {}", dir.display());
    }
    save_passages(&corpus.into_passages(), &output).context("Failed to save passages")?;

    println!("Resolved {} of {} paragraphs", found, wanted.len());
    println!("Passages saved to: {}", output.display());

    Ok(())
}

fn cmd_info(results: PathBuf) -> Result<()> {
    if !results_exist(&results) {
        anyhow::bail!(
            "Results not found at '{}'. Run 'distances' command first.",
            results.display()
        );
    }

    let file = load_distance_file(&results).context("Failed to load results")?;
    let size = results_size(&results)?;

    println!("Distance Results Information");
    println!("{}", "─".repeat(40));
    println!("  Pages:         {}", file.page_count());
    println!("  Pairs:         {}", file.pair_count());
    if let Some(max) = file.max_distance() {
        println!("  Max distance:  {:.1}", max);
    }
    println!("  File size:     {:.1} KB", size as f64 / 1024.0);
    println!("  Results path:  {}", results.display());

    Ok(())
}
