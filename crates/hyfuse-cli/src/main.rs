//! hyfuse CLI - Hybrid lexical and semantic search over a JSONL corpus.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use hyfuse_core::{Corpus, Embedder, HyfuseConfig, SearchResults};
use hyfuse_embed::{HashEmbedder, OnnxEmbedder};
use hyfuse_lexical::{load_jsonl_path, tokenize, Bm25Params, LexicalRanker};
use hyfuse_query::{index_corpus, HybridSearchEngine, SearchOptions};
use hyfuse_store::MemoryVectorIndex;

/// hyfuse - Hybrid BM25 and embedding search
#[derive(Parser)]
#[command(name = "hyfuse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/hyfuse/config.toml, then ./hyfuse.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a corpus
    Search {
        /// Path to the JSONL corpus
        corpus: PathBuf,

        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Lexical weight in [0, 1]
        #[arg(short, long)]
        alpha: Option<f64>,

        /// Lexical candidate pool size
        #[arg(long)]
        lexical_candidates: Option<usize>,

        /// Dense candidate pool size
        #[arg(long)]
        dense_candidates: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show corpus and index statistics
    Stats {
        /// Path to the JSONL corpus
        corpus: PathBuf,

        /// Terms to report the (floored) BM25 IDF for
        terms: Vec<String>,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&Path>) -> Result<HyfuseConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => HyfuseConfig::load(path)?,
        None => HyfuseConfig::load_default()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            corpus,
            query,
            top_k,
            alpha,
            lexical_candidates,
            dense_candidates,
            json,
        } => {
            let mut options = SearchOptions::from(&config.search);
            if let Some(top_k) = top_k {
                options = options.with_top_k(top_k);
            }
            if let Some(alpha) = alpha {
                options = options.with_alpha(alpha);
            }
            options = options.with_candidates(
                lexical_candidates.unwrap_or(options.lexical_candidates),
                dense_candidates.unwrap_or(options.dense_candidates),
            );

            search(&config, &corpus, &query, options, json).await?;
        }
        Commands::Stats { corpus, terms } => {
            stats(&config, &corpus, &terms)?;
        }
    }

    Ok(())
}

/// Use the configured ONNX model, or the hashing embedder when none is set
/// or it fails to load.
fn build_embedder(config: &HyfuseConfig) -> Arc<dyn Embedder> {
    let embedding = &config.embedding;
    if let (Some(model), Some(tokenizer)) = (embedding.model_file(), embedding.tokenizer_file()) {
        match OnnxEmbedder::with_config(&model, &tokenizer, embedding) {
            Ok(embedder) => return Arc::new(embedder),
            Err(e) => warn!("Falling back to hashing embedder: {}", e),
        }
    }
    Arc::new(HashEmbedder::with_dimension(embedding.dimension))
}

async fn search(
    config: &HyfuseConfig,
    corpus_path: &Path,
    query: &str,
    options: SearchOptions,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    options.validate()?;

    let (corpus, report) = load_jsonl_path(corpus_path)?;
    if report.skipped > 0 {
        eprintln!(
            "Skipped {} malformed record(s) in {}",
            report.skipped,
            corpus_path.display()
        );
    }
    let corpus = Arc::new(corpus);

    let embedder = build_embedder(config);
    let index = Arc::new(MemoryVectorIndex::new(embedder.dimension()));

    info!(
        "Indexing {} documents into collection '{}'",
        corpus.len(),
        config.index.collection
    );
    index_corpus(
        &corpus,
        embedder.as_ref(),
        index.as_ref(),
        config.embedding.batch_size,
        &config.index.source,
    )
    .await?;

    let ranker = LexicalRanker::new(Arc::clone(&corpus), Bm25Params::from(&config.lexical));
    let engine = HybridSearchEngine::new(Arc::new(ranker), embedder, index);

    let results = engine.search(query, options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results, &corpus);
    }

    Ok(())
}

fn print_results(results: &SearchResults, corpus: &Corpus) {
    if let Some(reason) = &results.dense_unavailable {
        eprintln!("Warning: dense retrieval unavailable, showing lexical results ({})", reason);
    }

    println!(
        "Found {} results in {}ms:\n",
        results.total_results, results.latency_ms
    );

    for hit in &results.results {
        println!(
            "---\n[{}] {} (score: {:.3}, lexical: {}, dense: {})",
            hit.rank,
            hit.id,
            hit.score,
            side_score(hit.lexical_score),
            side_score(hit.dense_score)
        );

        let text = corpus
            .document(&hit.id)
            .map(|doc| doc.text.as_str())
            .or_else(|| hit.metadata.get("full_text").and_then(|v| v.as_str()))
            .unwrap_or("");
        println!("{}", text);

        let extra: serde_json::Map<String, serde_json::Value> = hit
            .metadata
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "id" | "full_text"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if !extra.is_empty() {
            println!("{}", serde_json::Value::Object(extra));
        }
        println!();
    }
}

fn side_score(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{:.3}", score),
        None => "-".to_string(),
    }
}

fn stats(
    config: &HyfuseConfig,
    corpus_path: &Path,
    terms: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let (corpus, report) = load_jsonl_path(corpus_path)?;
    let ranker = LexicalRanker::new(corpus, Bm25Params::from(&config.lexical));
    let snapshot = ranker.snapshot();
    let index = snapshot.index();
    let params = index.params();

    println!("Statistics for {}:\n", corpus_path.display());
    println!("- Records accepted: {}", report.accepted);
    println!("- Records skipped: {}", report.skipped);
    println!("- Documents: {}", index.doc_count());
    println!("- Vocabulary: {} terms", index.vocabulary_size());
    println!("- Average length: {:.1} tokens", index.average_doc_length());
    println!(
        "- BM25: k1={}, b={}, epsilon={}",
        params.k1, params.b, params.epsilon
    );
    println!(
        "- Embedding: {}",
        match &config.embedding.model_path {
            Some(path) => format!("ONNX model at {}", path.display()),
            None => format!("hashing ({} dims)", config.embedding.dimension),
        }
    );

    let tokens: Vec<String> = terms.iter().flat_map(|t| tokenize(t)).collect();
    if !tokens.is_empty() {
        println!("\nIDF:\n");
        for token in tokens {
            match index.idf(&token) {
                Some(idf) => println!("- {}: {:.4}", token, idf),
                None => println!("- {}: not in vocabulary", token),
            }
        }
    }

    Ok(())
}
