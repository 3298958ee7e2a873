//! Chemref Ingest - reference classification lookup tool

use anyhow::Result;
use chemref_common::logging::{init_logging, LogConfig, LogLevel};
use chemref_ingest::atc::AtcProvider;
use chemref_ingest::cache::DatasetCache;
use chemref_ingest::config::IngestConfig;
use chemref_ingest::fetch::HttpFetcher;
use chemref_ingest::psimod::PsiModProvider;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "chemref-ingest")]
#[command(author, version, about = "Chemical reference classification tool")]
struct Cli {
    /// Dataset to query
    #[command(subcommand)]
    dataset: Dataset,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Cache directory (overrides CHEMREF_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Ignore cached datasets and refetch
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand, Debug)]
enum Dataset {
    /// ATC classification
    Atc {
        #[command(subcommand)]
        query: AtcQuery,
    },

    /// PSI-MOD protein modification ontology
    Psimod {
        #[command(subcommand)]
        query: PsiModQuery,
    },
}

#[derive(Subcommand, Debug)]
enum AtcQuery {
    /// Report version and completeness of the loaded classification
    Check,

    /// Preferred labels
    Name { ids: Vec<String> },

    /// Code and name lineages, top-level group first
    Lineage { ids: Vec<String> },

    /// Breadth-first tree records
    Tree {
        /// Restrict output to these codes and their lineages
        #[arg(short, long)]
        filter: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum PsiModQuery {
    /// Report version and completeness of the loaded ontology
    Check,

    /// Term names
    Name { ids: Vec<String> },

    /// All ancestors across every relation
    Ancestors { ids: Vec<String> },

    /// Terms without parents
    Roots,

    /// Terms plus ancestors, each with all direct parents
    Tree { ids: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("chemref-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let mut config = IngestConfig::from_env()?;
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }
    if cli.no_cache {
        config.use_cache = false;
    }
    config.validate()?;

    let fetcher =
        HttpFetcher::new(config.timeout_secs, config.max_retries, &config.user_agent)?.with_progress(true);
    let cache = DatasetCache::on_disk(&config.cache_dir);

    let output = match cli.dataset {
        Dataset::Atc { query } => {
            let atc = AtcProvider::load(&config, &fetcher, &cache).await?;
            atc_query(&atc, query)?
        },
        Dataset::Psimod { query } => {
            let psimod = PsiModProvider::load(&config, &fetcher, &cache).await?;
            psimod_query(&psimod, query)
        },
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    info!("Query complete");
    Ok(())
}

fn atc_query(atc: &AtcProvider, query: AtcQuery) -> Result<Value> {
    let value = match query {
        AtcQuery::Check => json!({
            "version": atc.version(),
            "names": atc.data().names.len(),
            "parents": atc.data().parents.len(),
            "complete": atc.test_cache(),
        }),
        AtcQuery::Name { ids } => Value::Array(
            ids.iter()
                .map(|id| json!({"id": id, "name": atc.atc_name(id)}))
                .collect(),
        ),
        AtcQuery::Lineage { ids } => {
            let mut rows = Vec::with_capacity(ids.len());
            for id in &ids {
                rows.push(json!({
                    "id": id,
                    "ids": atc.id_lineage(id)?,
                    "names": atc.name_lineage(id)?,
                }));
            }
            Value::Array(rows)
        },
        AtcQuery::Tree { filter } => {
            let filter: HashSet<String> = filter.into_iter().collect();
            let filter = (!filter.is_empty()).then_some(&filter);
            serde_json::to_value(atc.tree_node_list(filter)?)?
        },
    };
    Ok(value)
}

fn psimod_query(psimod: &PsiModProvider, query: PsiModQuery) -> Value {
    match query {
        PsiModQuery::Check => json!({
            "version": psimod.version(),
            "nodes": psimod.graph().node_count(),
            "edges": psimod.graph().edge_count(),
            "complete": psimod.test_cache(),
        }),
        PsiModQuery::Name { ids } => Value::Array(
            ids.iter()
                .map(|id| json!({"id": id, "name": psimod.name(id)}))
                .collect(),
        ),
        PsiModQuery::Ancestors { ids } => Value::Array(
            ids.iter()
                .map(|id| {
                    let ancestors: Vec<Value> = psimod
                        .ancestors(id, false)
                        .into_iter()
                        .map(|(id, name)| json!({"id": id, "name": name}))
                        .collect();
                    json!({"id": id, "ancestors": ancestors})
                })
                .collect(),
        ),
        PsiModQuery::Roots => json!(psimod.root_nodes()),
        PsiModQuery::Tree { ids } => json!(psimod.export_tree_node_list(&ids)),
    }
}
