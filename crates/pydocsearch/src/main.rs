use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pydocsearch::core::SearchIndex;
use pydocsearch::local::config::{
    DEFAULT_BASE_URL_TEMPLATE, DEFAULT_INDEX_PAGE, DEFAULT_TIMEOUT_MS, DEFAULT_VERSION,
};
use pydocsearch::local::{DocsConfig, IndexCache, LocalFetcher};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pydocsearch")]
#[command(about = "Find the documentation URL for a keyword", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the best documentation URL for a keyword (exit 1 when not found).
    Search(SearchCmd),
    /// Dump every keyword with all candidate links and scores (to check consistency).
    Dump(DumpCmd),
    /// Dump `keyword best_link`, sorted by keyword (to diff).
    LightDump(LightDumpCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// Documentation version, e.g. 3.12.
    #[arg(long, default_value = DEFAULT_VERSION, value_parser = parse_doc_version)]
    version: String,
    /// Base documentation URL; `{version}` is replaced by --version.
    #[arg(long, env = "PYDOCSEARCH_BASE_URL", default_value = DEFAULT_BASE_URL_TEMPLATE)]
    base_url: String,
    /// Index page, relative to the base URL.
    #[arg(long, env = "PYDOCSEARCH_INDEX_PAGE", default_value = DEFAULT_INDEX_PAGE)]
    index_page: String,
    /// Fetch timeout (ms).
    #[arg(long, env = "PYDOCSEARCH_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
}

impl SourceArgs {
    fn config(&self) -> DocsConfig {
        DocsConfig {
            base_url_template: self.base_url.clone(),
            index_page: self.index_page.clone(),
            timeout_ms: self.timeout_ms,
        }
    }

    async fn load(&self) -> Result<Arc<SearchIndex>> {
        let cache = IndexCache::new(LocalFetcher::new()?, self.config());
        cache
            .load(&self.version)
            .await
            .with_context(|| format!("loading documentation index for version {}", self.version))
    }
}

#[derive(clap::Args, Debug)]
struct SearchCmd {
    /// Keyword to look up (case-insensitive).
    keyword: String,
    #[command(flatten)]
    source: SourceArgs,
    /// Output format: text|json
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct DumpCmd {
    #[command(flatten)]
    source: SourceArgs,
    /// Output format: text|json
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct LightDumpCmd {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

/// Version identifiers are digits and dots only (`3`, `3.12`, `2.7.18`).
fn parse_doc_version(s: &str) -> std::result::Result<String, String> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        Ok(s.to_string())
    } else {
        Err(format!("{s:?} does not look like a version"))
    }
}

fn init_tracing() {
    // stdout carries results; logs go to stderr.
    let filter = EnvFilter::try_from_env("PYDOCSEARCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn print_dump(index: &SearchIndex) {
    for entry in index.entries() {
        println!("{}", entry.keyword());
        for (link, weight) in entry.candidates() {
            let marker = if Some(link.as_str()) == entry.best_link() {
                " -> "
            } else {
                " -- "
            };
            println!("{marker} {link} {weight:.2}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Search(args) => {
            let index = args.source.load().await?;
            let url = index.lookup(&args.keyword);
            match args.output.to_ascii_lowercase().as_str() {
                "json" => {
                    let v = serde_json::json!({
                        "schema_version": 1,
                        "kind": "search",
                        "ok": url.is_some(),
                        "keyword": args.keyword,
                        "version": args.source.version,
                        "url": url,
                    });
                    println!("{v}");
                }
                _ => match &url {
                    Some(u) => println!("{u}"),
                    None => eprintln!("no documentation found for {:?}", args.keyword),
                },
            }
            if url.is_none() {
                std::process::exit(1);
            }
        }
        Commands::Dump(args) => {
            let index = args.source.load().await?;
            match args.output.to_ascii_lowercase().as_str() {
                "json" => {
                    let v = serde_json::json!({
                        "schema_version": 1,
                        "kind": "dump",
                        "version": args.source.version,
                        "keywords": index.len(),
                        "index": &*index,
                    });
                    println!("{v}");
                }
                _ => print_dump(&index),
            }
        }
        Commands::LightDump(args) => {
            let index = args.source.load().await?;
            for entry in index.entries() {
                if let Some(best) = entry.best_link() {
                    println!("{} {}", entry.keyword(), best);
                }
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "pydocsearch",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("pydocsearch {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }
    Ok(())
}
