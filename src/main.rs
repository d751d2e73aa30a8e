//! curator CLI entry point

use clap::{Parser, Subcommand};
use curator::{
    commands::{
        cmd_add_text, cmd_add_url, cmd_analyze, cmd_chat, cmd_chat_once, cmd_crawl, cmd_export,
        cmd_init, cmd_list, cmd_remove, cmd_search, cmd_status, print_analysis, print_chat_answer,
        print_crawl_stats, print_ingest_outcome, print_init_summary, print_items,
        print_remove_stats, print_search_results, print_status, write_export, ExportFormat,
        SearchOptions,
    },
    config::Config,
    embed::OpenAiEmbedder,
    error::Result,
    llm::LlmClient,
    meta::MetaDb,
    progress::ProgressLogWriter,
    store::QdrantStore,
};
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "curator")]
#[command(version, about = "Curate a searchable, chat-able library of web content", long_about = None)]
struct Cli {
    /// Base directory for config and data (default: ~/.curator)
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize curator configuration and databases
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Add a single piece of content to the library
    Add {
        /// Skip LLM summary generation (a text preview is stored instead)
        #[arg(long, global = true)]
        no_summary: bool,

        #[command(subcommand)]
        source: AddSource,
    },

    /// Crawl a website from a seed URL and ingest its pages
    Crawl {
        /// Seed URL to crawl from
        url: String,

        /// Maximum pages to fetch (capped at 20)
        #[arg(long)]
        max_pages: Option<u32>,

        /// Skip LLM summary generation (a text preview is stored instead)
        #[arg(long)]
        no_summary: bool,
    },

    /// Semantic search over the library
    Search {
        /// The search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score (0-1)
        #[arg(short, long)]
        min_score: Option<f32>,

        /// Filter by content type (web_page or text_document)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Chat with your library (interactive unless --question is given)
    Chat {
        /// Ask one question and exit instead of starting the REPL
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Analyze the library with the LLM
    Analyze {
        /// Also generate topic tags per item
        #[arg(long)]
        tags: bool,
    },

    /// List everything in the library
    List,

    /// Export the library inventory
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove an item by ID or URL
    Remove {
        /// Item ID or the URL it was added from
        id_or_url: String,
    },

    /// Show system status
    Status,

    /// Manage the Qdrant vector database
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum AddSource {
    /// Fetch and ingest a single URL
    Url {
        /// URL to fetch
        url: String,
    },

    /// Ingest text (from the argument, a file, or stdin)
    Text {
        /// The text itself (reads stdin when omitted and no --file given)
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Title for the document
        #[arg(short, long)]
        title: Option<String>,
    },
}

/// Database management actions
#[derive(Subcommand)]
enum DbAction {
    /// Create the Qdrant collection
    Init,

    /// Show Qdrant collection status
    Status,

    /// Reset the collection (delete all vectors and recreate)
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(ProgressLogWriter::default()))
        .with(filter)
        .init();

    // Init doesn't need an existing config
    if let Commands::Init { force } = &cli.command {
        let config = cmd_init(cli.data_dir, *force).await?;
        if cli.json {
            println!(
                r#"{{"status": "ok", "config": "{}"}}"#,
                config.paths.config_file.display()
            );
        } else {
            print_init_summary(&config);
        }
        return Ok(());
    }

    let mut config = Config::load_from(cli.data_dir)?;
    if !config.is_initialized() {
        return Err(curator::error::Error::NotInitialized);
    }

    let db = MetaDb::connect(&config).await?;
    let store = QdrantStore::connect(&config).await?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Add { source, no_summary } => {
            if no_summary {
                config.summary.enabled = false;
            }
            let embedder = OpenAiEmbedder::new(&config)?;
            let llm = make_llm(&config);

            let outcome = match source {
                AddSource::Url { url } => {
                    cmd_add_url(&config, &db, &store, &embedder, llm.as_ref(), &url).await?
                }
                AddSource::Text { text, file, title } => {
                    let text = read_text_input(text, file)?;
                    cmd_add_text(&config, &db, &store, &embedder, llm.as_ref(), title, &text)
                        .await?
                }
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_ingest_outcome(&outcome);
            }
        }

        Commands::Crawl {
            url,
            max_pages,
            no_summary,
        } => {
            if no_summary {
                config.summary.enabled = false;
            }
            let embedder = OpenAiEmbedder::new(&config)?;
            let llm = make_llm(&config);

            let stats = cmd_crawl(
                &config,
                &db,
                &store,
                &embedder,
                llm.as_ref(),
                &url,
                max_pages,
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_crawl_stats(&stats);
            }
        }

        Commands::Search {
            query,
            limit,
            min_score,
            content_type,
        } => {
            let embedder = OpenAiEmbedder::new(&config)?;
            let options = SearchOptions {
                limit,
                min_score,
                content_type,
            };

            let hits = cmd_search(&config, &db, &store, &embedder, &query, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                print_search_results(&query, &hits);
            }
        }

        Commands::Chat { question } => {
            let embedder = OpenAiEmbedder::new(&config)?;
            let llm = LlmClient::new(&config)?;

            match question {
                Some(question) => {
                    let answer =
                        cmd_chat_once(&config, &db, &store, &embedder, &llm, &question).await?;
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&answer)?);
                    } else {
                        print_chat_answer(&answer);
                    }
                }
                None => cmd_chat(&config, &db, &store, &embedder, &llm).await?,
            }
        }

        Commands::Analyze { tags } => {
            let llm = LlmClient::new(&config)?;
            let report = cmd_analyze(&config, &db, &llm, tags).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_analysis(&report);
            }
        }

        Commands::List => {
            let items = cmd_list(&db).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_items(&items);
            }
        }

        Commands::Export { format, output } => {
            let content = cmd_export(&db, format).await?;
            write_export(&content, output.as_deref())?;
        }

        Commands::Remove { id_or_url } => {
            let stats = cmd_remove(&db, &store, &id_or_url).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_remove_stats(&stats);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &db, &store).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Db { action } => {
            handle_db_action(&store, action, cli.json).await?;
        }
    }

    Ok(())
}

/// Build the LLM client if an API key is available. Summaries degrade
/// to text previews without it; embedding errors surface on their own.
fn make_llm(config: &Config) -> Option<LlmClient> {
    match LlmClient::new(config) {
        Ok(llm) => Some(llm),
        Err(e) => {
            warn!("Chat model unavailable: {}", e);
            None
        }
    }
}

fn read_text_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

async fn handle_db_action(store: &QdrantStore, action: DbAction, json: bool) -> Result<()> {
    match action {
        DbAction::Init => {
            store.ensure_collection().await?;
            if json {
                println!(r#"{{"status": "ok", "message": "Collection initialized"}}"#);
            } else {
                println!("✓ Qdrant collection initialized");
            }
        }
        DbAction::Status => match store.get_collection_info().await? {
            Some(info) => {
                if json {
                    println!(
                        r#"{{"exists": true, "points_count": {}, "indexed_vectors_count": {}, "status": "{}"}}"#,
                        info.points_count, info.indexed_vectors_count, info.status
                    );
                } else {
                    println!("Qdrant Collection Status:");
                    println!("  Status: {}", info.status);
                    println!("  Points: {}", info.points_count);
                    println!("  Indexed Vectors: {}", info.indexed_vectors_count);
                }
            }
            None => {
                if json {
                    println!(r#"{{"exists": false}}"#);
                } else {
                    println!("Collection does not exist. Run 'curator db init' to create it.");
                }
            }
        },
        DbAction::Reset { yes } => {
            if !yes {
                eprintln!("⚠️  This will delete ALL indexed vectors!");
                eprintln!("Run with --yes to confirm.");
                std::process::exit(1);
            }
            store.reset_collection().await?;
            if json {
                println!(r#"{{"status": "ok", "message": "Collection reset"}}"#);
            } else {
                println!("✓ Qdrant collection reset (all vectors deleted and collection recreated)");
            }
        }
    }

    Ok(())
}
