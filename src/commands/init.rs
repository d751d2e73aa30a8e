//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::MetaDb;
use crate::store::QdrantStore;
use std::path::PathBuf;
use tracing::{info, warn};

/// Initialize curator: write the default config, create the metadata
/// database and try to set up the Qdrant collection.
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    if config.paths.config_file.exists() && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.config_file.display().to_string(),
        ));
    }

    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    let db = MetaDb::connect(&config).await?;
    db.init_schema().await?;
    info!("Created database at {:?}", config.paths.db_file);

    // Qdrant setup is best-effort; the collection can be created later
    // with 'curator db init'
    match QdrantStore::connect(&config).await {
        Ok(store) => match store.ensure_collection().await {
            Ok(_) => info!("Qdrant collection '{}' ready", config.collection_name),
            Err(e) => warn!(
                "Could not create Qdrant collection: {}. Run 'curator db init' later.",
                e
            ),
        },
        Err(e) => warn!(
            "Could not connect to Qdrant at {}: {}. Make sure Qdrant is running.",
            config.qdrant_url, e
        ),
    }

    Ok(config)
}

/// Print post-init guidance
pub fn print_init_summary(config: &Config) {
    println!("✓ Initialized curator at {:?}", config.paths.base_dir);
    println!("\nConfiguration: {:?}", config.paths.config_file);
    println!("Database: {:?}", config.paths.db_file);
    println!("\nNext steps:");
    println!("  1. Set your API key: export {}=sk-...", config.openai.api_key_env);
    println!("  2. Start Qdrant: docker run -p 6334:6334 qdrant/qdrant");
    println!("  3. Add content:");
    println!("     curator add url https://example.com/article");
    println!("     curator crawl https://example.com");
    println!("     curator search \"what did I save about X\"");
}
