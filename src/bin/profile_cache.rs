use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use profile_cache::history::identity_by_query;
use profile_cache::{CacheConfig, HttpResolver, ProfileManager};

#[derive(Parser, Debug)]
#[command(name = "profile-cache")]
#[command(about = "Resolve player identifiers and names", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, default_value = "profile-cache.toml")]
    config: PathBuf,

    /// Overrides the cache file of the configuration
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Overrides the cache size bound of the configuration
    #[arg(long)]
    max_cache_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve identifiers or names through the cache
    Lookup {
        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// Print the name history of an identifier or name, oldest first
    History { query: String },

    /// Print the cached profiles
    List,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Cli::parse();

    let mut config = CacheConfig::load(&args.config).with_context(|| {
        format!("Failed to load configuration {}", args.config.display())
    })?;
    if let Some(cache_file) = args.cache_file {
        config.cache_file = cache_file;
    }
    if let Some(max_cache_size) = args.max_cache_size {
        config.max_cache_size = max_cache_size;
    }

    match args.command {
        Command::Lookup { queries } => {
            let manager = ProfileManager::from_config(&config)?;
            if let Err(e) = manager.load() {
                log::warn!("starting with an empty cache: {}", e);
            }

            for query in &queries {
                match manager.get_by_string(query) {
                    Some(profile) => println!("{}", profile),
                    None => eprintln!("{}: not found", query),
                }
            }

            manager.save()?;
        }
        Command::History { query } => {
            let resolver = HttpResolver::from_config(&config)?;
            let identity = identity_by_query(&resolver, &query)
                .map_err(|e| anyhow!("{}: {}", query, e))?;

            println!("{}", identity.id);
            for record in &identity.names {
                match record.changed_to_at {
                    Some(at) => println!("  {} (since {})", record.name, at),
                    None => println!("  {}", record.name),
                }
            }
        }
        Command::List => {
            let manager = ProfileManager::from_config(&config)?;
            manager.load()?;

            let mut profiles = manager.cache().snapshot();
            profiles.sort_by(|a, b| a.name.cmp(&b.name));
            for profile in profiles {
                println!("{}", profile);
            }
        }
    }

    Ok(())
}
