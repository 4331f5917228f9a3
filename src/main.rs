use crate::config::Settings;
use crate::db::connection::{init_db, Database};
use crate::pipeline::Pipeline;
use crate::sources::SourceRegistry;
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod db;
mod domain;
mod errors;
mod pipeline;
mod scraper;
mod sources;

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "immo_scraper", about = "Real-estate listing scraper")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema and register every known source
    Init,
    /// Manage saved search links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },
    /// Crawl saved searches and write the aggregated URL CSV
    Discover {
        /// Result pages to walk per search link
        #[arg(short = 'n', long, default_value_t = 3)]
        max_pages: usize,
    },
    /// Scrape listings from an aggregated URL CSV into the database
    Extract {
        /// CSV to read (defaults to the artifact path)
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Discover, then extract
    Run {
        /// Result pages to walk per search link
        #[arg(short = 'n', long, default_value_t = 3)]
        max_pages: usize,
    },
    /// Parse a single ad page and print it as JSON, without storing it
    Parse {
        /// Ad URL (http(s):// or file://)
        url: String,
        #[arg(long, default_value = "SeLoger")]
        source: String,
    },
    /// List stored listings still waiting for enrichment
    Pending,
}

#[derive(Subcommand)]
enum LinkAction {
    /// Save a search URL for a source
    Add {
        url: String,
        #[arg(long)]
        source: String,
    },
    /// Show saved search URLs
    List,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    // 1️⃣ Open the database and make sure the schema exists
    let db = Database::new(&settings.db_path);
    init_db(&db).with_context(|| {
        format!("Database initialization failed at {}", settings.db_path.display())
    })?;

    // 2️⃣ Every website we can scrape
    let registry = SourceRegistry::with_defaults(settings.source_settings());

    match cli.command {
        Commands::Init => {
            for name in registry.names() {
                db::search_links::add_source(&db, name)?;
            }
            let sources = db::search_links::list_sources(&db)?;
            println!("Database ready at {}", settings.db_path.display());
            println!("Sources: {}", sources.join(", "));
        }
        Commands::Links { action } => match action {
            LinkAction::Add { url, source } => {
                if registry.resolve(&source).is_none() {
                    tracing::warn!(source = %source, "No scraper implemented for this source yet");
                }
                let id = db::search_links::add_search_link(&db, &url, &source)?;
                println!("Saved search link #{id} ({source})");
            }
            LinkAction::List => {
                let links = db::search_links::list_search_links(&db)?;
                if links.is_empty() {
                    println!("No search links. Add one with `links add <url> --source <name>`.");
                }
                for link in links {
                    println!("{:>4} | {:<10} | {}", link.id, link.source_name, link.url);
                }
            }
        },
        Commands::Discover { max_pages } => {
            let mut pipeline = Pipeline::new(&db, &registry).with_artifact(&settings.artifact_path);
            let refs = pipeline.discover(max_pages);
            println!(
                "Collected {} unique ad URLs into {}",
                refs.len(),
                settings.artifact_path.display()
            );
        }
        Commands::Extract { from } => {
            let path = from.unwrap_or_else(|| settings.artifact_path.clone());
            let mut pipeline = Pipeline::new(&db, &registry);
            pipeline
                .extract_from_artifact(&path)
                .with_context(|| format!("Could not read {}", path.display()))?;
            print_report(&pipeline.finish());
        }
        Commands::Run { max_pages } => {
            let report = Pipeline::new(&db, &registry)
                .with_artifact(&settings.artifact_path)
                .run(max_pages);
            print_report(&report);
        }
        Commands::Parse { url, source } => {
            let scraper = registry
                .resolve(&source)
                .ok_or_else(|| anyhow!("No scraper implemented for source '{source}'"))??;
            let listing = scraper.fetch_record(&url)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Commands::Pending => {
            let pending = db::listings::list_untreated(&db)?;
            let total = db::listings::count_listings(&db)?;
            for p in &pending {
                let price = p.price.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
                println!(
                    "{:>5} | {:<20} | {:>10} | {} | {}",
                    p.id,
                    p.city.as_deref().unwrap_or("-"),
                    price,
                    p.title.as_deref().unwrap_or("-"),
                    p.url
                );
            }
            println!("{} of {} listings awaiting enrichment", pending.len(), total);
        }
    }

    Ok(())
}

fn print_report(report: &domain::listing::RunReport) {
    println!("Search links:      {}", report.search_links);
    println!("  skipped:         {}", report.search_links_skipped);
    println!("Ad URLs:           {}", report.discovered);
    println!("  inserted:        {}", report.inserted);
    println!("  already in DB:   {}", report.already_stored);
    println!("  fetch failed:    {}", report.fetch_failed);
    println!("  persist failed:  {}", report.persist_failed);
    println!("  unknown source:  {}", report.unknown_source);
}
