//! Stash CLI - collect and search saved content from Reddit and X.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stash::reddit::ItemFilter;
use stash::{
    CollectOptions, CredentialStore, Pipeline, PipelineConfig, Platform, SavedPost, SearchOptions,
};

/// Stash CLI - collect Reddit saves and X bookmarks into one searchable list.
#[derive(Parser)]
#[command(name = "stash")]
#[command(about = "Saved-content collection and search")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    Reddit,
    X,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Reddit => Platform::Reddit,
            PlatformArg::X => Platform::X,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    All,
    Posts,
    Comments,
}

impl From<FilterArg> for ItemFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => ItemFilter::All,
            FilterArg::Posts => ItemFilter::Posts,
            FilterArg::Comments => ItemFilter::Comments,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect saved items from a platform
    Fetch {
        /// Platform to collect from
        #[arg(value_enum)]
        platform: PlatformArg,

        /// Maximum number of items to return
        #[arg(long)]
        limit: Option<usize>,

        /// Hard cap on pages fetched
        #[arg(long, default_value = "50")]
        max_pages: usize,

        /// Reddit only: keep only posts or only comments
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,

        /// Print full JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,
    },

    /// Collect then fuzzy-search saved items
    Search {
        /// Platform to search
        #[arg(value_enum)]
        platform: PlatformArg,

        /// Search terms
        #[arg(required = true)]
        queries: Vec<String>,

        /// Match any term instead of requiring all terms
        #[arg(long)]
        any: bool,

        /// Edit-distance tolerance (0 disables fuzzy matching)
        #[arg(long, default_value = "2")]
        fuzzy: u32,

        /// Maximum results
        #[arg(long)]
        limit: Option<usize>,

        /// Reddit only: restrict to one subreddit
        #[arg(long)]
        subreddit: Option<String>,

        /// Print full JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,
    },

    /// Check whether stored credentials are still valid
    Auth {
        /// Platform to check
        #[arg(value_enum)]
        platform: PlatformArg,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("stash=debug,info")
    } else {
        EnvFilter::new("stash=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Fetch {
            platform,
            limit,
            max_pages,
            filter,
            json,
            headed,
        } => {
            run_fetch(
                platform.into(),
                limit,
                max_pages,
                filter.into(),
                json,
                headed,
            )
            .await
        }
        Commands::Search {
            platform,
            queries,
            any,
            fuzzy,
            limit,
            subreddit,
            json,
            headed,
        } => {
            let options = SearchOptions {
                match_all: !any,
                fuzzy_threshold: fuzzy,
                limit,
                subreddit,
            };
            run_search(platform.into(), queries, options, json, headed).await
        }
        Commands::Auth { platform, headed } => run_auth(platform.into(), headed).await,
    }
}

async fn run_fetch(
    platform: Platform,
    limit: Option<usize>,
    max_pages: usize,
    filter: ItemFilter,
    json: bool,
    headed: bool,
) -> Result<()> {
    let pipeline = build_pipeline(platform, limit, max_pages, headed)?;
    let posts = pipeline.collect(platform, filter, false).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
    } else {
        print_posts(&posts);
        println!("\nTotal: {} items", posts.len());
    }
    Ok(())
}

async fn run_search(
    platform: Platform,
    queries: Vec<String>,
    options: SearchOptions,
    json: bool,
    headed: bool,
) -> Result<()> {
    println!("🔍 Searching {platform} for: {}\n", queries.join(" "));

    let pipeline = build_pipeline(platform, None, 50, headed)?;
    let results = pipeline.search(platform, &queries, &options, false).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    print_posts(&results);
    println!("\nFound: {} results", results.len());
    Ok(())
}

async fn run_auth(platform: Platform, headed: bool) -> Result<()> {
    println!("🔐 Checking {platform} credentials...\n");

    let pipeline = build_pipeline(platform, None, 1, headed)?;
    if pipeline.validate(platform).await? {
        println!("{} Session is valid", "✅".green());
    } else {
        println!(
            "{} Session rejected - export fresh cookies from your browser",
            "❌".red()
        );
    }
    Ok(())
}

/// Build a pipeline configured for one platform from environment variables.
fn build_pipeline(
    platform: Platform,
    limit: Option<usize>,
    max_pages: usize,
    headed: bool,
) -> Result<Pipeline> {
    let config = PipelineConfig {
        headless: !headed,
        collect: CollectOptions {
            limit,
            max_pages,
            ..CollectOptions::default()
        },
        ..PipelineConfig::default()
    };

    let pipeline = Pipeline::new(config);
    match platform {
        Platform::Reddit => {
            let username = std::env::var("REDDIT_USERNAME")
                .map_err(|_| anyhow::anyhow!("REDDIT_USERNAME not set"))?;
            let credentials = load_credentials(
                "REDDIT_COOKIES_FILE",
                "REDDIT_COOKIES",
                ".reddit_cookies.txt",
                stash::reddit::COOKIE_DOMAINS,
                stash::reddit::TARGET_DOMAIN,
            )?;
            Ok(pipeline.with_reddit(username, credentials))
        }
        Platform::X => {
            let credentials = load_credentials(
                "X_COOKIES_FILE",
                "X_COOKIES",
                ".x_cookies.txt",
                stash::x::COOKIE_DOMAINS,
                stash::x::TARGET_DOMAIN,
            )?;
            Ok(pipeline.with_x(credentials))
        }
    }
}

/// Load credentials from a file env var, a JSON env var, or a default
/// home-directory location, in that order.
fn load_credentials(
    file_var: &str,
    json_var: &str,
    default_name: &str,
    domains: &[&str],
    target_domain: &str,
) -> Result<CredentialStore> {
    if let Ok(path) = std::env::var(file_var) {
        return Ok(CredentialStore::from_cookie_file(
            &PathBuf::from(path),
            domains,
            target_domain,
        )?);
    }

    if let Ok(json) = std::env::var(json_var) {
        return Ok(CredentialStore::from_cookie_json(&json, target_domain)?);
    }

    if let Some(default_path) = dirs::home_dir().map(|home| home.join(default_name)) {
        if default_path.exists() {
            return Ok(CredentialStore::from_cookie_file(
                &default_path,
                domains,
                target_domain,
            )?);
        }
    }

    anyhow::bail!(
        "No cookies found. Set {file_var} to a cookies file path, {json_var} to a JSON \
         array of cookies, or place cookies at ~/{default_name}"
    )
}

fn print_posts(posts: &[SavedPost]) {
    for post in posts {
        let handle = format!("@{}", post.author.username);
        println!(
            "🔖 {} {} ({})",
            post.id,
            handle.as_str().cyan(),
            post.created_at.format("%Y-%m-%d")
        );
        println!("   {}", truncate_preview(&clean_text(&post.content)));
        println!("   {}\n", post.url.as_str().bright_black());
    }
}

/// Normalize common unicode punctuation so previews render cleanly in any
/// terminal.
fn clean_text(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2014}', '\u{2013}'], "-")
        .replace('\u{2026}', "...")
        .replace('\n', " ")
}

/// Truncate text for preview, respecting UTF-8 character boundaries.
fn truncate_preview(text: &str) -> String {
    const MAX_CHARS: usize = 120;

    let char_count = text.chars().count();
    if char_count <= MAX_CHARS {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(MAX_CHARS).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_preview_respects_char_boundaries() {
        let short = "short text";
        assert_eq!(truncate_preview(short), short);

        let long = "é".repeat(200);
        let preview = truncate_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 123);
    }

    #[test]
    fn clean_text_normalizes_punctuation() {
        assert_eq!(clean_text("it\u{2019}s \u{201c}fine\u{201d}"), "it's \"fine\"");
        assert_eq!(clean_text("line\nbreak"), "line break");
    }
}
