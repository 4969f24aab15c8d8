//! feedkeeper - load an image feed, falling back to a local cache offline

use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

use feedkeeper::cache::{FeedCachePolicy, FeedStore, FileStore};
use feedkeeper::cli::{Cli, Command};
use feedkeeper::data::{FeedRecord, ImageComment};
use feedkeeper::http::{HttpClient, ReqwestHttpClient};
use feedkeeper::{Composer, Config, LoaderExt};

fn print_feed(items: &[FeedRecord]) {
    if items.is_empty() {
        println!("Feed is empty");
        return;
    }
    for item in items {
        println!(
            "{}  {}  {}  {}",
            item.id,
            item.description.as_deref().unwrap_or("-"),
            item.location.as_deref().unwrap_or("-"),
            item.image_url
        );
    }
}

fn print_comments(comments: &[ImageComment]) {
    if comments.is_empty() {
        println!("No comments");
        return;
    }
    for comment in comments {
        println!(
            "{}  {}: {}",
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.username,
            comment.message
        );
    }
}

fn write_image(data: &[u8], output: Option<&Path>) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, data)?;
            println!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => println!("Loaded {} bytes", data.len()),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::from_cli(&cli)?;
    tracing::debug!(?config, "starting");

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(client, Handle::current()));
    let store = Arc::new(FileStore::with_dir(config.cache_dir.clone()));
    let composer = Composer::new(http, store, config.base_url.clone(), Handle::current())
        .with_policy(FeedCachePolicy::with_max_age(config.max_cache_age));

    match cli.command {
        Command::Feed { after: None } => {
            let loader = composer.feed_loader();
            let items = loader.load_future(composer.feed_url(None)).await?;
            print_feed(&items);
        }
        Command::Feed { after } => {
            let loader = composer.feed_page_loader();
            let items = loader.load_future(composer.feed_url(after)).await?;
            print_feed(&items);
        }
        Command::Image { url, output } => {
            let loader = composer.image_loader();
            let data = loader.load_future(url).await?;
            write_image(&data, output.as_deref())?;
        }
        Command::Comments { image_id } => {
            let loader = composer.comments_loader();
            let comments = loader.load_future(composer.comments_url(image_id)).await?;
            print_comments(&comments);
        }
        Command::Validate => {
            let loader = composer.local_feed_loader();
            tokio::task::spawn_blocking(move || loader.validate_cache()).await??;
            println!("Feed cache validated");
        }
        Command::Clear => {
            let store = Arc::clone(composer.store());
            tokio::task::spawn_blocking(move || store.delete()).await??;
            println!("Feed cache cleared");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            let mut source = error.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
