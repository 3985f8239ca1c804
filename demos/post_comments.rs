//! Fetch every post with its comments and print them.
//!
//! Usage: cargo run --example post_comments
//!
//! Set `FANFOLD_BASE_URL` (or put it in `.env`) to point at another
//! JSONPlaceholder-compatible API. `RUST_LOG=fanfold=debug` shows per-fetch logs.

use std::time::Instant;

use fanfold::{Config, ParentId, PostWithComments, fetch_posts_with_comments};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fanfold=info")),
        )
        .init();

    let mut config = Config::default();
    if let Ok(base_url) = std::env::var("FANFOLD_BASE_URL") {
        config.source.base_url = base_url;
    }

    let started = Instant::now();
    let result = fetch_posts_with_comments(&config).await?;
    let errors = result.errors().clone();

    for post in result.into_ordered().into_iter().map(PostWithComments::from) {
        println!("{} {}", post.post.id, post.post.title);
        println!("===========================");
        match errors.get(&ParentId(post.post.id)) {
            Some(error) => println!("Comments unavailable: {}", error.message),
            None => {
                println!("Comments:");
                for comment in &post.comments {
                    println!("\t{} {}", comment.id, comment.body);
                }
            }
        }
    }

    println!("Time taken: {:?}", started.elapsed());
    Ok(())
}
