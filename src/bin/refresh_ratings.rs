use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use casapin::api::RatingAPI;
use casapin::config::{init_tracing, Config};
use casapin::db::{DynStore, PgStore};
use casapin::engine::{Engine, STANDALONE_PACING};
use casapin::entities::{clamp_limit, Outcome};
use casapin::external::GooglePlacesClient;

/// Refreshes cached ratings of the least recently refreshed places.
#[derive(Parser, Debug)]
#[command(name = "refresh-ratings", version)]
struct Args {
    /// Places to refresh (default 100, at most 200).
    limit: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;
    init_tracing();

    let api_key = config
        .places_api_key
        .clone()
        .context("missing GOOGLE_PLACES_API_KEY")?;

    let pg_store = Arc::new(
        PgStore::new(config.require_database_url()?, 2)
            .await
            .context("failed to connect to the database")?,
    );
    let store: DynStore = pg_store.clone();

    let engine = Engine::new(store, Arc::new(GooglePlacesClient::new(&config.places_api_base)?))
        .with_places_api_key(Some(api_key))
        .with_pacing(STANDALONE_PACING);

    let summary = engine
        .refresh_ratings(clamp_limit(args.limit.as_deref()))
        .await?;

    for result in &summary.results {
        match &result.outcome {
            Outcome::Updated {
                rating,
                user_ratings_total,
            } => println!(
                "ok   {} -> {} ({})",
                result.name,
                rating.map_or("-".to_string(), |r| r.to_string()),
                user_ratings_total.map_or("-".to_string(), |n| n.to_string()),
            ),
            Outcome::Failed { error } => println!("fail {}: {}", result.name, error),
        }
    }

    println!(
        "done: updated={} failed={} total={}",
        summary.updated, summary.failed, summary.total
    );

    pg_store.close().await;

    Ok(())
}
