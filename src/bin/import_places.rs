use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use serde::Deserialize;

use casapin::config::{init_tracing, Config};
use casapin::db::{PgStore, PlaceStore};
use casapin::entities::{NewPlace, Place};

/// Imports places from a JSON file: an array of places or `{"places": [...]}`.
#[derive(Parser, Debug)]
#[command(name = "import-places", version)]
struct Args {
    file: PathBuf,

    /// Delete every existing place first.
    #[arg(long)]
    replace: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    List(Vec<NewPlace>),
    Wrapped { places: Vec<NewPlace> },
}

/// Parses and validates every document before anything is written.
fn load_places(raw: &str) -> anyhow::Result<Vec<Place>> {
    let docs = match serde_json::from_str(raw).context("invalid import file")? {
        ImportFile::List(docs) => docs,
        ImportFile::Wrapped { places } => places,
    };

    if docs.is_empty() {
        bail!("no places in import file");
    }

    let now = Utc::now();
    let places: Vec<Place> = docs.into_iter().map(|doc| doc.into_place(now)).collect();

    for (i, place) in places.iter().enumerate() {
        if let Err(err) = place.ensure_valid() {
            bail!("place #{} ({}): {}", i, place.name, err.details.join(", "));
        }
    }

    check_external_ids(&places)?;

    Ok(places)
}

/// Each external place id may appear only once in a file.
fn check_external_ids(places: &[Place]) -> anyhow::Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, place) in places.iter().enumerate() {
        if let Some(external_id) = place.external_place_id.as_deref() {
            if let Some(first) = seen.insert(external_id, i) {
                bail!(
                    "place #{} ({}): externalPlaceId {} already used by place #{}",
                    i,
                    place.name,
                    external_id,
                    first
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;
    init_tracing();

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let places = load_places(&raw)?;

    let store = PgStore::new(config.require_database_url()?, 2)
        .await
        .context("failed to connect to the database")?;

    let deleted = store
        .import_places(&places, args.replace)
        .await
        .context("import failed, nothing was changed")?;
    if args.replace {
        tracing::info!(deleted, "existing places replaced");
    }

    println!("imported {} places", places.len());
    store.close().await;

    Ok(())
}
