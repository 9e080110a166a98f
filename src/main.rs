use std::sync::Arc;

use casapin::api::{serve, ServerOptions};
use casapin::config::{init_tracing, Config};
use casapin::db::{DynStore, PgStore};
use casapin::engine::{ContactSettings, Engine};
use casapin::external::{GooglePlacesClient, SmtpMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let pg_store = Arc::new(PgStore::new_lazy(config.require_database_url()?, 5)?);

    // the API serves (and reports db:false on /health) while the database is down
    let migrating = pg_store.clone();
    tokio::spawn(async move {
        match migrating.migrate().await {
            Ok(()) => tracing::info!("store ready"),
            Err(err) => tracing::error!(error = %err, "store init failed"),
        }
    });

    let store: DynStore = pg_store;
    let ratings = Arc::new(GooglePlacesClient::new(&config.places_api_base)?);

    let mut engine =
        Engine::new(store, ratings).with_places_api_key(config.places_api_key.clone());

    if config.contact_to.is_some() {
        let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
        engine = engine.with_mailer(
            mailer,
            ContactSettings {
                to: config.contact_to.clone(),
                from: config.contact_from.clone(),
            },
        );
    } else {
        tracing::warn!("CONTACT_TO not set, contact messages will be accepted but not sent");
    }

    if config.places_api_key.is_none() {
        tracing::warn!("GOOGLE_PLACES_API_KEY not set, rating refresh disabled");
    }

    serve(Arc::new(engine), ServerOptions::from_config(&config), config.addr).await?;

    Ok(())
}
