use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{types::Json, Executor, Pool, Postgres, Row};
use uuid::Uuid;

use super::PlaceStore;
use crate::entities::{Place, PlaceType};
use crate::error::{not_found_error, Error};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(8);

/// Places live in one table: the full document in `data` plus the columns the
/// catalog and the refresh job filter and sort on.
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    /// Builds the pool without connecting, so the API can come up while the
    /// database is still unreachable.
    pub fn new_lazy(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(db_uri)?;

        Ok(Self { pool })
    }

    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(db_uri)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    #[tracing::instrument(name = "PgStore::migrate", skip_all)]
    pub async fn migrate(&self) -> Result<(), Error> {
        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS places (
                    id UUID PRIMARY KEY,
                    name TEXT NOT NULL,
                    type VARCHAR NOT NULL CHECK (type IN ('beach', 'restaurant', 'activity', 'poi')),
                    rating DOUBLE PRECISION,
                    external_place_id TEXT,
                    rating_updated_at TIMESTAMPTZ,
                    data JSONB NOT NULL
                )",
            )
            .await?;

        // sparse: only places that carry an external id take part
        self.pool
            .execute("CREATE UNIQUE INDEX IF NOT EXISTS places_external_place_id_key ON places (external_place_id) WHERE external_place_id IS NOT NULL")
            .await?;

        self.pool
            .execute("CREATE INDEX IF NOT EXISTS places_type_rating_idx ON places (type, rating DESC)")
            .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_places<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Result<Vec<Place>, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut rows = conn.fetch(query);
        let mut places = Vec::new();

        while let Some(row) = rows.try_next().await? {
            let Json(place): Json<Place> = row.try_get("data")?;
            places.push(place);
        }

        Ok(places)
    }
}

#[async_trait]
impl PlaceStore for PgStore {
    async fn ping(&self) -> Result<(), Error> {
        self.pool.execute("SELECT 1").await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_places(&self, kind: Option<PlaceType>) -> Result<Vec<Place>, Error> {
        let query = match kind {
            Some(kind) => sqlx::query(
                r#"SELECT data FROM places WHERE type = $1 ORDER BY name COLLATE "C" ASC"#,
            )
            .bind(kind.name()),
            None => sqlx::query(r#"SELECT data FROM places ORDER BY name COLLATE "C" ASC"#),
        };

        self.fetch_places(query).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_row = conn
            .fetch_optional(sqlx::query("SELECT data FROM places WHERE id = $1").bind(&id))
            .await?;

        match maybe_row {
            Some(row) => {
                let Json(place): Json<Place> = row.try_get("data")?;
                Ok(Some(place))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_stale_places(&self, limit: usize) -> Result<Vec<Place>, Error> {
        let query = sqlx::query(
            "SELECT data FROM places WHERE external_place_id IS NOT NULL ORDER BY rating_updated_at ASC NULLS FIRST, id LIMIT $1",
        )
        .bind(limit as i64);

        self.fetch_places(query).await
    }

    #[tracing::instrument(skip(self, place), fields(id = %place.id))]
    async fn insert_place(&self, place: &Place) -> Result<(), Error> {
        place.ensure_valid()?;

        let mut conn = self.pool.acquire().await?;
        conn.execute(insert_query(place)).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, place), fields(id = %place.id))]
    async fn update_place(&self, place: &Place) -> Result<(), Error> {
        place.ensure_valid()?;

        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query("UPDATE places SET name = $2, type = $3, rating = $4, external_place_id = $5, rating_updated_at = $6, data = $7 WHERE id = $1")
                    .bind(&place.id)
                    .bind(&place.name)
                    .bind(place.kind.name())
                    .bind(place.rating)
                    .bind(&place.external_place_id)
                    .bind(place.rating_updated_at)
                    .bind(Json(place)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error());
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_all_places(&self) -> Result<u64, Error> {
        let result = self.pool.execute("DELETE FROM places").await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self, places), fields(count = places.len()))]
    async fn import_places(&self, places: &[Place], replace: bool) -> Result<u64, Error> {
        for place in places {
            place.ensure_valid()?;
        }

        let mut tx = self.pool.begin().await?;

        let deleted = if replace {
            tx.execute("DELETE FROM places").await?.rows_affected()
        } else {
            0
        };

        for place in places {
            if let Err(err) = tx.execute(insert_query(place)).await {
                tx.rollback().await?;
                return Err(err.into());
            }
        }

        tx.commit().await?;

        Ok(deleted)
    }
}

fn insert_query(place: &Place) -> Query<'_, Postgres, PgArguments> {
    sqlx::query("INSERT INTO places (id, name, type, rating, external_place_id, rating_updated_at, data) VALUES ($1, $2, $3, $4, $5, $6, $7)")
        .bind(&place.id)
        .bind(&place.name)
        .bind(place.kind.name())
        .bind(place.rating)
        .bind(&place.external_place_id)
        .bind(place.rating_updated_at)
        .bind(Json(place))
}
