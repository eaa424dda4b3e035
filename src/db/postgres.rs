use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;

use crate::{
    db::DataSource,
    error::AppResult,
    models::{Rating, Reservation},
};

/// Creates a lazily-connecting PostgreSQL pool
///
/// The first query opens the connection, so an unreachable database surfaces
/// on the first training run instead of at startup.
pub fn create_pool(database_url: &str, acquire_timeout: Duration) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)?;

    Ok(pool)
}

#[derive(Debug, FromRow)]
struct ReservationRow {
    user_id: String,
    item_id: String,
    status: String,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation::new(row.user_id, row.item_id, row.status)
    }
}

#[derive(Debug, FromRow)]
struct RatingRow {
    user_id: String,
    item_id: String,
    overall_rating: f64,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating::new(row.user_id, row.item_id, row.overall_rating)
    }
}

/// Reads booking data straight from the platform's Postgres database
#[derive(Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DataSource for PostgresSource {
    async fn list_reservations(&self) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT user_id::text AS user_id,
                   court_id::text AS item_id,
                   COALESCE(status::text, '') AS status
            FROM reservations
            WHERE user_id IS NOT NULL AND court_id IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn list_ratings(&self) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, RatingRow>(
            r#"
            SELECT user_id::text AS user_id,
                   court_id::text AS item_id,
                   overall_rating::float8 AS overall_rating
            FROM court_ratings
            WHERE user_id IS NOT NULL
              AND court_id IS NOT NULL
              AND overall_rating IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn list_item_ids(&self, limit: Option<usize>) -> AppResult<Vec<String>> {
        // LIMIT NULL is LIMIT ALL in Postgres
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let ids = sqlx::query_scalar::<_, String>("SELECT id::text FROM courts LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
