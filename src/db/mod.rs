//! Booking data source abstraction
//!
//! The recommendation engine reads three things from the booking platform:
//! reservations, ratings, and the list of courts. Each backing store
//! (direct Postgres, Supabase REST) implements this trait so the engine never
//! knows which one it is talking to.
use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    models::{Rating, Reservation},
};

pub mod postgres;
pub mod supabase;

pub use postgres::{create_pool, PostgresSource};
pub use supabase::SupabaseSource;

/// Read-only view of the booking platform
///
/// Queries that match no rows return empty collections, never errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// All reservations, whatever their status
    async fn list_reservations(&self) -> AppResult<Vec<Reservation>>;

    /// All explicit court ratings
    async fn list_ratings(&self) -> AppResult<Vec<Rating>>;

    /// Known court ids in store order, optionally only the first `limit`
    async fn list_item_ids(&self, limit: Option<usize>) -> AppResult<Vec<String>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Builds the data source selected by configuration
///
/// Supabase REST wins when its credentials are set, then a direct Postgres
/// connection. Returns `None` when neither is configured; the service then
/// only serves cold-start responses.
pub async fn connect(config: &Config) -> anyhow::Result<Option<Arc<dyn DataSource>>> {
    if let Some((url, key)) = config.supabase_credentials() {
        let source = SupabaseSource::new(url, key, config.data_source_timeout())?;
        tracing::info!(source = source.name(), url = %url, "Using Supabase data source");
        return Ok(Some(Arc::new(source)));
    }

    if let Some(database_url) = config.database_url.as_deref().filter(|u| !u.is_empty()) {
        let pool = create_pool(database_url, config.data_source_timeout())?;
        let source = PostgresSource::new(pool);
        tracing::info!(source = source.name(), "Using Postgres data source");
        return Ok(Some(Arc::new(source)));
    }

    tracing::warn!(
        "Neither SUPABASE_URL/SUPABASE_SERVICE_ROLE_KEY nor DATABASE_URL is set; serving cold-start only"
    );
    Ok(None)
}
