//! Supabase (PostgREST) data source
//!
//! Reads the same three tables as the Postgres source, but over the project's
//! REST endpoint using the service role key. PostgREST caps responses at a
//! server-side maximum, so full listings are fetched page by page.
//!
//! API Flow:
//! 1. GET /rest/v1/{table}?select=...&{column}=not.is.null&order=...&limit=N&offset=M
//! 2. Repeat with a larger offset until a short page comes back
//!
//! Offsets are only meaningful under a total order, so every paged listing
//! sends `order`. Rows with NULL keys are filtered out server-side, matching
//! the Postgres source.
use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

use crate::{
    db::DataSource,
    error::{AppError, AppResult},
    models::{Rating, Reservation},
};

const PAGE_SIZE: usize = 1000;
const NOT_NULL: &str = "not.is.null";

/// One PostgREST read: columns, row filters, and ordering
struct Select<'a> {
    table: &'a str,
    columns: &'a str,
    not_null: &'a [&'a str],
    order: Option<&'a str>,
}

impl Select<'_> {
    fn params(&self, limit: usize, offset: usize) -> Vec<(&str, String)> {
        let mut params = vec![("select", self.columns.to_string())];
        params.extend(self.not_null.iter().map(|c| (*c, NOT_NULL.to_string())));
        if let Some(order) = self.order {
            params.push(("order", order.to_string()));
        }
        params.push(("limit", limit.to_string()));
        params.push(("offset", offset.to_string()));
        params
    }
}

const RESERVATIONS: Select<'static> = Select {
    table: "reservations",
    columns: "user_id,court_id,status",
    not_null: &["user_id", "court_id"],
    order: Some("user_id,court_id,status"),
};

const RATINGS: Select<'static> = Select {
    table: "court_ratings",
    columns: "user_id,court_id,overall_rating",
    not_null: &["user_id", "court_id", "overall_rating"],
    order: Some("user_id,court_id,overall_rating"),
};

#[derive(Clone)]
pub struct SupabaseSource {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct CourtRow {
    id: String,
}

impl SupabaseSource {
    /// Creates a new Supabase source; `timeout` bounds every request
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    /// Fetches a single page of rows
    async fn select_page<T: DeserializeOwned>(
        &self,
        select: &Select<'_>,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<T>> {
        let response = self
            .http_client
            .get(self.table_url(select.table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&select.params(limit, offset))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DataUnavailable(format!(
                "Supabase returned status {} for {}: {}",
                status, select.table, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Fetches rows, all of them when `limit` is `None`
    async fn select<T: DeserializeOwned>(
        &self,
        select: &Select<'_>,
        limit: Option<usize>,
    ) -> AppResult<Vec<T>> {
        let mut rows = Vec::new();

        loop {
            let page_size = match limit {
                Some(limit) => PAGE_SIZE.min(limit - rows.len()),
                None => PAGE_SIZE,
            };
            if page_size == 0 {
                break;
            }

            let page: Vec<T> = self.select_page(select, page_size, rows.len()).await?;
            let short_page = page.len() < page_size;
            rows.extend(page);

            if short_page {
                break;
            }
        }

        tracing::debug!(table = %select.table, rows = rows.len(), "Supabase select completed");

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl DataSource for SupabaseSource {
    async fn list_reservations(&self) -> AppResult<Vec<Reservation>> {
        self.select(&RESERVATIONS, None).await
    }

    async fn list_ratings(&self) -> AppResult<Vec<Rating>> {
        self.select(&RATINGS, None).await
    }

    /// The cold-start query (`Some(limit)`) keeps store order; the full
    /// universe is ordered by id so its pages line up.
    async fn list_item_ids(&self, limit: Option<usize>) -> AppResult<Vec<String>> {
        let courts = Select {
            table: "courts",
            columns: "id",
            not_null: &[],
            order: limit.is_none().then_some("id"),
        };
        let rows: Vec<CourtRow> = self.select(&courts, limit).await?;
        Ok(rows.into_iter().map(|c| c.id).collect())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
