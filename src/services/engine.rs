use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::{
    config::Config,
    db::DataSource,
    error::{AppError, AppResult},
    models::{ModelStatus, RecommendationMethod, Recommendations},
    services::{
        factorization::{FittedModel, LatentFactorModel, SvdModel},
        fusion::fuse_interactions,
    },
};

const DEFAULT_MIN_INTERACTIONS: usize = 10;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a training run that reached the data source successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingOutcome {
    /// A model was fitted and is now serving
    Trained {
        interactions: usize,
        users: usize,
        items: usize,
    },
    /// No reservations and no ratings at all
    NoData,
    /// Some signal, but too little to factorize
    InsufficientData { interactions: usize, required: usize },
}

impl TrainingOutcome {
    pub fn is_trained(&self) -> bool {
        matches!(self, TrainingOutcome::Trained { .. })
    }

    pub fn message(&self) -> String {
        match self {
            TrainingOutcome::Trained {
                interactions,
                users,
                items,
            } => format!(
                "Model retrained successfully on {} interactions ({} users, {} courts).",
                interactions, users, items
            ),
            TrainingOutcome::NoData => {
                "No data available to train the model; serving cold-start recommendations."
                    .to_string()
            }
            TrainingOutcome::InsufficientData {
                interactions,
                required,
            } => format!(
                "Not enough data to train ({} of {} required interactions); serving cold-start recommendations.",
                interactions, required
            ),
        }
    }
}

/// Everything a recommendation request reads, replaced as one unit
struct ModelSnapshot {
    fitted: Option<Arc<dyn FittedModel>>,
    /// Court universe from the last successful fetch, in store order
    item_ids: Vec<String>,
    trained_at: Option<DateTime<Utc>>,
    interaction_count: usize,
}

impl ModelSnapshot {
    fn untrained(item_ids: Vec<String>) -> Self {
        Self {
            fitted: None,
            item_ids,
            trained_at: None,
            interaction_count: 0,
        }
    }
}

/// Shared recommendation engine
///
/// Holds the data source, the model used for fitting, and the current model
/// snapshot. Readers clone the snapshot `Arc` and drop the lock immediately,
/// so a training run in progress never blocks recommendations; the new
/// snapshot is published with a single write at the end of `train`.
pub struct RecommendationEngine {
    source: Option<Arc<dyn DataSource>>,
    model: Arc<dyn LatentFactorModel>,
    min_interactions: usize,
    fetch_timeout: Duration,
    snapshot: RwLock<Arc<ModelSnapshot>>,
    /// Serialises training runs
    training: Mutex<()>,
}

impl RecommendationEngine {
    /// Creates an untrained engine; `source` is `None` when no store is configured
    pub fn new(source: Option<Arc<dyn DataSource>>, model: Arc<dyn LatentFactorModel>) -> Self {
        Self {
            source,
            model,
            min_interactions: DEFAULT_MIN_INTERACTIONS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            snapshot: RwLock::new(Arc::new(ModelSnapshot::untrained(Vec::new()))),
            training: Mutex::new(()),
        }
    }

    /// Creates an engine with an SVD model and thresholds taken from `config`
    pub fn from_config(config: &Config, source: Option<Arc<dyn DataSource>>) -> Self {
        Self::new(source, Arc::new(SvdModel::new(config.svd_params())))
            .with_min_interactions(config.min_interactions)
            .with_fetch_timeout(config.data_source_timeout())
    }

    pub fn with_min_interactions(mut self, min_interactions: usize) -> Self {
        self.min_interactions = min_interactions;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    async fn current(&self) -> Arc<ModelSnapshot> {
        self.snapshot.read().await.clone()
    }

    async fn publish(&self, snapshot: ModelSnapshot) {
        *self.snapshot.write().await = Arc::new(snapshot);
    }

    /// Runs a data source query under the configured timeout
    async fn fetch<T>(
        &self,
        what: &str,
        query: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.fetch_timeout, query).await {
            Ok(result) => result,
            Err(_) => Err(AppError::DataUnavailable(format!(
                "Fetching {} timed out after {:?}",
                what, self.fetch_timeout
            ))),
        }
    }

    /// Fetches fresh data, fuses it, and fits a new model
    ///
    /// Any data source failure is returned to the caller and leaves the
    /// serving snapshot untouched. Once the fetch succeeds the snapshot is
    /// always replaced, even when the new one is untrained.
    pub async fn train(&self) -> AppResult<TrainingOutcome> {
        let _guard = self.training.lock().await;
        let start = Instant::now();

        let source = self
            .source
            .as_ref()
            .ok_or_else(|| AppError::DataUnavailable("No data source configured".to_string()))?;

        let (reservations, ratings, item_ids) = tokio::try_join!(
            self.fetch("reservations", source.list_reservations()),
            self.fetch("ratings", source.list_ratings()),
            self.fetch("courts", source.list_item_ids(None)),
        )?;

        tracing::info!(
            reservations = reservations.len(),
            ratings = ratings.len(),
            courts = item_ids.len(),
            "Training data fetched"
        );

        if reservations.is_empty() && ratings.is_empty() {
            tracing::warn!("No data available to train the model");
            self.publish(ModelSnapshot::untrained(item_ids)).await;
            return Ok(TrainingOutcome::NoData);
        }

        let interactions = fuse_interactions(&reservations, &ratings);

        if interactions.len() < self.min_interactions {
            tracing::warn!(
                interactions = interactions.len(),
                required = self.min_interactions,
                "Not enough interactions to train; relying on cold start"
            );
            self.publish(ModelSnapshot::untrained(item_ids)).await;
            return Ok(TrainingOutcome::InsufficientData {
                interactions: interactions.len(),
                required: self.min_interactions,
            });
        }

        let interaction_count = interactions.len();
        let model = Arc::clone(&self.model);
        let fitted = tokio::task::spawn_blocking(move || model.fit(&interactions))
            .await
            .map_err(|e| AppError::Internal(format!("Training task failed: {}", e)))??;
        let fitted: Arc<dyn FittedModel> = Arc::from(fitted);

        let outcome = TrainingOutcome::Trained {
            interactions: interaction_count,
            users: fitted.user_count(),
            items: fitted.item_count(),
        };

        self.publish(ModelSnapshot {
            fitted: Some(fitted),
            item_ids,
            trained_at: Some(Utc::now()),
            interaction_count,
        })
        .await;

        tracing::info!(
            model = self.model.name(),
            interactions = interaction_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Recommendation model trained"
        );

        Ok(outcome)
    }

    /// Ranked court ids for `user_id`
    ///
    /// Uses the trained model when the user was part of its training data and
    /// falls back to cold start otherwise. Courts the user already booked or
    /// rated are ranked like any other. Never fails: data source errors are
    /// absorbed by the cold-start path, and a court whose prediction fails is
    /// skipped.
    pub async fn recommend(&self, user_id: &str, limit: usize) -> Recommendations {
        let snapshot = self.current().await;

        let fitted = match snapshot.fitted.as_ref() {
            Some(fitted) if fitted.knows_user(user_id) => fitted,
            Some(_) => {
                tracing::debug!(user_id = %user_id, reason = "unknown_user", "Using cold start");
                return self.recommend_cold_start(limit).await;
            }
            None => {
                tracing::debug!(user_id = %user_id, reason = "untrained", "Using cold start");
                return self.recommend_cold_start(limit).await;
            }
        };

        if limit == 0 {
            return Recommendations::new(Vec::new(), RecommendationMethod::CollaborativeFilteringSvd);
        }

        let mut scored: Vec<(&String, f64)> = Vec::with_capacity(snapshot.item_ids.len());
        for item_id in &snapshot.item_ids {
            match fitted.predict(user_id, item_id) {
                Ok(score) => scored.push((item_id, score)),
                Err(e) => {
                    tracing::warn!(
                        user_id = %user_id,
                        item_id = %item_id,
                        error = %e,
                        "Skipping court with failed prediction"
                    );
                }
            }
        }

        // Stable sort: equal scores keep court universe order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let item_ids = scored
            .into_iter()
            .take(limit)
            .map(|(id, _)| id.clone())
            .collect();

        Recommendations::new(item_ids, RecommendationMethod::CollaborativeFilteringSvd)
    }

    /// Non-personalised recommendations
    ///
    /// The data source's first `limit` courts are a placeholder for a real
    /// popularity ranking. If that query fails, the court universe cached by
    /// the last training fetch is used instead.
    pub async fn recommend_cold_start(&self, limit: usize) -> Recommendations {
        let Some(source) = self.source.as_ref() else {
            return Recommendations::new(Vec::new(), RecommendationMethod::ColdStartFallback);
        };

        match self.fetch("courts", source.list_item_ids(Some(limit))).await {
            Ok(mut item_ids) => {
                item_ids.truncate(limit);
                Recommendations::new(item_ids, RecommendationMethod::ColdStartPopularity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cold-start query failed; using cached courts");
                let snapshot = self.current().await;
                let item_ids = snapshot.item_ids.iter().take(limit).cloned().collect();
                Recommendations::new(item_ids, RecommendationMethod::ColdStartFallback)
            }
        }
    }

    /// Whether a trained model is currently serving
    pub async fn is_trained(&self) -> bool {
        self.current().await.fitted.is_some()
    }

    pub async fn status(&self) -> ModelStatus {
        let snapshot = self.current().await;
        ModelStatus {
            is_trained: snapshot.fitted.is_some(),
            trained_at: snapshot.trained_at,
            interaction_count: snapshot.interaction_count,
            user_count: snapshot.fitted.as_ref().map_or(0, |f| f.user_count()),
            item_count: snapshot.fitted.as_ref().map_or(0, |f| f.item_count()),
            item_universe_size: snapshot.item_ids.len(),
        }
    }
}
