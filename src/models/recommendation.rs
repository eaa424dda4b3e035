use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which strategy produced a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationMethod {
    /// Ranked by the trained latent-factor model
    CollaborativeFilteringSvd,
    /// Items straight from the data source
    ColdStartPopularity,
    /// Cached item universe, or nothing when no data source is configured
    ColdStartFallback,
}

impl RecommendationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationMethod::CollaborativeFilteringSvd => "collaborative_filtering_svd",
            RecommendationMethod::ColdStartPopularity => "cold_start_popularity",
            RecommendationMethod::ColdStartFallback => "cold_start_fallback",
        }
    }

    pub fn is_cold_start(&self) -> bool {
        !matches!(self, RecommendationMethod::CollaborativeFilteringSvd)
    }
}

impl Display for RecommendationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ranked court ids plus the label of the strategy that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub item_ids: Vec<String>,
    pub method: RecommendationMethod,
}

impl Recommendations {
    pub fn new(item_ids: Vec<String>, method: RecommendationMethod) -> Self {
        Self { item_ids, method }
    }
}

/// Snapshot of the currently served model, reported by the admin API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub is_trained: bool,
    pub trained_at: Option<DateTime<Utc>>,
    pub interaction_count: usize,
    pub user_count: usize,
    pub item_count: usize,
    pub item_universe_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serialization() {
        let labels: Vec<String> = [
            RecommendationMethod::CollaborativeFilteringSvd,
            RecommendationMethod::ColdStartPopularity,
            RecommendationMethod::ColdStartFallback,
        ]
        .iter()
        .map(|m| serde_json::to_string(m).unwrap())
        .collect();

        assert_eq!(
            labels,
            vec![
                "\"collaborative_filtering_svd\"",
                "\"cold_start_popularity\"",
                "\"cold_start_fallback\""
            ]
        );
    }

    #[test]
    fn test_display_matches_serialized_label() {
        let method = RecommendationMethod::ColdStartPopularity;
        assert_eq!(
            format!("\"{}\"", method),
            serde_json::to_string(&method).unwrap()
        );
        assert!(method.is_cold_start());
        assert!(!RecommendationMethod::CollaborativeFilteringSvd.is_cold_start());
    }
}
