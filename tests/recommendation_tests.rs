use std::sync::Arc;

use court_recommender::db::DataSource;
use court_recommender::error::AppResult;
use court_recommender::models::{Rating, RecommendationMethod, Reservation};
use court_recommender::services::{
    fuse_interactions, LatentFactorModel, RecommendationEngine, SvdModel,
};

struct RatingsOnly {
    ratings: Vec<Rating>,
    courts: Vec<String>,
}

#[async_trait::async_trait]
impl DataSource for RatingsOnly {
    async fn list_reservations(&self) -> AppResult<Vec<Reservation>> {
        Ok(Vec::new())
    }

    async fn list_ratings(&self) -> AppResult<Vec<Rating>> {
        Ok(self.ratings.clone())
    }

    async fn list_item_ids(&self, limit: Option<usize>) -> AppResult<Vec<String>> {
        let limit = limit.unwrap_or(self.courts.len());
        Ok(self.courts.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "ratings_only"
    }
}

fn league() -> RatingsOnly {
    let players = ["p1", "p2", "p3", "p4", "p5"];
    let mut ratings = Vec::new();
    for (n, player) in players.iter().enumerate() {
        for court in 0..4 {
            let score = 1.0 + ((n + court * 2) % 5) as f64;
            ratings.push(Rating::new(*player, format!("court-{}", court), score));
        }
    }

    RatingsOnly {
        ratings,
        courts: (0..6).map(|c| format!("court-{}", c)).collect(),
    }
}

#[tokio::test]
async fn test_ranked_by_non_increasing_predicted_score() {
    let source = league();
    let fitted = SvdModel::default()
        .fit(&fuse_interactions(&[], &source.ratings))
        .unwrap();

    let engine = RecommendationEngine::new(Some(Arc::new(league())), Arc::new(SvdModel::default()));
    assert!(engine.train().await.unwrap().is_trained());

    for player in ["p1", "p3", "p5"] {
        let recs = engine.recommend(player, 4).await;
        assert_eq!(recs.method, RecommendationMethod::CollaborativeFilteringSvd);
        assert_eq!(recs.item_ids.len(), 4);

        // Same table, same seed: the standalone fit reproduces the engine's scores
        let scores: Vec<f64> = recs
            .item_ids
            .iter()
            .map(|court| fitted.predict(player, court).unwrap())
            .collect();
        assert!(
            scores.windows(2).all(|w| w[0] >= w[1]),
            "scores not sorted for {}: {:?}",
            player,
            scores
        );
    }
}

#[tokio::test]
async fn test_already_rated_courts_are_not_excluded() {
    let engine = RecommendationEngine::new(Some(Arc::new(league())), Arc::new(SvdModel::default()));
    engine.train().await.unwrap();

    let recs = engine.recommend("p1", 6).await;
    for court in 0..4 {
        assert!(recs.item_ids.contains(&format!("court-{}", court)));
    }
}

#[tokio::test]
async fn test_retraining_is_deterministic() {
    let first = RecommendationEngine::new(Some(Arc::new(league())), Arc::new(SvdModel::default()));
    let second = RecommendationEngine::new(Some(Arc::new(league())), Arc::new(SvdModel::default()));
    first.train().await.unwrap();
    second.train().await.unwrap();

    for player in ["p2", "p4"] {
        assert_eq!(
            first.recommend(player, 6).await,
            second.recommend(player, 6).await
        );
    }
}
