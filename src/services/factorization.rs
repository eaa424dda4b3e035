use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{Interaction, SCORE_MAX, SCORE_MIN},
};

/// Something that can learn user and court vectors from an interaction table
#[cfg_attr(test, mockall::automock)]
pub trait LatentFactorModel: Send + Sync {
    /// Fits a fresh model on the whole table; never updates a previous fit
    fn fit(&self, interactions: &[Interaction]) -> AppResult<Box<dyn FittedModel>>;

    /// Model name for logging and debugging
    fn name(&self) -> &'static str;
}

/// An immutable trained model
#[cfg_attr(test, mockall::automock)]
pub trait FittedModel: Send + Sync {
    /// Predicted score for a (user, court) pair on the [1, 5] scale
    fn predict(&self, user_id: &str, item_id: &str) -> AppResult<f64>;

    /// Whether the user appeared in the training table
    fn knows_user(&self, user_id: &str) -> bool;

    fn user_count(&self) -> usize;

    fn item_count(&self) -> usize;
}

/// Hyperparameters of [`SvdModel`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvdParams {
    pub factors: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub regularization: f64,
    /// Seed of the factor initialisation; equal seeds give equal fits
    pub seed: u64,
}

impl Default for SvdParams {
    fn default() -> Self {
        Self {
            factors: 100,
            epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            seed: 42,
        }
    }
}

const INIT_RANGE: f64 = 0.1;

/// Biased matrix factorization trained with stochastic gradient descent
///
/// Predicts `mean + b_u + b_i + p_u . q_i`. Training walks the interaction
/// rows in table order for every epoch, updating biases and factors after
/// each row, so a fixed table and seed always produce the same fit.
#[derive(Debug, Clone, Default)]
pub struct SvdModel {
    params: SvdParams,
}

impl SvdModel {
    pub fn new(params: SvdParams) -> Self {
        Self { params }
    }
}

impl LatentFactorModel for SvdModel {
    fn fit(&self, interactions: &[Interaction]) -> AppResult<Box<dyn FittedModel>> {
        if interactions.is_empty() {
            return Err(AppError::InvalidInput(
                "Cannot fit a model on an empty interaction table".to_string(),
            ));
        }
        if let Some(bad) = interactions.iter().find(|i| !i.score.is_finite()) {
            return Err(AppError::InvalidInput(format!(
                "Non-finite score for user {} and court {}",
                bad.user_id, bad.item_id
            )));
        }

        let SvdParams {
            factors,
            epochs,
            learning_rate: lr,
            regularization: reg,
            seed,
        } = self.params;

        let mut user_index: HashMap<String, usize> = HashMap::new();
        let mut item_index: HashMap<String, usize> = HashMap::new();
        let rows: Vec<(usize, usize, f64)> = interactions
            .iter()
            .map(|interaction| {
                let next_user = user_index.len();
                let u = *user_index
                    .entry(interaction.user_id.clone())
                    .or_insert(next_user);
                let next_item = item_index.len();
                let i = *item_index
                    .entry(interaction.item_id.clone())
                    .or_insert(next_item);
                (u, i, interaction.score)
            })
            .collect();

        let global_mean = rows.iter().map(|(_, _, r)| r).sum::<f64>() / rows.len() as f64;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut init = |count: usize| -> Vec<Vec<f64>> {
            (0..count)
                .map(|_| {
                    (0..factors)
                        .map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE))
                        .collect()
                })
                .collect()
        };
        let mut user_factors = init(user_index.len());
        let mut item_factors = init(item_index.len());
        let mut user_bias = vec![0.0; user_index.len()];
        let mut item_bias = vec![0.0; item_index.len()];

        for _ in 0..epochs {
            for &(u, i, rating) in &rows {
                let dot: f64 = user_factors[u]
                    .iter()
                    .zip(&item_factors[i])
                    .map(|(p, q)| p * q)
                    .sum();
                let err = rating - (global_mean + user_bias[u] + item_bias[i] + dot);

                user_bias[u] += lr * (err - reg * user_bias[u]);
                item_bias[i] += lr * (err - reg * item_bias[i]);

                for f in 0..factors {
                    let p = user_factors[u][f];
                    let q = item_factors[i][f];
                    user_factors[u][f] += lr * (err * q - reg * p);
                    item_factors[i][f] += lr * (err * p - reg * q);
                }
            }
        }

        tracing::debug!(
            users = user_index.len(),
            items = item_index.len(),
            rows = rows.len(),
            factors,
            epochs,
            global_mean,
            "SVD fit completed"
        );

        Ok(Box::new(SvdFit {
            global_mean,
            user_index,
            item_index,
            user_bias,
            item_bias,
            user_factors,
            item_factors,
        }))
    }

    fn name(&self) -> &'static str {
        "svd"
    }
}

/// Parameters learned by [`SvdModel`]
pub struct SvdFit {
    global_mean: f64,
    user_index: HashMap<String, usize>,
    item_index: HashMap<String, usize>,
    user_bias: Vec<f64>,
    item_bias: Vec<f64>,
    user_factors: Vec<Vec<f64>>,
    item_factors: Vec<Vec<f64>>,
}

impl FittedModel for SvdFit {
    /// Terms for an unseen user or court are dropped, so a court nobody has
    /// interacted with scores `mean + b_u`.
    fn predict(&self, user_id: &str, item_id: &str) -> AppResult<f64> {
        let user = self.user_index.get(user_id).copied();
        let item = self.item_index.get(item_id).copied();

        let mut estimate = self.global_mean;
        if let Some(u) = user {
            estimate += self.user_bias[u];
        }
        if let Some(i) = item {
            estimate += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (user, item) {
            estimate += self.user_factors[u]
                .iter()
                .zip(&self.item_factors[i])
                .map(|(p, q)| p * q)
                .sum::<f64>();
        }

        if !estimate.is_finite() {
            return Err(AppError::Prediction(format!(
                "Non-finite estimate for user {} and court {}",
                user_id, item_id
            )));
        }

        Ok(estimate.clamp(SCORE_MIN, SCORE_MAX))
    }

    fn knows_user(&self, user_id: &str) -> bool {
        self.user_index.contains_key(user_id)
    }

    fn user_count(&self) -> usize {
        self.user_index.len()
    }

    fn item_count(&self) -> usize {
        self.item_index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four users who love c1 and dislike c2, plus a neutral c3
    fn polarized_table() -> Vec<Interaction> {
        let mut rows = Vec::new();
        for user in ["u1", "u2", "u3", "u4"] {
            rows.push(Interaction::new(user, "c1", 5.0));
            rows.push(Interaction::new(user, "c2", 1.0));
            rows.push(Interaction::new(user, "c3", 3.0));
        }
        rows
    }

    #[test]
    fn test_default_params() {
        let params = SvdParams::default();
        assert_eq!(params.factors, 100);
        assert_eq!(params.epochs, 20);
        assert_eq!(params.learning_rate, 0.005);
        assert_eq!(params.regularization, 0.02);
    }

    #[test]
    fn test_fit_rejects_empty_table() {
        let result = SvdModel::default().fit(&[]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_fit_rejects_non_finite_scores() {
        let rows = vec![Interaction::new("u1", "c1", f64::NAN)];
        let result = SvdModel::default().fit(&rows);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_knows_only_training_users() {
        let fitted = SvdModel::default().fit(&polarized_table()).unwrap();

        assert!(fitted.knows_user("u1"));
        assert!(fitted.knows_user("u4"));
        assert!(!fitted.knows_user("u5"));
        assert_eq!(fitted.user_count(), 4);
        assert_eq!(fitted.item_count(), 3);
    }

    #[test]
    fn test_learns_item_preference() {
        let fitted = SvdModel::default().fit(&polarized_table()).unwrap();

        let liked = fitted.predict("u1", "c1").unwrap();
        let neutral = fitted.predict("u1", "c3").unwrap();
        let disliked = fitted.predict("u1", "c2").unwrap();

        assert!(liked > neutral, "{} <= {}", liked, neutral);
        assert!(neutral > disliked, "{} <= {}", neutral, disliked);
    }

    #[test]
    fn test_predictions_stay_on_scale() {
        let params = SvdParams {
            epochs: 200,
            learning_rate: 0.05,
            ..SvdParams::default()
        };
        let fitted = SvdModel::new(params).fit(&polarized_table()).unwrap();

        for user in ["u1", "u2", "unknown"] {
            for item in ["c1", "c2", "c3", "never_booked"] {
                let score = fitted.predict(user, item).unwrap();
                assert!((SCORE_MIN..=SCORE_MAX).contains(&score));
            }
        }
    }

    #[test]
    fn test_unseen_court_scores_mean_plus_user_bias() {
        let rows = vec![
            Interaction::new("u1", "c1", 4.0),
            Interaction::new("u1", "c2", 4.0),
        ];
        let params = SvdParams {
            factors: 0,
            ..SvdParams::default()
        };
        let fitted = SvdModel::new(params).fit(&rows).unwrap();

        // Every rating equals the mean and there are no factors, so no error
        // term ever moves the biases
        assert_eq!(fitted.predict("u1", "never_booked").unwrap(), 4.0);
        assert_eq!(fitted.predict("stranger", "never_booked").unwrap(), 4.0);
    }

    #[test]
    fn test_same_seed_same_fit() {
        let model = SvdModel::default();
        let first = model.fit(&polarized_table()).unwrap();
        let second = model.fit(&polarized_table()).unwrap();

        for item in ["c1", "c2", "c3"] {
            assert_eq!(
                first.predict("u2", item).unwrap(),
                second.predict("u2", item).unwrap()
            );
        }
    }
}
