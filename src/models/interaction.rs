use serde::{Deserialize, Serialize};

/// Lower bound of the interaction score scale
pub const SCORE_MIN: f64 = 1.0;
/// Upper bound of the interaction score scale
pub const SCORE_MAX: f64 = 5.0;

/// A fused (user, court) training record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: String,
    pub item_id: String,
    pub score: f64,
}

impl Interaction {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            score,
        }
    }
}
