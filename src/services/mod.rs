pub mod engine;
pub mod factorization;
pub mod fusion;

pub use engine::{RecommendationEngine, TrainingOutcome};
pub use factorization::{FittedModel, LatentFactorModel, SvdModel, SvdParams};
pub use fusion::fuse_interactions;
