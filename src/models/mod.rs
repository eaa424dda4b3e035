mod feedback;
mod interaction;
mod recommendation;

pub use feedback::{Rating, Reservation, ReservationStatus};
pub use interaction::{Interaction, SCORE_MAX, SCORE_MIN};
pub use recommendation::{ModelStatus, RecommendationMethod, Recommendations};
