use serde::{Deserialize, Serialize};

/// Lifecycle state of a court reservation
///
/// Unrecognised states from the store land in `Other` rather than failing the
/// whole fetch; a NULL status becomes `Other("")`. Neither counts as a
/// positive signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Other(String),
}

impl ReservationStatus {
    /// Whether a booking in this state is evidence the user liked the court
    pub fn is_positive(&self) -> bool {
        matches!(self, ReservationStatus::Confirmed | ReservationStatus::Completed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Other(s) => s,
        }
    }
}

impl From<String> for ReservationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => ReservationStatus::Pending,
            "confirmed" => ReservationStatus::Confirmed,
            "completed" => ReservationStatus::Completed,
            "cancelled" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Other(value),
        }
    }
}

impl From<Option<String>> for ReservationStatus {
    fn from(value: Option<String>) -> Self {
        ReservationStatus::from(value.unwrap_or_default())
    }
}

impl From<&str> for ReservationStatus {
    fn from(value: &str) -> Self {
        ReservationStatus::from(value.to_string())
    }
}

impl From<ReservationStatus> for String {
    fn from(status: ReservationStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A booking of a court by a user (implicit feedback)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub user_id: String,
    #[serde(alias = "court_id")]
    pub item_id: String,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn new(
        user_id: impl Into<String>,
        item_id: impl Into<String>,
        status: impl Into<ReservationStatus>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            status: status.into(),
        }
    }
}

/// A user-stated rating of a court (explicit feedback), expected in [1, 5]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: String,
    #[serde(alias = "court_id")]
    pub item_id: String,
    pub overall_rating: f64,
}

impl Rating {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, overall_rating: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            overall_rating,
        }
    }
}
