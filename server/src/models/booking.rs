use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::seat::SeatSelection;

/// Durable, immutable record of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub showtime_id: Uuid,
    pub user_id: Uuid,
    pub payment_method_id: Uuid,
    pub total: Decimal,
    pub seats: Vec<SeatSelection>,
    pub created_at: DateTime<Utc>,
}

/// What the client submits at the end of checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRequest {
    pub movie_id: Uuid,
    pub showtime_id: Uuid,
    pub seats: Vec<SeatSelection>,
    pub payment_method_id: Option<Uuid>,
    pub promotion_code: Option<String>,
    /// Total shown to the user; re-derived and compared at commit.
    pub total: Decimal,
}

/// Validated booking handed to the store for the atomic insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub showtime_id: Uuid,
    pub user_id: Uuid,
    pub payment_method_id: Uuid,
    pub total: Decimal,
    pub seats: Vec<SeatSelection>,
}
