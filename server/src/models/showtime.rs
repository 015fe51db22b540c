use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled screening. Archived rows are kept so past bookings keep a
/// valid reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Showtime {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub date: NaiveDate,
    /// Display string as entered by the admin, e.g. `7:00 PM`.
    pub time: String,
    /// Normalised wall-clock time; orders and de-duplicates showtimes.
    pub clock: NaiveTime,
    pub showroom: String,
    pub archived: bool,
    pub price_sheet_id: Uuid,
}

/// One `(date, time)` pair of an admin showdate edit, before normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowdateEntry {
    pub date: NaiveDate,
    pub time: String,
    pub showroom: String,
}

/// A validated showdate ready for upsert keyed by `(movie, date, clock)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowSlot {
    pub date: NaiveDate,
    pub clock: NaiveTime,
    pub time: String,
    pub showroom: String,
    pub price_sheet_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceShowdates {
    pub price_sheet_id: Uuid,
    pub showdates: Vec<ShowdateEntry>,
}
