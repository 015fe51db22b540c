//! Persistence seam.
//!
//! Every component talks to storage through these traits. `PgStore` is the
//! production backend; `MemoryStore` keeps the same guarantees in process
//! and backs the test-suite.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Booking, BookingDraft, Movie, PriceSheet, Promotion, SeatCoordinate, ShowSlot, Showtime,
    StoredCard,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// One or more seats already belong to a booking for the showtime.
    #[error("seats already taken: {0:?}")]
    SeatTaken(Vec<SeatCoordinate>),

    #[error("payment method does not belong to the user")]
    UnknownPaymentMethod,

    #[error("record already exists")]
    Duplicate,

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError>;

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, StoreError>;

    /// Inserts the movie and its initial showtimes in one transaction.
    async fn insert_movie(&self, movie: &Movie, slots: &[ShowSlot]) -> Result<(), StoreError>;

    /// Non-archived showtimes, in no particular order.
    async fn list_showtimes(
        &self,
        movie_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Showtime>, StoreError>;

    /// Archived rows included.
    async fn get_showtime(&self, id: Uuid) -> Result<Option<Showtime>, StoreError>;

    /// Archives every showtime of the movie, then upserts each slot by
    /// `(movie, date, clock)`, restoring archived rows instead of inserting
    /// duplicates. Returns the active showtimes afterwards.
    async fn replace_showdates(
        &self,
        movie_id: Uuid,
        slots: &[ShowSlot],
    ) -> Result<Vec<Showtime>, StoreError>;
}

#[async_trait]
pub trait SeatStore: Send + Sync {
    async fn taken_seats(&self, showtime_id: Uuid) -> Result<BTreeSet<SeatCoordinate>, StoreError>;
}

#[async_trait]
pub trait PricingStore: Send + Sync {
    async fn price_sheet(&self, id: Uuid) -> Result<Option<PriceSheet>, StoreError>;

    async fn upsert_price_sheet(&self, sheet: &PriceSheet) -> Result<(), StoreError>;

    /// Exact, case-sensitive match.
    async fn find_promotion(&self, code: &str) -> Result<Option<Promotion>, StoreError>;

    /// `StoreError::Duplicate` when the code exists.
    async fn insert_promotion(&self, promotion: &Promotion) -> Result<(), StoreError>;

    async fn delete_promotion(&self, code: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Writes the booking and all of its seats, or nothing.
    ///
    /// Payment ownership and seat availability are re-checked inside the same
    /// atomic unit; a seat collision yields `StoreError::SeatTaken`.
    async fn commit_booking(&self, draft: &BookingDraft) -> Result<Booking, StoreError>;

    /// Newest first.
    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError>;
}

#[async_trait]
pub trait CardStore: Send + Sync {
    async fn insert_card(&self, card: &StoredCard) -> Result<(), StoreError>;

    async fn cards_for_user(&self, user_id: Uuid) -> Result<Vec<StoredCard>, StoreError>;

    async fn get_card(&self, id: Uuid) -> Result<Option<StoredCard>, StoreError>;

    async fn delete_card(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;
}

/// Everything the services need from one backend.
pub trait Store: CatalogStore + SeatStore + PricingStore + BookingStore + CardStore {}

impl<T> Store for T where T: CatalogStore + SeatStore + PricingStore + BookingStore + CardStore {}
