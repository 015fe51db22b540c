//! Booking commit and order history.
//!
//! A commit re-derives the total from stored prices, then hands the store a
//! draft that is written all-or-nothing. The store's uniqueness guard on
//! `(showtime, seat)` is the only thing deciding races between commits.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Booking, BookingDraft, CommitRequest, SeatCoordinate};
use crate::pricing::quote;
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("seats no longer available: {0:?}")]
    Conflict(Vec<SeatCoordinate>),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SeatTaken(seats) => BookingError::Conflict(seats),
            StoreError::UnknownPaymentMethod => BookingError::Validation(
                "payment method not found for this user".to_string(),
            ),
            other => BookingError::Storage(other),
        }
    }
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn commit(
        &self,
        user_id: Uuid,
        request: CommitRequest,
    ) -> Result<Booking, BookingError> {
        if request.seats.is_empty() {
            return Err(BookingError::Validation(
                "select at least one seat".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for selection in &request.seats {
            if !seen.insert(selection.seat) {
                return Err(BookingError::Validation(format!(
                    "seat {} is selected more than once",
                    selection.seat
                )));
            }
        }
        let payment_method_id = request.payment_method_id.ok_or_else(|| {
            BookingError::Validation("a payment method is required".to_string())
        })?;

        let showtime = self
            .store
            .get_showtime(request.showtime_id)
            .await?
            .filter(|showtime| showtime.movie_id == request.movie_id)
            .ok_or_else(|| {
                BookingError::NotFound(format!(
                    "showtime {} not found for movie {}",
                    request.showtime_id, request.movie_id
                ))
            })?;
        if showtime.archived {
            return Err(BookingError::Validation(
                "this showtime is no longer scheduled".to_string(),
            ));
        }

        let sheet = self
            .store
            .price_sheet(showtime.price_sheet_id)
            .await?
            .ok_or_else(|| {
                BookingError::NotFound(format!(
                    "price sheet {} not found",
                    showtime.price_sheet_id
                ))
            })?;
        let discount = match request.promotion_code.as_deref() {
            Some(code) => {
                self.store
                    .find_promotion(code)
                    .await?
                    .ok_or_else(|| {
                        BookingError::Validation(format!("promotion code '{code}' is not valid"))
                    })?
                    .discount
            }
            None => Decimal::ZERO,
        };
        let quote = quote(&request.seats, &sheet.prices, sheet.fee_rate, discount)
            .map_err(|e| BookingError::Validation(e.to_string()))?;
        if quote.total != request.total {
            return Err(BookingError::Validation(format!(
                "total {} does not match the current price {}",
                request.total, quote.total
            )));
        }

        match self.store.get_card(payment_method_id).await? {
            Some(stored) if stored.card.user_id == user_id => {}
            _ => {
                return Err(BookingError::Validation(
                    "payment method not found for this user".to_string(),
                ))
            }
        }

        let draft = BookingDraft {
            id: Uuid::new_v4(),
            movie_id: request.movie_id,
            showtime_id: request.showtime_id,
            user_id,
            payment_method_id,
            total: quote.total,
            seats: request.seats,
        };

        match self.store.commit_booking(&draft).await {
            Ok(booking) => {
                tracing::info!(
                    booking_id = %booking.id,
                    showtime_id = %booking.showtime_id,
                    %user_id,
                    seats = booking.seats.len(),
                    total = %booking.total,
                    "Booking committed"
                );
                Ok(booking)
            }
            Err(StoreError::SeatTaken(seats)) => {
                tracing::warn!(
                    showtime_id = %draft.showtime_id,
                    %user_id,
                    ?seats,
                    "Booking rejected, seats taken"
                );
                Err(BookingError::Conflict(seats))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Newest first.
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<Booking>, BookingError> {
        Ok(self.store.bookings_for_user(user_id).await?)
    }
}
