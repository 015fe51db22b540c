use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::machine::{CheckoutEvent, CheckoutState, TransitionError};
use crate::booking::{BookingError, BookingService};
use crate::catalog::{Catalog, CatalogError};
use crate::models::{AgeCategory, Booking, CommitRequest, SeatCoordinate};
use crate::pricing::{PricingEngine, PricingError};
use crate::seat_map::SeatMap;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Booking(#[from] BookingError),
}

#[derive(Debug)]
pub enum CommitOutcome {
    Confirmed(Booking),
    /// The session is back in seat selection without these seats.
    SeatsTaken(Vec<SeatCoordinate>),
}

/// One user's checkout session.
///
/// Failed steps leave the state untouched so the user can correct the input
/// and carry on.
pub struct CheckoutFlow {
    catalog: Catalog,
    seat_map: SeatMap,
    pricing: PricingEngine,
    bookings: BookingService,
    user_id: Uuid,
    state: CheckoutState,
}

impl CheckoutFlow {
    pub async fn start(
        state: &AppState,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Self, CheckoutError> {
        let movie = state.catalog.get_movie(movie_id).await?;
        Ok(Self {
            catalog: state.catalog.clone(),
            seat_map: state.seat_map.clone(),
            pricing: state.pricing.clone(),
            bookings: state.bookings.clone(),
            user_id,
            state: CheckoutState::start(movie),
        })
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    fn apply(&mut self, event: CheckoutEvent) -> Result<(), CheckoutError> {
        let next = self.state.next(event)?;
        tracing::debug!(from = self.state.name(), to = next.name(), "Checkout transition");
        self.state = next;
        Ok(())
    }

    pub async fn load_showtimes(&mut self, date: Option<NaiveDate>) -> Result<(), CheckoutError> {
        let movie_id = self
            .state
            .movie()
            .map(|movie| movie.id)
            .ok_or(TransitionError::NotAllowed {
                state: self.state.name(),
                event: "ShowtimesLoaded",
            })?;
        let showtimes = self.catalog.list_showtimes(movie_id, date).await?;
        self.apply(CheckoutEvent::ShowtimesLoaded(showtimes))
    }

    pub async fn choose_showtime(&mut self, showtime_id: Uuid) -> Result<(), CheckoutError> {
        let taken = self.seat_map.list_taken_seats(showtime_id).await?;
        self.apply(CheckoutEvent::ShowtimeChosen { showtime_id, taken })
    }

    pub fn toggle_seat(&mut self, seat: SeatCoordinate) -> Result<(), CheckoutError> {
        self.apply(CheckoutEvent::SeatToggled(seat))
    }

    pub fn assign_age(&mut self, seat: SeatCoordinate, age: AgeCategory) -> Result<(), CheckoutError> {
        self.apply(CheckoutEvent::AgeAssigned { seat, age })
    }

    pub async fn refresh_availability(&mut self) -> Result<(), CheckoutError> {
        let showtime_id = match &self.state {
            CheckoutState::SeatSelection(stage) => stage.showtime.id,
            other => {
                return Err(TransitionError::NotAllowed {
                    state: other.name(),
                    event: "AvailabilityRefreshed",
                }
                .into())
            }
        };
        let taken = self.seat_map.list_taken_seats(showtime_id).await?;
        self.apply(CheckoutEvent::AvailabilityRefreshed(taken))
    }

    pub async fn confirm_seats(&mut self) -> Result<(), CheckoutError> {
        let (movie_id, showtime_id) = match &self.state {
            CheckoutState::SeatSelection(stage) => (stage.movie.id, stage.showtime.id),
            other => {
                return Err(TransitionError::NotAllowed {
                    state: other.name(),
                    event: "SeatsConfirmed",
                }
                .into())
            }
        };
        let sheet = self.pricing.price_sheet_for(movie_id, showtime_id).await?;
        self.apply(CheckoutEvent::SeatsConfirmed(sheet))
    }

    /// An unknown code is not an error: the review carries an
    /// invalid-code notice instead.
    pub async fn apply_promotion(&mut self, code: &str) -> Result<(), CheckoutError> {
        match &self.state {
            CheckoutState::PricingReview(review) if review.promotion.is_some() => {
                return Err(TransitionError::DiscountAlreadyApplied.into());
            }
            CheckoutState::PricingReview(_) => {}
            other => {
                return Err(TransitionError::NotAllowed {
                    state: other.name(),
                    event: "PromotionResolved",
                }
                .into())
            }
        }

        let discount = match self.pricing.lookup_promotion(code).await {
            Ok(promotion) => Some(promotion.discount),
            Err(PricingError::PromotionNotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        self.apply(CheckoutEvent::PromotionResolved {
            code: code.to_string(),
            discount,
        })
    }

    pub fn acknowledge_pricing(&mut self) -> Result<(), CheckoutError> {
        self.apply(CheckoutEvent::PricingAcknowledged)
    }

    pub fn choose_payment_method(&mut self, id: Uuid) -> Result<(), CheckoutError> {
        self.apply(CheckoutEvent::PaymentMethodChosen(id))
    }

    /// Commits the session. A lost seat race is an outcome, not an error.
    pub async fn commit(&mut self) -> Result<CommitOutcome, CheckoutError> {
        let request = match &self.state {
            CheckoutState::PaymentSelection(stage) => {
                let payment_method_id = stage
                    .payment_method_id
                    .ok_or(TransitionError::PaymentMethodRequired)?;
                let review = &stage.review;
                CommitRequest {
                    movie_id: review.movie.id,
                    showtime_id: review.showtime.id,
                    seats: review.seats.clone(),
                    payment_method_id: Some(payment_method_id),
                    promotion_code: review.promotion.as_ref().map(|p| p.code.clone()),
                    total: review.quote.total,
                }
            }
            other => {
                return Err(TransitionError::NotAllowed {
                    state: other.name(),
                    event: "BookingCommitted",
                }
                .into())
            }
        };

        match self.bookings.commit(self.user_id, request).await {
            Ok(booking) => {
                self.apply(CheckoutEvent::BookingCommitted {
                    booking_id: booking.id,
                })?;
                Ok(CommitOutcome::Confirmed(booking))
            }
            Err(BookingError::Conflict(taken)) => {
                self.apply(CheckoutEvent::CommitRejected {
                    taken: taken.clone(),
                })?;
                Ok(CommitOutcome::SeatsTaken(taken))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn back(&mut self) -> Result<(), CheckoutError> {
        self.apply(CheckoutEvent::Back)
    }

    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        self.apply(CheckoutEvent::Cancel)
    }
}
