//! The checkout wizard as a pure transition function.
//!
//! Every state carries only the data that is valid for it. `next` never
//! touches storage; effects (loading showtimes, reading availability,
//! committing) are performed by [`super::CheckoutFlow`] and fed back in as
//! events.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AgeCategory, Movie, PriceSheet, SeatCoordinate, SeatSelection, Showtime};
use crate::pricing::{quote, Quote, QuoteOverflow};

/// Seats picked in `SeatSelection`. An entry without an age is selected but
/// not yet priceable.
pub type SeatPicks = BTreeMap<SeatCoordinate, Option<AgeCategory>>;

/// User-facing outcome of a step that did not fail the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutNotice {
    InvalidPromotion(String),
    SeatsUnavailable(Vec<SeatCoordinate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromotion {
    pub code: String,
    pub amount: Decimal,
}

/// Seats remembered when backing out of `SeatSelection`, restored if the
/// same showtime is chosen again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberedSeats {
    pub showtime_id: Uuid,
    pub picks: SeatPicks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatStage {
    pub movie: Movie,
    pub showtimes: Vec<Showtime>,
    pub showtime: Showtime,
    pub taken: BTreeSet<SeatCoordinate>,
    pub picks: SeatPicks,
    pub notice: Option<CheckoutNotice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewStage {
    pub movie: Movie,
    pub showtimes: Vec<Showtime>,
    pub showtime: Showtime,
    pub taken: BTreeSet<SeatCoordinate>,
    pub seats: Vec<SeatSelection>,
    pub sheet: PriceSheet,
    pub promotion: Option<AppliedPromotion>,
    pub quote: Quote,
    pub notice: Option<CheckoutNotice>,
}

impl ReviewStage {
    fn requote(&mut self) -> Result<(), TransitionError> {
        let discount = self
            .promotion
            .as_ref()
            .map_or(Decimal::ZERO, |promotion| promotion.amount);
        self.quote = quote(
            &self.seats,
            &self.sheet.prices,
            self.sheet.fee_rate,
            discount,
        )?;
        Ok(())
    }

    fn back_to_seats(&self, notice: Option<CheckoutNotice>) -> SeatStage {
        SeatStage {
            movie: self.movie.clone(),
            showtimes: self.showtimes.clone(),
            showtime: self.showtime.clone(),
            taken: self.taken.clone(),
            picks: self
                .seats
                .iter()
                .map(|selection| (selection.seat, Some(selection.age)))
                .collect(),
            notice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStage {
    pub review: ReviewStage,
    pub payment_method_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub booking_id: Uuid,
    pub movie: Movie,
    pub showtime: Showtime,
    pub seats: Vec<SeatSelection>,
    pub quote: Quote,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    MovieSelected {
        movie: Movie,
    },
    ShowtimeSelection {
        movie: Movie,
        showtimes: Vec<Showtime>,
        remembered: Option<RememberedSeats>,
    },
    SeatSelection(SeatStage),
    PricingReview(ReviewStage),
    PaymentSelection(PaymentStage),
    Confirmed(Confirmation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    ShowtimesLoaded(Vec<Showtime>),
    ShowtimeChosen {
        showtime_id: Uuid,
        taken: BTreeSet<SeatCoordinate>,
    },
    SeatToggled(SeatCoordinate),
    AgeAssigned {
        seat: SeatCoordinate,
        age: AgeCategory,
    },
    AvailabilityRefreshed(BTreeSet<SeatCoordinate>),
    SeatsConfirmed(PriceSheet),
    /// Result of a promotion lookup; `None` when the code does not exist.
    PromotionResolved {
        code: String,
        discount: Option<Decimal>,
    },
    PricingAcknowledged,
    PaymentMethodChosen(Uuid),
    BookingCommitted {
        booking_id: Uuid,
    },
    /// The commit lost a race for these seats.
    CommitRejected {
        taken: Vec<SeatCoordinate>,
    },
    Back,
    Cancel,
}

impl CheckoutEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutEvent::ShowtimesLoaded(_) => "ShowtimesLoaded",
            CheckoutEvent::ShowtimeChosen { .. } => "ShowtimeChosen",
            CheckoutEvent::SeatToggled(_) => "SeatToggled",
            CheckoutEvent::AgeAssigned { .. } => "AgeAssigned",
            CheckoutEvent::AvailabilityRefreshed(_) => "AvailabilityRefreshed",
            CheckoutEvent::SeatsConfirmed(_) => "SeatsConfirmed",
            CheckoutEvent::PromotionResolved { .. } => "PromotionResolved",
            CheckoutEvent::PricingAcknowledged => "PricingAcknowledged",
            CheckoutEvent::PaymentMethodChosen(_) => "PaymentMethodChosen",
            CheckoutEvent::BookingCommitted { .. } => "BookingCommitted",
            CheckoutEvent::CommitRejected { .. } => "CommitRejected",
            CheckoutEvent::Back => "Back",
            CheckoutEvent::Cancel => "Cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{event} is not allowed in {state}")]
    NotAllowed {
        state: &'static str,
        event: &'static str,
    },

    #[error("showtime {0} is not offered for this movie")]
    UnknownShowtime(Uuid),

    #[error("seat {0} is already taken")]
    SeatUnavailable(SeatCoordinate),

    #[error("seat {0} is not selected")]
    SeatNotSelected(SeatCoordinate),

    #[error("select at least one seat")]
    NoSeatsSelected,

    #[error("assign an age category to seats {0:?}")]
    AgeCategoryMissing(Vec<SeatCoordinate>),

    #[error("a discount is already applied")]
    DiscountAlreadyApplied,

    #[error("select a payment method")]
    PaymentMethodRequired,

    #[error(transparent)]
    QuoteOutOfRange(#[from] QuoteOverflow),
}

impl CheckoutState {
    pub fn start(movie: Movie) -> Self {
        CheckoutState::MovieSelected { movie }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::MovieSelected { .. } => "MovieSelected",
            CheckoutState::ShowtimeSelection { .. } => "ShowtimeSelection",
            CheckoutState::SeatSelection(_) => "SeatSelection",
            CheckoutState::PricingReview(_) => "PricingReview",
            CheckoutState::PaymentSelection(_) => "PaymentSelection",
            CheckoutState::Confirmed(_) => "Confirmed",
        }
    }

    /// `None` once confirmed.
    pub fn movie(&self) -> Option<&Movie> {
        match self {
            CheckoutState::MovieSelected { movie }
            | CheckoutState::ShowtimeSelection { movie, .. } => Some(movie),
            CheckoutState::SeatSelection(stage) => Some(&stage.movie),
            CheckoutState::PricingReview(stage) => Some(&stage.movie),
            CheckoutState::PaymentSelection(stage) => Some(&stage.review.movie),
            CheckoutState::Confirmed(_) => None,
        }
    }

    pub fn notice(&self) -> Option<&CheckoutNotice> {
        match self {
            CheckoutState::SeatSelection(stage) => stage.notice.as_ref(),
            CheckoutState::PricingReview(stage) => stage.notice.as_ref(),
            _ => None,
        }
    }

    pub fn next(&self, event: CheckoutEvent) -> Result<CheckoutState, TransitionError> {
        let not_allowed = TransitionError::NotAllowed {
            state: self.name(),
            event: event.name(),
        };

        match (self, event) {
            (CheckoutState::Confirmed(_), _) => Err(not_allowed),

            (CheckoutState::MovieSelected { .. }, CheckoutEvent::Cancel) => Ok(self.clone()),
            (_, CheckoutEvent::Cancel) => match self.movie() {
                Some(movie) => Ok(CheckoutState::start(movie.clone())),
                None => Err(not_allowed),
            },

            (CheckoutState::MovieSelected { movie }, CheckoutEvent::ShowtimesLoaded(showtimes)) => {
                Ok(CheckoutState::ShowtimeSelection {
                    movie: movie.clone(),
                    showtimes: active_for(movie, showtimes),
                    remembered: None,
                })
            }

            (
                CheckoutState::ShowtimeSelection {
                    movie, remembered, ..
                },
                CheckoutEvent::ShowtimesLoaded(showtimes),
            ) => Ok(CheckoutState::ShowtimeSelection {
                movie: movie.clone(),
                showtimes: active_for(movie, showtimes),
                remembered: remembered.clone(),
            }),

            (
                CheckoutState::ShowtimeSelection {
                    movie,
                    showtimes,
                    remembered,
                },
                CheckoutEvent::ShowtimeChosen { showtime_id, taken },
            ) => {
                let showtime = showtimes
                    .iter()
                    .find(|showtime| showtime.id == showtime_id)
                    .cloned()
                    .ok_or(TransitionError::UnknownShowtime(showtime_id))?;

                let mut picks = SeatPicks::new();
                let mut dropped = Vec::new();
                if let Some(remembered) = remembered.as_ref() {
                    if remembered.showtime_id == showtime_id {
                        for (seat, age) in &remembered.picks {
                            if taken.contains(seat) {
                                dropped.push(*seat);
                            } else {
                                picks.insert(*seat, *age);
                            }
                        }
                    }
                }

                Ok(CheckoutState::SeatSelection(SeatStage {
                    movie: movie.clone(),
                    showtimes: showtimes.clone(),
                    showtime,
                    taken,
                    picks,
                    notice: unavailable_notice(dropped),
                }))
            }

            (CheckoutState::ShowtimeSelection { movie, .. }, CheckoutEvent::Back) => {
                Ok(CheckoutState::start(movie.clone()))
            }

            (CheckoutState::SeatSelection(stage), CheckoutEvent::SeatToggled(seat)) => {
                let mut stage = stage.clone();
                if stage.picks.remove(&seat).is_none() {
                    if stage.taken.contains(&seat) {
                        return Err(TransitionError::SeatUnavailable(seat));
                    }
                    stage.picks.insert(seat, None);
                }
                stage.notice = None;
                Ok(CheckoutState::SeatSelection(stage))
            }

            (CheckoutState::SeatSelection(stage), CheckoutEvent::AgeAssigned { seat, age }) => {
                let mut stage = stage.clone();
                match stage.picks.get_mut(&seat) {
                    Some(slot) => *slot = Some(age),
                    None => return Err(TransitionError::SeatNotSelected(seat)),
                }
                Ok(CheckoutState::SeatSelection(stage))
            }

            (CheckoutState::SeatSelection(stage), CheckoutEvent::AvailabilityRefreshed(taken)) => {
                let mut stage = stage.clone();
                let dropped: Vec<SeatCoordinate> = stage
                    .picks
                    .keys()
                    .filter(|seat| taken.contains(seat))
                    .copied()
                    .collect();
                for seat in &dropped {
                    stage.picks.remove(seat);
                }
                stage.taken = taken;
                if !dropped.is_empty() {
                    stage.notice = unavailable_notice(dropped);
                }
                Ok(CheckoutState::SeatSelection(stage))
            }

            (CheckoutState::SeatSelection(stage), CheckoutEvent::SeatsConfirmed(sheet)) => {
                if stage.picks.is_empty() {
                    return Err(TransitionError::NoSeatsSelected);
                }
                let missing: Vec<SeatCoordinate> = stage
                    .picks
                    .iter()
                    .filter(|(_, age)| age.is_none())
                    .map(|(seat, _)| *seat)
                    .collect();
                if !missing.is_empty() {
                    return Err(TransitionError::AgeCategoryMissing(missing));
                }

                let seats: Vec<SeatSelection> = stage
                    .picks
                    .iter()
                    .filter_map(|(seat, age)| {
                        age.map(|age| SeatSelection { seat: *seat, age })
                    })
                    .collect();
                let quote = quote(&seats, &sheet.prices, sheet.fee_rate, Decimal::ZERO)?;
                Ok(CheckoutState::PricingReview(ReviewStage {
                    movie: stage.movie.clone(),
                    showtimes: stage.showtimes.clone(),
                    showtime: stage.showtime.clone(),
                    taken: stage.taken.clone(),
                    seats,
                    sheet,
                    promotion: None,
                    quote,
                    notice: None,
                }))
            }

            (CheckoutState::SeatSelection(stage), CheckoutEvent::Back) => {
                let remembered = (!stage.picks.is_empty()).then(|| RememberedSeats {
                    showtime_id: stage.showtime.id,
                    picks: stage.picks.clone(),
                });
                Ok(CheckoutState::ShowtimeSelection {
                    movie: stage.movie.clone(),
                    showtimes: stage.showtimes.clone(),
                    remembered,
                })
            }

            (
                CheckoutState::PricingReview(review),
                CheckoutEvent::PromotionResolved { code, discount },
            ) => {
                if review.promotion.is_some() {
                    return Err(TransitionError::DiscountAlreadyApplied);
                }
                let mut review = review.clone();
                match discount {
                    Some(amount) => {
                        review.promotion = Some(AppliedPromotion { code, amount });
                        review.notice = None;
                        review.requote()?;
                    }
                    None => review.notice = Some(CheckoutNotice::InvalidPromotion(code)),
                }
                Ok(CheckoutState::PricingReview(review))
            }

            (CheckoutState::PricingReview(review), CheckoutEvent::PricingAcknowledged) => {
                let mut review = review.clone();
                review.notice = None;
                Ok(CheckoutState::PaymentSelection(PaymentStage {
                    review,
                    payment_method_id: None,
                }))
            }

            (CheckoutState::PricingReview(review), CheckoutEvent::Back) => {
                Ok(CheckoutState::SeatSelection(review.back_to_seats(None)))
            }

            (CheckoutState::PaymentSelection(stage), CheckoutEvent::PaymentMethodChosen(id)) => {
                Ok(CheckoutState::PaymentSelection(PaymentStage {
                    review: stage.review.clone(),
                    payment_method_id: Some(id),
                }))
            }

            (CheckoutState::PaymentSelection(stage), CheckoutEvent::BookingCommitted { booking_id }) => {
                if stage.payment_method_id.is_none() {
                    return Err(TransitionError::PaymentMethodRequired);
                }
                let review = &stage.review;
                Ok(CheckoutState::Confirmed(Confirmation {
                    booking_id,
                    movie: review.movie.clone(),
                    showtime: review.showtime.clone(),
                    seats: review.seats.clone(),
                    quote: review.quote,
                    total: review.quote.total,
                }))
            }

            (CheckoutState::PaymentSelection(stage), CheckoutEvent::CommitRejected { taken }) => {
                let mut seats = stage.review.back_to_seats(None);
                let mut dropped = Vec::new();
                for seat in taken {
                    seats.taken.insert(seat);
                    if seats.picks.remove(&seat).is_some() {
                        dropped.push(seat);
                    }
                }
                seats.notice = unavailable_notice(dropped);
                Ok(CheckoutState::SeatSelection(seats))
            }

            (CheckoutState::PaymentSelection(stage), CheckoutEvent::Back) => {
                Ok(CheckoutState::PricingReview(stage.review.clone()))
            }

            _ => Err(not_allowed),
        }
    }
}

fn active_for(movie: &Movie, showtimes: Vec<Showtime>) -> Vec<Showtime> {
    showtimes
        .into_iter()
        .filter(|showtime| showtime.movie_id == movie.id && !showtime.archived)
        .collect()
}

fn unavailable_notice(dropped: Vec<SeatCoordinate>) -> Option<CheckoutNotice> {
    (!dropped.is_empty()).then_some(CheckoutNotice::SeatsUnavailable(dropped))
}
