pub mod booking;
pub mod card;
pub mod movie;
pub mod pricing;
pub mod seat;
pub mod showtime;

pub use booking::{Booking, BookingDraft, CommitRequest};
pub use card::{CreditCard, NewCard, StoredCard};
pub use movie::{Movie, MovieCategory, NewMovie};
pub use pricing::{
    BasePrices, NewPromotion, PriceSheet, PriceSheetUpdate, Promotion, FEE_RATE_SCALE, MAX_AMOUNT,
};
pub use seat::{AgeCategory, CoordinateError, Seat, SeatCoordinate, SeatSelection};
pub use showtime::{ReplaceShowdates, ShowSlot, ShowdateEntry, Showtime};
