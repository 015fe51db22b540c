//! Multi-step checkout: movie, showtime, seats, pricing, payment.
//!
//! The session lives with one user and holds no server-side locks; seat
//! availability is only authoritative at commit.

pub mod flow;
pub mod machine;

pub use flow::{CheckoutError, CheckoutFlow, CommitOutcome};
pub use machine::{
    AppliedPromotion, CheckoutEvent, CheckoutNotice, CheckoutState, Confirmation, PaymentStage,
    RememberedSeats, ReviewStage, SeatPicks, SeatStage, TransitionError,
};
