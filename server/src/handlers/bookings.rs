use axum::extract::State;
use axum::response::Response;

use crate::auth::AuthUser;
use crate::models::CommitRequest;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::Json;
use crate::utils::response::{created, success};

pub async fn commit_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CommitRequest>,
) -> Result<Response, AppError> {
    let booking = state.bookings.commit(user.id, request).await?;
    Ok(created(booking, "Booking confirmed"))
}

pub async fn booking_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    let bookings = state.bookings.history(user.id).await?;
    Ok(success(bookings, "Bookings retrieved"))
}
