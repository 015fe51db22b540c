use axum::extract::State;
use axum::response::Response;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::SeatCoordinate;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{Path, Query};
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct ShowtimeQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
struct TakenSeats {
    showtime_id: Uuid,
    taken: Vec<SeatCoordinate>,
}

pub async fn list_movies(State(state): State<AppState>) -> Result<Response, AppError> {
    let movies = state.catalog.list_movies().await?;
    Ok(success(movies, "Movies retrieved"))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let movie = state.catalog.get_movie(id).await?;
    Ok(success(movie, "Movie retrieved"))
}

pub async fn list_showtimes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ShowtimeQuery>,
) -> Result<Response, AppError> {
    let showtimes = state.catalog.list_showtimes(id, query.date).await?;
    Ok(success(showtimes, "Showtimes retrieved"))
}

pub async fn taken_seats(
    State(state): State<AppState>,
    Path(showtime_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let taken = state.seat_map.list_taken_seats(showtime_id).await?;
    Ok(success(
        TakenSeats {
            showtime_id,
            taken: taken.into_iter().collect(),
        },
        "Seat availability retrieved",
    ))
}
