use axum::extract::State;
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::models::{Movie, NewMovie, NewPromotion, PriceSheetUpdate, ReplaceShowdates, Showtime};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{Json, Path};
use crate::utils::response::{created, empty_success, success};

#[derive(Serialize)]
struct CreatedMovie {
    movie: Movie,
    showtimes: Vec<Showtime>,
}

pub async fn create_movie(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(new_movie): Json<NewMovie>,
) -> Result<Response, AppError> {
    let (movie, showtimes) = state.catalog.create_movie(new_movie).await?;
    tracing::info!(movie_id = %movie.id, admin_id = %admin.id, "Admin created movie");
    Ok(created(CreatedMovie { movie, showtimes }, "Movie created"))
}

pub async fn replace_showdates(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(movie_id): Path<Uuid>,
    Json(request): Json<ReplaceShowdates>,
) -> Result<Response, AppError> {
    let showtimes = state.catalog.replace_showdates(movie_id, request).await?;
    tracing::info!(%movie_id, admin_id = %admin.id, "Admin replaced showdates");
    Ok(success(showtimes, "Showdates replaced"))
}

pub async fn upsert_price_sheet(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(update): Json<PriceSheetUpdate>,
) -> Result<Response, AppError> {
    let sheet = state.pricing.upsert_price_sheet(id, update).await?;
    Ok(success(sheet, "Price sheet saved"))
}

pub async fn create_promotion(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(new): Json<NewPromotion>,
) -> Result<Response, AppError> {
    let promotion = state.pricing.create_promotion(new).await?;
    Ok(created(promotion, "Promotion created"))
}

pub async fn delete_promotion(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    state.pricing.delete_promotion(&code).await?;
    Ok(empty_success("Promotion deleted"))
}
