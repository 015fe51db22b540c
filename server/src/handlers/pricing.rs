use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::pricing::QuoteRequest;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{Json, Path};
use crate::utils::response::success;

pub async fn base_prices(
    State(state): State<AppState>,
    Path((movie_id, showtime_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let prices = state.pricing.get_base_prices(movie_id, showtime_id).await?;
    Ok(success(prices, "Base prices retrieved"))
}

pub async fn lookup_promotion(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let promotion = state.pricing.lookup_promotion(&code).await?;
    Ok(success(promotion, "Promotion code is valid"))
}

pub async fn preview_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Response, AppError> {
    let quote = state.pricing.preview(&request).await?;
    Ok(success(quote, "Quote computed"))
}
