use axum::extract::State;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::{CreditCard, NewCard};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{Json, Path};
use crate::utils::response::{created, empty_success, success};

/// What clients see of a stored card.
#[derive(Debug, Serialize)]
pub struct CardView {
    pub id: Uuid,
    pub holder_name: String,
    pub card_type: String,
    pub masked_number: String,
    pub expiry: String,
    pub billing_address: String,
    pub created_at: DateTime<Utc>,
}

impl From<CreditCard> for CardView {
    fn from(card: CreditCard) -> Self {
        Self {
            masked_number: card.masked_number(),
            id: card.id,
            holder_name: card.holder_name,
            card_type: card.card_type,
            expiry: card.expiry,
            billing_address: card.billing_address,
            created_at: card.created_at,
        }
    }
}

#[derive(Serialize)]
struct RevealedNumber {
    id: Uuid,
    number: String,
}

pub async fn list_cards(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    let cards: Vec<CardView> = state
        .cards
        .list(user.id)
        .await?
        .into_iter()
        .map(CardView::from)
        .collect();
    Ok(success(cards, "Payment methods retrieved"))
}

pub async fn add_card(
    State(state): State<AppState>,
    user: AuthUser,
    Json(new_card): Json<NewCard>,
) -> Result<Response, AppError> {
    let card = state.cards.add(user.id, new_card).await?;
    Ok(created(CardView::from(card), "Payment method added"))
}

pub async fn delete_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.cards.delete(user.id, id).await?;
    Ok(empty_success("Payment method deleted"))
}

pub async fn reveal_card(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let number = state.cards.reveal(user.id, id).await?;
    Ok(success(RevealedNumber { id, number }, "Card number retrieved"))
}
