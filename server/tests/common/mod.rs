#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use marquee_server::auth::Role;
use marquee_server::models::{
    Movie, MovieCategory, NewCard, NewMovie, NewPromotion, PriceSheetUpdate, ShowdateEntry,
    Showtime,
};
use marquee_server::store::MemoryStore;
use marquee_server::AppState;

pub const JWT_SECRET: &[u8] = b"test-identity-secret-0123456789ab";
pub const CARD_SECRET: &[u8] = b"test-card-secret-0123456789abcdef";

pub struct World {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub movie: Movie,
    pub seven_pm: Showtime,
    pub nine_pm: Showtime,
    pub price_sheet_id: Uuid,
}

pub fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

pub fn dollars(amount: i64) -> Decimal {
    Decimal::new(amount, 0)
}

/// Movie "M" playing 2024-06-01 at 7 PM and 9 PM; adult $20, child $15,
/// senior $12, 10% fee; promotion TENOFF worth $10.
pub async fn world() -> World {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::build(store.clone(), JWT_SECRET, CARD_SECRET, Decimal::new(10, 2))
        .unwrap();

    let price_sheet_id = Uuid::new_v4();
    state
        .pricing
        .upsert_price_sheet(
            price_sheet_id,
            PriceSheetUpdate {
                adult: dollars(20),
                child: dollars(15),
                senior: dollars(12),
                fee_rate: None,
            },
        )
        .await
        .unwrap();
    state
        .pricing
        .create_promotion(NewPromotion {
            code: "TENOFF".to_string(),
            discount: dollars(10),
        })
        .await
        .unwrap();

    let (movie, showtimes) = state
        .catalog
        .create_movie(NewMovie {
            name: "M".to_string(),
            category: MovieCategory::CurrentlyRunning,
            genre: "Drama".to_string(),
            cast: vec!["Lead".to_string()],
            director: "Director".to_string(),
            producer: "Producer".to_string(),
            synopsis: "A film.".to_string(),
            trailer_url: None,
            mpaa_rating: "PG".to_string(),
            critic_score: None,
            price_sheet_id,
            showdates: vec![
                ShowdateEntry {
                    date: june_first(),
                    time: "9:00 PM".to_string(),
                    showroom: "Hall 1".to_string(),
                },
                ShowdateEntry {
                    date: june_first(),
                    time: "7:00 PM".to_string(),
                    showroom: "Hall 1".to_string(),
                },
            ],
        })
        .await
        .unwrap();

    World {
        store,
        state,
        movie,
        seven_pm: showtimes[0].clone(),
        nine_pm: showtimes[1].clone(),
        price_sheet_id,
    }
}

pub fn visa() -> NewCard {
    NewCard {
        holder_name: "Pat Doe".to_string(),
        number: "4111111111111111".to_string(),
        card_type: "visa".to_string(),
        expiry: "12/99".to_string(),
        billing_address: "1 Main St".to_string(),
    }
}

/// A new customer with one stored card.
pub async fn customer(world: &World) -> (Uuid, Uuid) {
    let user_id = Uuid::new_v4();
    let card = world.state.cards.add(user_id, visa()).await.unwrap();
    (user_id, card.id)
}

pub fn token(world: &World, user_id: Uuid, role: Role) -> String {
    world
        .state
        .verifier
        .issue(user_id, role, Duration::minutes(10))
        .unwrap()
}
