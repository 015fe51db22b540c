use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{admin, bookings, cards, catalog, health_check, pricing};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    api_routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config.production))
        .layer(create_cors_layer(&config.cors_allowed_origins))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/movies", get(catalog::list_movies))
        .route("/movies/:id", get(catalog::get_movie))
        .route("/movies/:id/showtimes", get(catalog::list_showtimes))
        .route(
            "/movies/:id/showtimes/:showtime_id/prices",
            get(pricing::base_prices),
        )
        .route("/showtimes/:id/seats", get(catalog::taken_seats))
        .route("/promotions/:code", get(pricing::lookup_promotion))
        .route("/quotes", post(pricing::preview_quote))
        .route(
            "/bookings",
            post(bookings::commit_booking).get(bookings::booking_history),
        )
        .route("/cards", get(cards::list_cards).post(cards::add_card))
        .route("/cards/:id", delete(cards::delete_card))
        .route("/cards/:id/number", get(cards::reveal_card))
        .merge(admin_routes())
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/movies", post(admin::create_movie))
        .route("/admin/movies/:id/showdates", put(admin::replace_showdates))
        .route("/admin/price-sheets/:id", put(admin::upsert_price_sheet))
        .route("/admin/promotions", post(admin::create_promotion))
        .route("/admin/promotions/:code", delete(admin::delete_promotion))
}
