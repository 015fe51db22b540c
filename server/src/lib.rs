pub mod auth;
pub mod booking;
pub mod cards;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod seat_map;
pub mod state;
pub mod store;
pub mod utils;

pub use state::AppState;
pub use utils::error::AppError;
