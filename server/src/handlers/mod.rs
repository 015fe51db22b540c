use axum::response::Response;
use serde::Serialize;

pub mod admin;
pub mod bookings;
pub mod cards;
pub mod catalog;
pub mod pricing;

use crate::utils::response::success;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "marquee-api",
    };

    success(payload, "Health check successful")
}
