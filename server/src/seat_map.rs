//! Seat availability per showtime.
//!
//! Nothing is provisioned up front: a coordinate is taken exactly when a seat
//! row exists for it. Reads here are advisory; the commit re-checks.

use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::CatalogError;
use crate::models::SeatCoordinate;
use crate::store::Store;

#[derive(Clone)]
pub struct SeatMap {
    store: Arc<dyn Store>,
}

impl SeatMap {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_taken_seats(
        &self,
        showtime_id: Uuid,
    ) -> Result<BTreeSet<SeatCoordinate>, CatalogError> {
        if self.store.get_showtime(showtime_id).await?.is_none() {
            return Err(CatalogError::ShowtimeNotFound(showtime_id));
        }
        Ok(self.store.taken_seats(showtime_id).await?)
    }

    pub async fn is_available(
        &self,
        showtime_id: Uuid,
        seat: SeatCoordinate,
    ) -> Result<bool, CatalogError> {
        Ok(!self.list_taken_seats(showtime_id).await?.contains(&seat))
    }
}
