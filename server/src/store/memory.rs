use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use super::{BookingStore, CardStore, CatalogStore, PricingStore, SeatStore, StoreError};
use crate::models::{
    Booking, BookingDraft, Movie, PriceSheet, Promotion, Seat, SeatCoordinate, ShowSlot,
    Showtime, StoredCard,
};

#[derive(Debug, Default)]
struct Tables {
    movies: Vec<Movie>,
    showtimes: Vec<Showtime>,
    price_sheets: HashMap<Uuid, PriceSheet>,
    promotions: HashMap<String, Promotion>,
    bookings: Vec<Booking>,
    seats: Vec<Seat>,
    cards: Vec<StoredCard>,
}

impl Tables {
    fn taken(&self, showtime_id: Uuid) -> BTreeSet<SeatCoordinate> {
        self.seats
            .iter()
            .filter(|seat| seat.showtime_id == showtime_id)
            .map(|seat| seat.seat)
            .collect()
    }

    fn upsert_slot(&mut self, movie_id: Uuid, slot: &ShowSlot) {
        let existing = self.showtimes.iter_mut().find(|showtime| {
            showtime.movie_id == movie_id
                && showtime.date == slot.date
                && showtime.clock == slot.clock
        });

        match existing {
            Some(showtime) => {
                showtime.archived = false;
                showtime.time = slot.time.clone();
                showtime.showroom = slot.showroom.clone();
                showtime.price_sheet_id = slot.price_sheet_id;
            }
            None => self.showtimes.push(Showtime {
                id: Uuid::new_v4(),
                movie_id,
                date: slot.date,
                time: slot.time.clone(),
                clock: slot.clock,
                showroom: slot.showroom.clone(),
                archived: false,
                price_sheet_id: slot.price_sheet_id,
            }),
        }
    }
}

/// In-process store. One lock guards every table, so each trait call is
/// atomic with respect to all others.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        Ok(self.tables.lock().movies.clone())
    }

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables.movies.iter().find(|movie| movie.id == id).cloned())
    }

    async fn insert_movie(&self, movie: &Movie, slots: &[ShowSlot]) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        if tables.movies.iter().any(|existing| existing.id == movie.id) {
            return Err(StoreError::Duplicate);
        }
        tables.movies.push(movie.clone());
        for slot in slots {
            tables.upsert_slot(movie.id, slot);
        }
        Ok(())
    }

    async fn list_showtimes(
        &self,
        movie_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Showtime>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables
            .showtimes
            .iter()
            .filter(|showtime| showtime.movie_id == movie_id && !showtime.archived)
            .filter(|showtime| date.map_or(true, |day| showtime.date == day))
            .cloned()
            .collect())
    }

    async fn get_showtime(&self, id: Uuid) -> Result<Option<Showtime>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables.showtimes.iter().find(|showtime| showtime.id == id).cloned())
    }

    async fn replace_showdates(
        &self,
        movie_id: Uuid,
        slots: &[ShowSlot],
    ) -> Result<Vec<Showtime>, StoreError> {
        let mut tables = self.tables.lock();
        for showtime in tables
            .showtimes
            .iter_mut()
            .filter(|showtime| showtime.movie_id == movie_id)
        {
            showtime.archived = true;
        }
        for slot in slots {
            tables.upsert_slot(movie_id, slot);
        }
        Ok(tables
            .showtimes
            .iter()
            .filter(|showtime| showtime.movie_id == movie_id && !showtime.archived)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SeatStore for MemoryStore {
    async fn taken_seats(&self, showtime_id: Uuid) -> Result<BTreeSet<SeatCoordinate>, StoreError> {
        Ok(self.tables.lock().taken(showtime_id))
    }
}

#[async_trait]
impl PricingStore for MemoryStore {
    async fn price_sheet(&self, id: Uuid) -> Result<Option<PriceSheet>, StoreError> {
        Ok(self.tables.lock().price_sheets.get(&id).copied())
    }

    async fn upsert_price_sheet(&self, sheet: &PriceSheet) -> Result<(), StoreError> {
        self.tables.lock().price_sheets.insert(sheet.id, *sheet);
        Ok(())
    }

    async fn find_promotion(&self, code: &str) -> Result<Option<Promotion>, StoreError> {
        Ok(self.tables.lock().promotions.get(code).cloned())
    }

    async fn insert_promotion(&self, promotion: &Promotion) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        if tables.promotions.contains_key(&promotion.code) {
            return Err(StoreError::Duplicate);
        }
        tables
            .promotions
            .insert(promotion.code.clone(), promotion.clone());
        Ok(())
    }

    async fn delete_promotion(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.tables.lock().promotions.remove(code).is_some())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn commit_booking(&self, draft: &BookingDraft) -> Result<Booking, StoreError> {
        let mut tables = self.tables.lock();

        let owns_card = tables.cards.iter().any(|stored| {
            stored.card.id == draft.payment_method_id && stored.card.user_id == draft.user_id
        });
        if !owns_card {
            return Err(StoreError::UnknownPaymentMethod);
        }

        // Same rule as the unique seat index: a coordinate may appear once per
        // showtime, including twice in one draft.
        let mut occupied = tables.taken(draft.showtime_id);
        let conflicts: Vec<SeatCoordinate> = draft
            .seats
            .iter()
            .filter(|selection| !occupied.insert(selection.seat))
            .map(|selection| selection.seat)
            .collect();
        if !conflicts.is_empty() {
            return Err(StoreError::SeatTaken(conflicts));
        }

        let booking = Booking {
            id: draft.id,
            movie_id: draft.movie_id,
            showtime_id: draft.showtime_id,
            user_id: draft.user_id,
            payment_method_id: draft.payment_method_id,
            total: draft.total,
            seats: draft.seats.clone(),
            created_at: Utc::now(),
        };
        let seats = draft.seats.iter().map(|selection| Seat {
            id: Uuid::new_v4(),
            showtime_id: draft.showtime_id,
            movie_id: draft.movie_id,
            seat: selection.seat,
            age: selection.age,
            user_id: draft.user_id,
            booking_id: draft.id,
        });
        tables.seats.extend(seats);
        tables.bookings.push(booking.clone());

        Ok(booking)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.lock();
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|booking| booking.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn insert_card(&self, card: &StoredCard) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        if tables.cards.iter().any(|stored| stored.card.id == card.card.id) {
            return Err(StoreError::Duplicate);
        }
        tables.cards.push(card.clone());
        Ok(())
    }

    async fn cards_for_user(&self, user_id: Uuid) -> Result<Vec<StoredCard>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables
            .cards
            .iter()
            .filter(|stored| stored.card.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_card(&self, id: Uuid) -> Result<Option<StoredCard>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables.cards.iter().find(|stored| stored.card.id == id).cloned())
    }

    async fn delete_card(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock();
        let before = tables.cards.len();
        tables
            .cards
            .retain(|stored| !(stored.card.id == id && stored.card.user_id == user_id));
        Ok(tables.cards.len() != before)
    }
}
