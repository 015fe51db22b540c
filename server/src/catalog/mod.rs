//! Movies and their showtime calendar.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Movie, NewMovie, ReplaceShowdates, ShowSlot, ShowdateEntry, Showtime};
use crate::store::{Store, StoreError};

pub mod clock;

pub use clock::{parse_clock, ClockParseError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("movie {0} not found")]
    MovieNotFound(Uuid),

    #[error("showtime {0} not found")]
    ShowtimeNotFound(Uuid),

    #[error("price sheet {0} not found")]
    PriceSheetNotFound(Uuid),

    #[error(transparent)]
    InvalidTime(#[from] ClockParseError),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Newest first.
    pub async fn list_movies(&self) -> Result<Vec<Movie>, CatalogError> {
        let mut movies = self.store.list_movies().await?;
        movies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(movies)
    }

    pub async fn get_movie(&self, id: Uuid) -> Result<Movie, CatalogError> {
        self.store
            .get_movie(id)
            .await?
            .ok_or(CatalogError::MovieNotFound(id))
    }

    /// Active showtimes ordered by date, then by wall-clock time.
    pub async fn list_showtimes(
        &self,
        movie_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Showtime>, CatalogError> {
        self.get_movie(movie_id).await?;

        let mut showtimes = self.store.list_showtimes(movie_id, date).await?;
        sort_showtimes(&mut showtimes);
        Ok(showtimes)
    }

    /// Archived showtimes resolve too; past bookings still point at them.
    pub async fn get_showtime(&self, id: Uuid) -> Result<Showtime, CatalogError> {
        self.store
            .get_showtime(id)
            .await?
            .ok_or(CatalogError::ShowtimeNotFound(id))
    }

    pub async fn create_movie(
        &self,
        new_movie: NewMovie,
    ) -> Result<(Movie, Vec<Showtime>), CatalogError> {
        if new_movie.name.trim().is_empty() {
            return Err(CatalogError::Invalid("movie name is required".to_string()));
        }
        if let Some(score) = new_movie.critic_score {
            if !(0..=100).contains(&score) {
                return Err(CatalogError::Invalid(format!(
                    "critic score must be between 0 and 100, got {score}"
                )));
            }
        }
        self.require_price_sheet(new_movie.price_sheet_id).await?;
        let slots = normalize_slots(&new_movie.showdates, new_movie.price_sheet_id)?;

        let movie = Movie {
            id: Uuid::new_v4(),
            name: new_movie.name.trim().to_string(),
            category: new_movie.category,
            genre: new_movie.genre,
            cast: new_movie.cast,
            director: new_movie.director,
            producer: new_movie.producer,
            synopsis: new_movie.synopsis,
            trailer_url: new_movie.trailer_url,
            mpaa_rating: new_movie.mpaa_rating,
            critic_score: new_movie.critic_score,
            created_at: chrono::Utc::now(),
        };
        self.store.insert_movie(&movie, &slots).await?;
        tracing::info!(movie_id = %movie.id, showtimes = slots.len(), "Movie created");

        let showtimes = self.list_showtimes(movie.id, None).await?;
        Ok((movie, showtimes))
    }

    /// Archive-then-upsert of a movie's schedule. Showtimes present in both
    /// the old and the new schedule keep their id.
    pub async fn replace_showdates(
        &self,
        movie_id: Uuid,
        request: ReplaceShowdates,
    ) -> Result<Vec<Showtime>, CatalogError> {
        self.get_movie(movie_id).await?;
        self.require_price_sheet(request.price_sheet_id).await?;
        let slots = normalize_slots(&request.showdates, request.price_sheet_id)?;

        let mut showtimes = self.store.replace_showdates(movie_id, &slots).await?;
        sort_showtimes(&mut showtimes);
        tracing::info!(%movie_id, active = showtimes.len(), "Showdates replaced");
        Ok(showtimes)
    }

    async fn require_price_sheet(&self, id: Uuid) -> Result<(), CatalogError> {
        match self.store.price_sheet(id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::PriceSheetNotFound(id)),
        }
    }
}

fn sort_showtimes(showtimes: &mut [Showtime]) {
    showtimes.sort_by(|a, b| {
        (a.date, a.clock, &a.showroom).cmp(&(b.date, b.clock, &b.showroom))
    });
}

/// Parses every entry; a later entry for the same `(date, time)` wins.
fn normalize_slots(
    entries: &[ShowdateEntry],
    price_sheet_id: Uuid,
) -> Result<Vec<ShowSlot>, CatalogError> {
    let mut slots = BTreeMap::new();
    for entry in entries {
        let clock = parse_clock(&entry.time)?;
        let showroom = entry.showroom.trim();
        if showroom.is_empty() {
            return Err(CatalogError::Invalid(format!(
                "showroom is required for {} {}",
                entry.date, entry.time
            )));
        }
        slots.insert(
            (entry.date, clock),
            ShowSlot {
                date: entry.date,
                clock,
                time: entry.time.trim().to_string(),
                showroom: showroom.to_string(),
                price_sheet_id,
            },
        );
    }
    Ok(slots.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BasePrices, MovieCategory, PriceSheet};
    use crate::store::{MemoryStore, PricingStore};
    use rust_decimal::Decimal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn entry(d: u32, time: &str) -> ShowdateEntry {
        ShowdateEntry {
            date: day(d),
            time: time.to_string(),
            showroom: "Hall 1".to_string(),
        }
    }

    fn new_movie(price_sheet_id: Uuid, showdates: Vec<ShowdateEntry>) -> NewMovie {
        NewMovie {
            name: "M".to_string(),
            category: MovieCategory::CurrentlyRunning,
            genre: "Drama".to_string(),
            cast: vec!["Lead".to_string(), "Support".to_string()],
            director: "Director".to_string(),
            producer: "Producer".to_string(),
            synopsis: "A film.".to_string(),
            trailer_url: None,
            mpaa_rating: "PG-13".to_string(),
            critic_score: Some(88),
            price_sheet_id,
            showdates,
        }
    }

    async fn setup() -> (Catalog, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let sheet = PriceSheet {
            id: Uuid::new_v4(),
            prices: BasePrices {
                adult: Decimal::new(2000, 2),
                child: Decimal::new(1500, 2),
                senior: Decimal::new(1200, 2),
            },
            fee_rate: Decimal::new(10, 2),
        };
        store.upsert_price_sheet(&sheet).await.unwrap();
        (Catalog::new(store), sheet.id)
    }

    #[tokio::test]
    async fn test_showtimes_sort_by_wall_clock() {
        let (catalog, sheet) = setup().await;
        let (movie, _) = catalog
            .create_movie(new_movie(
                sheet,
                vec![entry(1, "10:00 PM"), entry(1, "1:00 PM"), entry(1, "9:30 AM")],
            ))
            .await
            .unwrap();

        let times: Vec<String> = catalog
            .list_showtimes(movie.id, None)
            .await
            .unwrap()
            .into_iter()
            .map(|showtime| showtime.time)
            .collect();

        assert_eq!(times, vec!["9:30 AM", "1:00 PM", "10:00 PM"]);
    }

    #[tokio::test]
    async fn test_date_filter() {
        let (catalog, sheet) = setup().await;
        let (movie, _) = catalog
            .create_movie(new_movie(sheet, vec![entry(1, "7PM"), entry(2, "7PM")]))
            .await
            .unwrap();

        let on_second = catalog.list_showtimes(movie.id, Some(day(2))).await.unwrap();

        assert_eq!(on_second.len(), 1);
        assert_eq!(on_second[0].date, day(2));
    }

    #[tokio::test]
    async fn test_adding_a_showtime_keeps_existing_ids() {
        let (catalog, sheet) = setup().await;
        let (movie, original) = catalog
            .create_movie(new_movie(sheet, vec![entry(1, "7:00 PM")]))
            .await
            .unwrap();
        let seven = original[0].id;

        let updated = catalog
            .replace_showdates(
                movie.id,
                ReplaceShowdates {
                    price_sheet_id: sheet,
                    showdates: vec![entry(1, "7:00 PM"), entry(1, "9:00 PM")],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].id, seven);
        assert!(!updated[0].archived);
        assert_eq!(updated[1].time, "9:00 PM");
    }

    #[tokio::test]
    async fn test_replacing_twice_is_idempotent() {
        let (catalog, sheet) = setup().await;
        let (movie, _) = catalog
            .create_movie(new_movie(sheet, vec![entry(1, "5PM")]))
            .await
            .unwrap();
        let schedule = || ReplaceShowdates {
            price_sheet_id: sheet,
            showdates: vec![entry(2, "7:00 PM"), entry(2, "9:00 PM")],
        };

        let first = catalog.replace_showdates(movie.id, schedule()).await.unwrap();
        let second = catalog.replace_showdates(movie.id, schedule()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_dropped_showtime_is_archived_not_deleted() {
        let (catalog, sheet) = setup().await;
        let (movie, original) = catalog
            .create_movie(new_movie(sheet, vec![entry(1, "5PM")]))
            .await
            .unwrap();

        let active = catalog
            .replace_showdates(
                movie.id,
                ReplaceShowdates {
                    price_sheet_id: sheet,
                    showdates: vec![entry(2, "5PM")],
                },
            )
            .await
            .unwrap();
        let old = catalog.get_showtime(original[0].id).await.unwrap();

        assert_eq!(active.len(), 1);
        assert_ne!(active[0].id, old.id);
        assert!(old.archived);
    }

    #[tokio::test]
    async fn test_same_time_spelled_twice_collapses() {
        let (catalog, sheet) = setup().await;
        let (_, showtimes) = catalog
            .create_movie(new_movie(sheet, vec![entry(1, "7PM"), entry(1, "19:00")]))
            .await
            .unwrap();

        assert_eq!(showtimes.len(), 1);
        assert_eq!(showtimes[0].time, "19:00");
    }

    #[tokio::test]
    async fn test_unknown_price_sheet_is_rejected() {
        let (catalog, _) = setup().await;
        let missing = Uuid::new_v4();

        let result = catalog.create_movie(new_movie(missing, vec![])).await;

        assert!(matches!(result, Err(CatalogError::PriceSheetNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_bad_time_is_rejected() {
        let (catalog, sheet) = setup().await;

        let result = catalog
            .create_movie(new_movie(sheet, vec![entry(1, "noonish")]))
            .await;

        assert!(matches!(result, Err(CatalogError::InvalidTime(_))));
    }

    #[tokio::test]
    async fn test_unknown_movie() {
        let (catalog, _) = setup().await;

        let result = catalog.list_showtimes(Uuid::new_v4(), None).await;

        assert!(matches!(result, Err(CatalogError::MovieNotFound(_))));
    }
}
