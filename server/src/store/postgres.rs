use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use super::{BookingStore, CardStore, CatalogStore, PricingStore, SeatStore, StoreError};
use crate::models::{
    AgeCategory, BasePrices, Booking, BookingDraft, CreditCard, Movie, PriceSheet, Promotion,
    SeatCoordinate, SeatSelection, ShowSlot, Showtime, StoredCard,
};

const MOVIE_COLUMNS: &str = "id, name, category, genre, cast_members, director, producer, \
     synopsis, trailer_url, mpaa_rating, critic_score, created_at";

const SHOWTIME_COLUMNS: &str =
    "id, movie_id, show_date, show_clock, display_time, showroom, archived, price_sheet_id";

const CARD_COLUMNS: &str = "id, user_id, holder_name, card_type, last_four, expiry, \
     billing_address, encrypted_number, created_at";

#[derive(Debug, FromRow)]
struct MovieRow {
    id: Uuid,
    name: String,
    category: String,
    genre: String,
    cast_members: Vec<String>,
    director: String,
    producer: String,
    synopsis: String,
    trailer_url: Option<String>,
    mpaa_rating: String,
    critic_score: Option<i16>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovieRow> for Movie {
    type Error = StoreError;

    fn try_from(row: MovieRow) -> Result<Self, Self::Error> {
        Ok(Movie {
            id: row.id,
            name: row.name,
            category: row.category.parse().map_err(StoreError::Corrupt)?,
            genre: row.genre,
            cast: row.cast_members,
            director: row.director,
            producer: row.producer,
            synopsis: row.synopsis,
            trailer_url: row.trailer_url,
            mpaa_rating: row.mpaa_rating,
            critic_score: row.critic_score,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ShowtimeRow {
    id: Uuid,
    movie_id: Uuid,
    show_date: NaiveDate,
    show_clock: NaiveTime,
    display_time: String,
    showroom: String,
    archived: bool,
    price_sheet_id: Uuid,
}

impl From<ShowtimeRow> for Showtime {
    fn from(row: ShowtimeRow) -> Self {
        Showtime {
            id: row.id,
            movie_id: row.movie_id,
            date: row.show_date,
            time: row.display_time,
            clock: row.show_clock,
            showroom: row.showroom,
            archived: row.archived,
            price_sheet_id: row.price_sheet_id,
        }
    }
}

#[derive(Debug, FromRow)]
struct PriceSheetRow {
    id: Uuid,
    adult_price: Decimal,
    child_price: Decimal,
    senior_price: Decimal,
    fee_rate: Decimal,
}

impl From<PriceSheetRow> for PriceSheet {
    fn from(row: PriceSheetRow) -> Self {
        PriceSheet {
            id: row.id,
            prices: BasePrices {
                adult: row.adult_price,
                child: row.child_price,
                senior: row.senior_price,
            },
            fee_rate: row.fee_rate,
        }
    }
}

#[derive(Debug, FromRow)]
struct PromotionRow {
    id: Uuid,
    code: String,
    discount: Decimal,
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    movie_id: Uuid,
    showtime_id: Uuid,
    user_id: Uuid,
    payment_method_id: Uuid,
    total: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SeatRow {
    booking_id: Uuid,
    seat_row: String,
    seat_number: i16,
    age_category: String,
}

#[derive(Debug, FromRow)]
struct CardRow {
    id: Uuid,
    user_id: Uuid,
    holder_name: String,
    card_type: String,
    last_four: String,
    expiry: String,
    billing_address: String,
    encrypted_number: String,
    created_at: DateTime<Utc>,
}

impl From<CardRow> for StoredCard {
    fn from(row: CardRow) -> Self {
        StoredCard {
            card: CreditCard {
                id: row.id,
                user_id: row.user_id,
                holder_name: row.holder_name,
                card_type: row.card_type,
                last_four: row.last_four,
                expiry: row.expiry,
                billing_address: row.billing_address,
                created_at: row.created_at,
            },
            encrypted_number: row.encrypted_number,
        }
    }
}

fn decode_coordinate(row: &str, number: i16) -> Result<SeatCoordinate, StoreError> {
    let letter = row
        .chars()
        .next()
        .ok_or_else(|| StoreError::Corrupt("empty seat row".to_string()))?;
    let number = u16::try_from(number)
        .map_err(|_| StoreError::Corrupt(format!("negative seat number {number}")))?;
    SeatCoordinate::new(letter, number).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn encode_number(seat: SeatCoordinate) -> Result<i16, StoreError> {
    i16::try_from(seat.number())
        .map_err(|_| StoreError::Corrupt(format!("seat number out of range: {seat}")))
}

fn duplicate_or_database(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Database(error),
    }
}

async fn upsert_slot(
    conn: &mut PgConnection,
    movie_id: Uuid,
    slot: &ShowSlot,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO showtimes (
            id, movie_id, show_date, show_clock, display_time, showroom, archived, price_sheet_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
        ON CONFLICT (movie_id, show_date, show_clock)
        DO UPDATE SET
            archived = FALSE,
            display_time = EXCLUDED.display_time,
            showroom = EXCLUDED.showroom,
            price_sheet_id = EXCLUDED.price_sheet_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(movie_id)
    .bind(slot.date)
    .bind(slot.clock)
    .bind(&slot.time)
    .bind(&slot.showroom)
    .bind(slot.price_sheet_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Postgres backend. Relies on the unique seat index for double-booking
/// protection and on one transaction per booking commit.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let rows: Vec<MovieRow> = sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Movie::try_from).collect()
    }

    async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        let row: Option<MovieRow> =
            sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Movie::try_from).transpose()
    }

    async fn insert_movie(&self, movie: &Movie, slots: &[ShowSlot]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO movies (
                id, name, category, genre, cast_members, director, producer,
                synopsis, trailer_url, mpaa_rating, critic_score, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(movie.id)
        .bind(&movie.name)
        .bind(movie.category.as_str())
        .bind(&movie.genre)
        .bind(&movie.cast)
        .bind(&movie.director)
        .bind(&movie.producer)
        .bind(&movie.synopsis)
        .bind(&movie.trailer_url)
        .bind(&movie.mpaa_rating)
        .bind(movie.critic_score)
        .bind(movie.created_at)
        .execute(&mut *tx)
        .await
        .map_err(duplicate_or_database)?;

        for slot in slots {
            upsert_slot(&mut tx, movie.id, slot).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_showtimes(
        &self,
        movie_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Showtime>, StoreError> {
        let rows: Vec<ShowtimeRow> = sqlx::query_as(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes \
             WHERE movie_id = $1 AND NOT archived AND ($2::date IS NULL OR show_date = $2)"
        ))
        .bind(movie_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Showtime::from).collect())
    }

    async fn get_showtime(&self, id: Uuid) -> Result<Option<Showtime>, StoreError> {
        let row: Option<ShowtimeRow> =
            sqlx::query_as(&format!("SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Showtime::from))
    }

    async fn replace_showdates(
        &self,
        movie_id: Uuid,
        slots: &[ShowSlot],
    ) -> Result<Vec<Showtime>, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE showtimes SET archived = TRUE WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;

        for slot in slots {
            upsert_slot(&mut tx, movie_id, slot).await?;
        }

        let rows: Vec<ShowtimeRow> = sqlx::query_as(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE movie_id = $1 AND NOT archived"
        ))
        .bind(movie_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(rows.into_iter().map(Showtime::from).collect())
    }
}

#[async_trait]
impl SeatStore for PgStore {
    async fn taken_seats(&self, showtime_id: Uuid) -> Result<BTreeSet<SeatCoordinate>, StoreError> {
        let rows: Vec<(String, i16)> =
            sqlx::query_as("SELECT seat_row, seat_number FROM seats WHERE showtime_id = $1")
                .bind(showtime_id)
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|(row, number)| decode_coordinate(row, *number))
            .collect()
    }
}

#[async_trait]
impl PricingStore for PgStore {
    async fn price_sheet(&self, id: Uuid) -> Result<Option<PriceSheet>, StoreError> {
        let row: Option<PriceSheetRow> = sqlx::query_as(
            "SELECT id, adult_price, child_price, senior_price, fee_rate FROM price_sheets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PriceSheet::from))
    }

    async fn upsert_price_sheet(&self, sheet: &PriceSheet) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO price_sheets (id, adult_price, child_price, senior_price, fee_rate)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id)
            DO UPDATE SET
                adult_price = EXCLUDED.adult_price,
                child_price = EXCLUDED.child_price,
                senior_price = EXCLUDED.senior_price,
                fee_rate = EXCLUDED.fee_rate,
                updated_at = now()
            "#,
        )
        .bind(sheet.id)
        .bind(sheet.prices.adult)
        .bind(sheet.prices.child)
        .bind(sheet.prices.senior)
        .bind(sheet.fee_rate)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_promotion(&self, code: &str) -> Result<Option<Promotion>, StoreError> {
        let row: Option<PromotionRow> =
            sqlx::query_as("SELECT id, code, discount FROM promotions WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|row| Promotion {
            id: row.id,
            code: row.code,
            discount: row.discount,
        }))
    }

    async fn insert_promotion(&self, promotion: &Promotion) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO promotions (id, code, discount) VALUES ($1, $2, $3)")
            .bind(promotion.id)
            .bind(&promotion.code)
            .bind(promotion.discount)
            .execute(&self.pool)
            .await
            .map_err(duplicate_or_database)?;

        Ok(())
    }

    async fn delete_promotion(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM promotions WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn commit_booking(&self, draft: &BookingDraft) -> Result<Booking, StoreError> {
        // Every early return drops `tx`, which rolls back.
        let mut tx = self.pool.begin().await?;

        let owned: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM credit_cards WHERE id = $1 AND user_id = $2")
                .bind(draft.payment_method_id)
                .bind(draft.user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Err(StoreError::UnknownPaymentMethod);
        }

        let taken: Vec<(String, i16)> =
            sqlx::query_as("SELECT seat_row, seat_number FROM seats WHERE showtime_id = $1")
                .bind(draft.showtime_id)
                .fetch_all(&mut *tx)
                .await?;
        let taken = taken
            .iter()
            .map(|(row, number)| decode_coordinate(row, *number))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let conflicts: Vec<SeatCoordinate> = draft
            .seats
            .iter()
            .map(|selection| selection.seat)
            .filter(|seat| taken.contains(seat))
            .collect();
        if !conflicts.is_empty() {
            return Err(StoreError::SeatTaken(conflicts));
        }

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO bookings (id, movie_id, showtime_id, user_id, payment_method_id, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING created_at
            "#,
        )
        .bind(draft.id)
        .bind(draft.movie_id)
        .bind(draft.showtime_id)
        .bind(draft.user_id)
        .bind(draft.payment_method_id)
        .bind(draft.total)
        .fetch_one(&mut *tx)
        .await?;

        // A concurrent commit that passed the check above still loses here:
        // the unique seat index blocks until the other transaction finishes.
        for selection in &draft.seats {
            let inserted = sqlx::query(
                r#"
                INSERT INTO seats (
                    id, booking_id, showtime_id, movie_id, seat_row, seat_number, age_category, user_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(draft.id)
            .bind(draft.showtime_id)
            .bind(draft.movie_id)
            .bind(selection.seat.row().to_string())
            .bind(encode_number(selection.seat)?)
            .bind(selection.age.as_str())
            .bind(draft.user_id)
            .execute(&mut *tx)
            .await;

            if let Err(error) = inserted {
                return Err(match duplicate_or_database(error) {
                    StoreError::Duplicate => StoreError::SeatTaken(vec![selection.seat]),
                    other => other,
                });
            }
        }

        tx.commit().await?;

        Ok(Booking {
            id: draft.id,
            movie_id: draft.movie_id,
            showtime_id: draft.showtime_id,
            user_id: draft.user_id,
            payment_method_id: draft.payment_method_id,
            total: draft.total,
            seats: draft.seats.clone(),
            created_at,
        })
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            r#"
            SELECT id, movie_id, showtime_id, user_id, payment_method_id, total, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let seat_rows: Vec<SeatRow> = sqlx::query_as(
            r#"
            SELECT booking_id, seat_row, seat_number, age_category
            FROM seats
            WHERE booking_id = ANY($1)
            ORDER BY seat_row, seat_number
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut seats: HashMap<Uuid, Vec<SeatSelection>> = HashMap::new();
        for row in seat_rows {
            let selection = SeatSelection {
                seat: decode_coordinate(&row.seat_row, row.seat_number)?,
                age: row
                    .age_category
                    .parse::<AgeCategory>()
                    .map_err(StoreError::Corrupt)?,
            };
            seats.entry(row.booking_id).or_default().push(selection);
        }

        Ok(rows
            .into_iter()
            .map(|row| Booking {
                seats: seats.remove(&row.id).unwrap_or_default(),
                id: row.id,
                movie_id: row.movie_id,
                showtime_id: row.showtime_id,
                user_id: row.user_id,
                payment_method_id: row.payment_method_id,
                total: row.total,
                created_at: row.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl CardStore for PgStore {
    async fn insert_card(&self, stored: &StoredCard) -> Result<(), StoreError> {
        let card = &stored.card;
        sqlx::query(
            r#"
            INSERT INTO credit_cards (
                id, user_id, holder_name, card_type, last_four, expiry,
                billing_address, encrypted_number, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(card.id)
        .bind(card.user_id)
        .bind(&card.holder_name)
        .bind(&card.card_type)
        .bind(&card.last_four)
        .bind(&card.expiry)
        .bind(&card.billing_address)
        .bind(&stored.encrypted_number)
        .bind(card.created_at)
        .execute(&self.pool)
        .await
        .map_err(duplicate_or_database)?;

        Ok(())
    }

    async fn cards_for_user(&self, user_id: Uuid) -> Result<Vec<StoredCard>, StoreError> {
        let rows: Vec<CardRow> = sqlx::query_as(&format!(
            "SELECT {CARD_COLUMNS} FROM credit_cards WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredCard::from).collect())
    }

    async fn get_card(&self, id: Uuid) -> Result<Option<StoredCard>, StoreError> {
        let row: Option<CardRow> =
            sqlx::query_as(&format!("SELECT {CARD_COLUMNS} FROM credit_cards WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(StoredCard::from))
    }

    async fn delete_card(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM credit_cards WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
