//! Base prices, promotions and quotes.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    BasePrices, NewPromotion, PriceSheet, PriceSheetUpdate, Promotion, SeatSelection,
    FEE_RATE_SCALE, MAX_AMOUNT,
};
use crate::store::{Store, StoreError};

pub mod quote;

pub use quote::{quote, round_cents, Quote, QuoteOverflow};

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("showtime {0} not found for this movie")]
    ShowtimeNotFound(Uuid),

    #[error("price sheet {0} not found")]
    PriceSheetNotFound(Uuid),

    #[error("promotion code '{0}' is not valid")]
    PromotionNotFound(String),

    #[error("promotion code '{0}' already exists")]
    DuplicatePromotion(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Overflow(#[from] QuoteOverflow),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub movie_id: Uuid,
    pub showtime_id: Uuid,
    pub seats: Vec<SeatSelection>,
    pub promotion_code: Option<String>,
}

#[derive(Clone)]
pub struct PricingEngine {
    store: Arc<dyn Store>,
    default_fee_rate: Decimal,
}

impl PricingEngine {
    pub fn new(store: Arc<dyn Store>, default_fee_rate: Decimal) -> Self {
        Self {
            store,
            default_fee_rate,
        }
    }

    /// Resolves the sheet through the showtime, which must belong to `movie_id`.
    pub async fn price_sheet_for(
        &self,
        movie_id: Uuid,
        showtime_id: Uuid,
    ) -> Result<PriceSheet, PricingError> {
        let showtime = self
            .store
            .get_showtime(showtime_id)
            .await?
            .filter(|showtime| showtime.movie_id == movie_id)
            .ok_or(PricingError::ShowtimeNotFound(showtime_id))?;

        self.store
            .price_sheet(showtime.price_sheet_id)
            .await?
            .ok_or(PricingError::PriceSheetNotFound(showtime.price_sheet_id))
    }

    pub async fn get_base_prices(
        &self,
        movie_id: Uuid,
        showtime_id: Uuid,
    ) -> Result<BasePrices, PricingError> {
        Ok(self.price_sheet_for(movie_id, showtime_id).await?.prices)
    }

    /// Exact match only: `SUMMER10` and `summer10` are different codes.
    pub async fn lookup_promotion(&self, code: &str) -> Result<Promotion, PricingError> {
        self.store
            .find_promotion(code)
            .await?
            .ok_or_else(|| PricingError::PromotionNotFound(code.to_string()))
    }

    /// The quote a commit with the same inputs would charge.
    pub async fn preview(&self, request: &QuoteRequest) -> Result<Quote, PricingError> {
        let sheet = self
            .price_sheet_for(request.movie_id, request.showtime_id)
            .await?;
        let discount = match request.promotion_code.as_deref() {
            Some(code) => self.lookup_promotion(code).await?.discount,
            None => Decimal::ZERO,
        };

        Ok(quote(&request.seats, &sheet.prices, sheet.fee_rate, discount)?)
    }

    pub async fn upsert_price_sheet(
        &self,
        id: Uuid,
        update: PriceSheetUpdate,
    ) -> Result<PriceSheet, PricingError> {
        for (label, price) in [
            ("adult", update.adult),
            ("child", update.child),
            ("senior", update.senior),
        ] {
            if price.is_sign_negative() {
                return Err(PricingError::Invalid(format!(
                    "{label} price must not be negative"
                )));
            }
            if price > MAX_AMOUNT {
                return Err(PricingError::Invalid(format!(
                    "{label} price must not exceed {MAX_AMOUNT}"
                )));
            }
        }

        let fee_rate = match update.fee_rate {
            Some(rate) => rate,
            None => self
                .store
                .price_sheet(id)
                .await?
                .map_or(self.default_fee_rate, |current| current.fee_rate),
        };
        if fee_rate.is_sign_negative() || fee_rate > Decimal::ONE {
            return Err(PricingError::Invalid(
                "fee rate must be between 0 and 1".to_string(),
            ));
        }
        if fee_rate.normalize().scale() > FEE_RATE_SCALE {
            return Err(PricingError::Invalid(format!(
                "fee rate must have at most {FEE_RATE_SCALE} decimal places"
            )));
        }

        let sheet = PriceSheet {
            id,
            prices: BasePrices {
                adult: round_cents(update.adult),
                child: round_cents(update.child),
                senior: round_cents(update.senior),
            },
            fee_rate,
        };
        self.store.upsert_price_sheet(&sheet).await?;
        tracing::info!(price_sheet_id = %id, %fee_rate, "Price sheet saved");
        Ok(sheet)
    }

    pub async fn create_promotion(&self, new: NewPromotion) -> Result<Promotion, PricingError> {
        if new.code.is_empty() || new.code.chars().any(char::is_whitespace) {
            return Err(PricingError::Invalid(
                "promotion code must be non-empty and contain no whitespace".to_string(),
            ));
        }
        if new.discount <= Decimal::ZERO {
            return Err(PricingError::Invalid(
                "promotion discount must be positive".to_string(),
            ));
        }
        if new.discount > MAX_AMOUNT {
            return Err(PricingError::Invalid(format!(
                "promotion discount must not exceed {MAX_AMOUNT}"
            )));
        }

        let promotion = Promotion {
            id: Uuid::new_v4(),
            code: new.code,
            discount: round_cents(new.discount),
        };
        match self.store.insert_promotion(&promotion).await {
            Ok(()) => Ok(promotion),
            Err(StoreError::Duplicate) => Err(PricingError::DuplicatePromotion(promotion.code)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_promotion(&self, code: &str) -> Result<(), PricingError> {
        if self.store.delete_promotion(code).await? {
            Ok(())
        } else {
            Err(PricingError::PromotionNotFound(code.to_string()))
        }
    }
}
