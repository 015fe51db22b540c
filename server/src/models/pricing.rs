use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::seat::AgeCategory;

/// Largest price or discount a sheet or promotion may carry (`NUMERIC(10, 2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Decimal places kept for a fee rate (`NUMERIC(6, 4)`).
pub const FEE_RATE_SCALE: u32 = 4;

/// Base ticket prices per age category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePrices {
    pub adult: Decimal,
    pub child: Decimal,
    pub senior: Decimal,
}

impl BasePrices {
    pub fn price_for(&self, age: AgeCategory) -> Decimal {
        match age {
            AgeCategory::Adult => self.adult,
            AgeCategory::Child => self.child,
            AgeCategory::Senior => self.senior,
        }
    }
}

/// Prices plus the tax/fee rate, shared by any number of showtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSheet {
    pub id: Uuid,
    #[serde(flatten)]
    pub prices: BasePrices,
    /// Fraction, e.g. `0.10` for 10%.
    pub fee_rate: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceSheetUpdate {
    pub adult: Decimal,
    pub child: Decimal,
    pub senior: Decimal,
    /// Omitted: keeps the sheet's current rate, or the configured default
    /// for a new sheet.
    pub fee_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    /// Flat currency amount.
    pub discount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPromotion {
    pub code: String,
    pub discount: Decimal,
}
