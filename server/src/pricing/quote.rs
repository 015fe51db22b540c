use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{BasePrices, SeatSelection};

/// Itemised price of a seat selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: Decimal,
    pub tax: Decimal,
    /// Discount actually applied; never more than `subtotal + tax`.
    pub discount: Decimal,
    pub total: Decimal,
}

/// Rounds half away from zero and always carries two decimal places.
pub fn round_cents(amount: Decimal) -> Decimal {
    let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    cents
}

/// Amounts too large to represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quote amount is out of range")]
pub struct QuoteOverflow;

/// `total = max(0, subtotal + tax - discount)` with tax rounded to cents.
pub fn quote(
    seats: &[SeatSelection],
    prices: &BasePrices,
    tax_rate: Decimal,
    discount: Decimal,
) -> Result<Quote, QuoteOverflow> {
    let subtotal = seats
        .iter()
        .map(|selection| prices.price_for(selection.age))
        .try_fold(Decimal::ZERO, |sum, price| sum.checked_add(price))
        .ok_or(QuoteOverflow)?;
    let subtotal = round_cents(subtotal);
    let tax = round_cents(subtotal.checked_mul(tax_rate).ok_or(QuoteOverflow)?);
    let gross = subtotal.checked_add(tax).ok_or(QuoteOverflow)?;
    let discount = round_cents(discount.max(Decimal::ZERO).min(gross));

    Ok(Quote {
        subtotal,
        tax,
        discount,
        total: gross - discount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeCategory, SeatCoordinate};
    use proptest::prelude::*;

    fn dollars(amount: i64) -> Decimal {
        Decimal::new(amount * 100, 2)
    }

    fn prices() -> BasePrices {
        BasePrices {
            adult: dollars(20),
            child: dollars(15),
            senior: dollars(12),
        }
    }

    fn seats(ages: &[AgeCategory]) -> Vec<SeatSelection> {
        ages.iter()
            .zip(1u16..)
            .map(|(age, number)| SeatSelection {
                seat: SeatCoordinate::new('A', number).unwrap(),
                age: *age,
            })
            .collect()
    }

    #[test]
    fn test_two_adults_at_ten_percent() {
        let q = quote(
            &seats(&[AgeCategory::Adult, AgeCategory::Adult]),
            &prices(),
            Decimal::new(10, 2),
            Decimal::ZERO,
        )
        .unwrap();

        assert_eq!(q.subtotal, dollars(40));
        assert_eq!(q.tax, dollars(4));
        assert_eq!(q.discount, Decimal::ZERO);
        assert_eq!(q.total, dollars(44));
    }

    #[test]
    fn test_flat_promotion_comes_off_the_total() {
        let q = quote(
            &seats(&[AgeCategory::Adult, AgeCategory::Adult]),
            &prices(),
            Decimal::new(10, 2),
            dollars(10),
        )
        .unwrap();

        assert_eq!(q.total, dollars(34));
    }

    #[test]
    fn test_mixed_ages_use_their_own_price() {
        let q = quote(
            &seats(&[AgeCategory::Adult, AgeCategory::Child, AgeCategory::Senior]),
            &prices(),
            Decimal::ZERO,
            Decimal::ZERO,
        )
        .unwrap();

        assert_eq!(q.subtotal, dollars(47));
    }

    #[test]
    fn test_discount_larger_than_order_floors_at_zero() {
        let q = quote(
            &seats(&[AgeCategory::Child]),
            &prices(),
            Decimal::new(10, 2),
            dollars(100),
        )
        .unwrap();

        assert_eq!(q.total, Decimal::ZERO);
        assert_eq!(q.discount, Decimal::new(1650, 2));
    }

    #[test]
    fn test_tax_rounds_half_cent_up() {
        let cheap = BasePrices {
            adult: Decimal::new(5, 2),
            child: Decimal::ZERO,
            senior: Decimal::ZERO,
        };

        let q = quote(
            &seats(&[AgeCategory::Adult]),
            &cheap,
            Decimal::new(10, 2),
            Decimal::ZERO,
        )
        .unwrap();

        assert_eq!(q.tax, Decimal::new(1, 2));
    }

    #[test]
    fn test_empty_selection_costs_nothing() {
        let q = quote(&[], &prices(), Decimal::new(10, 2), dollars(5)).unwrap();

        assert_eq!(q.total, Decimal::ZERO);
        assert_eq!(q.discount, Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_prices_are_an_error() {
        let huge = BasePrices {
            adult: Decimal::MAX / Decimal::TWO,
            child: Decimal::ZERO,
            senior: Decimal::ZERO,
        };
        let three = seats(&[AgeCategory::Adult, AgeCategory::Adult, AgeCategory::Adult]);

        assert_eq!(
            quote(&three, &huge, Decimal::new(10, 2), Decimal::ZERO),
            Err(QuoteOverflow)
        );
    }

    fn age() -> impl Strategy<Value = AgeCategory> {
        prop_oneof![
            Just(AgeCategory::Adult),
            Just(AgeCategory::Child),
            Just(AgeCategory::Senior),
        ]
    }

    proptest! {
        #[test]
        fn test_total_matches_formula(
            ages in prop::collection::vec(age(), 0..12),
            adult in 0i64..10_000,
            child in 0i64..10_000,
            senior in 0i64..10_000,
            rate_bp in 0i64..=10_000,
            discount in 0i64..50_000,
        ) {
            let prices = BasePrices {
                adult: Decimal::new(adult, 2),
                child: Decimal::new(child, 2),
                senior: Decimal::new(senior, 2),
            };
            let rate = Decimal::new(rate_bp, 4);
            let discount = Decimal::new(discount, 2);
            let selection = seats(&ages);

            let q = quote(&selection, &prices, rate, discount).unwrap();

            let expected_subtotal: Decimal =
                selection.iter().map(|s| prices.price_for(s.age)).sum();
            prop_assert_eq!(q.subtotal, expected_subtotal);
            prop_assert!((q.tax - expected_subtotal * rate).abs() <= Decimal::new(5, 3));
            prop_assert_eq!(q.total, (q.subtotal + q.tax - discount).max(Decimal::ZERO));
            prop_assert!(q.total >= Decimal::ZERO);
            prop_assert!(q.discount <= discount);
        }
    }
}
