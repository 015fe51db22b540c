//! Stored payment methods.
//!
//! Card numbers are encrypted before they reach the store and only the last
//! four digits are kept in clear.

use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CreditCard, NewCard, StoredCard};
use crate::store::{Store, StoreError};
use crate::utils::crypto::{CardCipher, CryptoError};

pub const MAX_CARDS_PER_USER: usize = 3;

#[derive(Debug, Error)]
pub enum CardError {
    #[error("payment method {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    Invalid(String),

    #[error("at most {0} payment methods can be stored")]
    LimitReached(usize),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct CardService {
    store: Arc<dyn Store>,
    cipher: Arc<CardCipher>,
}

impl CardService {
    pub fn new(store: Arc<dyn Store>, cipher: Arc<CardCipher>) -> Self {
        Self { store, cipher }
    }

    pub async fn add(&self, user_id: Uuid, new_card: NewCard) -> Result<CreditCard, CardError> {
        let holder_name = new_card.holder_name.trim();
        if holder_name.is_empty() {
            return Err(CardError::Invalid("card holder name is required".to_string()));
        }
        let number = normalize_number(&new_card.number)?;
        validate_expiry(&new_card.expiry, Utc::now().date_naive())?;

        let existing = self.store.cards_for_user(user_id).await?;
        if existing.len() >= MAX_CARDS_PER_USER {
            return Err(CardError::LimitReached(MAX_CARDS_PER_USER));
        }

        let card = CreditCard {
            id: Uuid::new_v4(),
            user_id,
            holder_name: holder_name.to_string(),
            card_type: new_card.card_type.trim().to_string(),
            last_four: number[number.len() - 4..].to_string(),
            expiry: new_card.expiry.trim().to_string(),
            billing_address: new_card.billing_address.trim().to_string(),
            created_at: Utc::now(),
        };
        let stored = StoredCard {
            encrypted_number: self.cipher.encrypt(&number)?,
            card,
        };
        self.store.insert_card(&stored).await?;
        tracing::info!(card_id = %stored.card.id, %user_id, "Payment method added");
        Ok(stored.card)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<CreditCard>, CardError> {
        let cards = self.store.cards_for_user(user_id).await?;
        Ok(cards.into_iter().map(|stored| stored.card).collect())
    }

    /// Bookings paid with the card keep their reference.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), CardError> {
        if self.store.delete_card(user_id, id).await? {
            tracing::info!(card_id = %id, %user_id, "Payment method deleted");
            Ok(())
        } else {
            Err(CardError::NotFound(id))
        }
    }

    /// Full number, for the owner only. Other users get `NotFound`.
    pub async fn reveal(&self, user_id: Uuid, id: Uuid) -> Result<String, CardError> {
        let stored = self
            .store
            .get_card(id)
            .await?
            .filter(|stored| stored.card.user_id == user_id)
            .ok_or(CardError::NotFound(id))?;
        Ok(self.cipher.decrypt(&stored.encrypted_number)?)
    }
}

/// Strips spaces and dashes, then checks length and the Luhn digit.
fn normalize_number(raw: &str) -> Result<String, CardError> {
    let number: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(CardError::Invalid("card number must contain only digits".to_string()));
    }
    if !(12..=19).contains(&number.len()) {
        return Err(CardError::Invalid(
            "card number must be 12 to 19 digits".to_string(),
        ));
    }
    if !luhn_valid(&number) {
        return Err(CardError::Invalid("card number is not valid".to_string()));
    }
    Ok(number)
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// `MM/YY`; a card is valid through the last day of its expiry month.
fn validate_expiry(expiry: &str, today: NaiveDate) -> Result<(), CardError> {
    let invalid = || CardError::Invalid("expiry must be MM/YY".to_string());
    let (month, year) = expiry.trim().split_once('/').ok_or_else(invalid)?;
    if month.len() != 2 || year.len() != 2 {
        return Err(invalid());
    }
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    let year = 2000 + year;
    if (year, month) < (today.year(), today.month()) {
        return Err(CardError::Invalid("card has expired".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> CardService {
        let cipher = CardCipher::derive(b"0123456789abcdef0123456789abcdef").unwrap();
        CardService::new(Arc::new(MemoryStore::new()), Arc::new(cipher))
    }

    fn visa() -> NewCard {
        NewCard {
            holder_name: "Pat Doe".to_string(),
            number: "4111 1111 1111 1111".to_string(),
            card_type: "visa".to_string(),
            expiry: "12/99".to_string(),
            billing_address: "1 Main St".to_string(),
        }
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4111111111111111"));
        assert!(luhn_valid("5555555555554444"));
        assert!(!luhn_valid("4111111111111112"));
    }

    #[test]
    fn test_number_rules() {
        assert_eq!(
            normalize_number("4111-1111-1111-1111").unwrap(),
            "4111111111111111"
        );
        assert!(matches!(normalize_number("4111"), Err(CardError::Invalid(_))));
        assert!(matches!(
            normalize_number("4111x111111111111"),
            Err(CardError::Invalid(_))
        ));
    }

    #[test]
    fn test_expiry_rules() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        assert!(validate_expiry("06/24", today).is_ok());
        assert!(validate_expiry("01/30", today).is_ok());
        assert!(validate_expiry("05/24", today).is_err());
        assert!(validate_expiry("13/25", today).is_err());
        assert!(validate_expiry("6/25", today).is_err());
        assert!(validate_expiry("0625", today).is_err());
    }

    #[tokio::test]
    async fn test_list_is_masked_and_reveal_is_owner_only() {
        let cards = service();
        let owner = Uuid::new_v4();

        let card = cards.add(owner, visa()).await.unwrap();
        let listed = cards.list(owner).await.unwrap();

        assert_eq!(listed, vec![card.clone()]);
        assert_eq!(listed[0].masked_number(), "**** **** **** 1111");
        assert_eq!(
            cards.reveal(owner, card.id).await.unwrap(),
            "4111111111111111"
        );
        assert!(matches!(
            cards.reveal(Uuid::new_v4(), card.id).await,
            Err(CardError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_limit_per_user() {
        let cards = service();
        let owner = Uuid::new_v4();
        for _ in 0..MAX_CARDS_PER_USER {
            cards.add(owner, visa()).await.unwrap();
        }

        let fourth = cards.add(owner, visa()).await;

        assert!(matches!(fourth, Err(CardError::LimitReached(3))));
        assert!(cards.add(Uuid::new_v4(), visa()).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_only_own_card() {
        let cards = service();
        let owner = Uuid::new_v4();
        let card = cards.add(owner, visa()).await.unwrap();

        assert!(matches!(
            cards.delete(Uuid::new_v4(), card.id).await,
            Err(CardError::NotFound(_))
        ));
        cards.delete(owner, card.id).await.unwrap();
        assert!(cards.list(owner).await.unwrap().is_empty());
    }
}
