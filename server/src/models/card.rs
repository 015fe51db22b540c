use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored payment method as shown to its owner. The number is never part of
/// this view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub holder_name: String,
    pub card_type: String,
    pub last_four: String,
    /// `MM/YY`
    pub expiry: String,
    pub billing_address: String,
    pub created_at: DateTime<Utc>,
}

impl CreditCard {
    pub fn masked_number(&self) -> String {
        format!("**** **** **** {}", self.last_four)
    }
}

/// Card row as persisted: the public view plus the encrypted number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCard {
    pub card: CreditCard,
    pub encrypted_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCard {
    pub holder_name: String,
    pub number: String,
    pub card_type: String,
    pub expiry: String,
    pub billing_address: String,
}
