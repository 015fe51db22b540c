use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{TokenError, TokenVerifier};
use crate::booking::BookingService;
use crate::cards::CardService;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::pricing::PricingEngine;
use crate::seat_map::SeatMap;
use crate::store::Store;
use crate::utils::crypto::{CardCipher, CryptoError};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("identity tokens: {0}")]
    Token(#[from] TokenError),

    #[error("card encryption: {0}")]
    Crypto(#[from] CryptoError),
}

/// Services shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub seat_map: SeatMap,
    pub pricing: PricingEngine,
    pub bookings: BookingService,
    pub cards: CardService,
    pub verifier: TokenVerifier,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Result<Self, StateError> {
        Self::build(
            store,
            config.jwt_secret.as_bytes(),
            config.card_encryption_secret.as_bytes(),
            config.default_fee_rate,
        )
    }

    pub fn build(
        store: Arc<dyn Store>,
        jwt_secret: &[u8],
        card_secret: &[u8],
        default_fee_rate: Decimal,
    ) -> Result<Self, StateError> {
        let cipher = Arc::new(CardCipher::derive(card_secret)?);
        Ok(Self {
            catalog: Catalog::new(store.clone()),
            seat_map: SeatMap::new(store.clone()),
            pricing: PricingEngine::new(store.clone(), default_fee_rate),
            bookings: BookingService::new(store.clone()),
            cards: CardService::new(store, cipher),
            verifier: TokenVerifier::new(jwt_secret)?,
        })
    }
}
