//! Gift card models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::payment::info_data;

/// Key in a payment/refund info payload naming the gift card used.
const GIFT_CARD_INFO_KEY: &str = "gift_card";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GiftCard {
    pub gift_card_id: i64,
    pub secret: String,
}

/// A value movement on a gift card. The first one records where the card
/// was bought.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GiftCardTransaction {
    pub transaction_id: i64,
    pub gift_card_id: i64,
    #[serde(default)]
    pub order_id: Option<i64>,
    pub value: Decimal,
    pub datetime: DateTime<Utc>,
}

/// The gift card reference stored in an info payload, if the key is present.
///
/// The value is returned untouched (it may be a number, a numeric string or
/// even `null`); resolving it is up to the caller.
pub fn gift_card_reference(info: Option<&str>) -> Option<serde_json::Value> {
    info_data(info).remove(GIFT_CARD_INFO_KEY)
}
