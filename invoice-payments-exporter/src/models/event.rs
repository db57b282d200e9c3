//! Event and order models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An event whose sales are exported.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub event_id: i64,
    pub slug: String,
    pub name: String,
    /// IANA timezone name, e.g. `Europe/Berlin`.
    pub timezone: String,
}

/// An order placed for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub event_id: i64,
    pub code: String,
}
