use super::ids::Ticket;
use super::order::{Side, UNSET_LEVEL};
use serde::{Deserialize, Serialize};

/// Snapshot of one open position, rebuilt on every listing.
///
/// Field names on the wire follow the terminal's vocabulary (`type`,
/// `price_open`, `sl`, ...). Unset protective levels are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticket: Ticket,
    pub symbol: String,
    #[serde(rename = "type")]
    pub side: Side,
    pub volume: f64,
    #[serde(rename = "price_open")]
    pub open_price: f64,
    #[serde(rename = "sl")]
    pub stop_loss: Option<f64>,
    #[serde(rename = "tp")]
    pub take_profit: Option<f64>,
    #[serde(rename = "price_current")]
    pub current_price: f64,
    pub profit: f64,
    /// Unix seconds (UTC).
    #[serde(rename = "time")]
    pub open_time: i64,
}

impl Position {
    /// Map a raw venue level (where [`UNSET_LEVEL`] means "none") to an option.
    pub fn level_from_venue(raw: f64) -> Option<f64> {
        if raw == UNSET_LEVEL || raw.is_nan() {
            None
        } else {
            Some(raw)
        }
    }

    /// Inverse of [`Position::level_from_venue`].
    pub fn level_to_venue(level: Option<f64>) -> f64 {
        level.unwrap_or(UNSET_LEVEL)
    }
}
