//! Order and modification requests, and the per-level update they resolve to.

use super::ids::Ticket;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Venue sentinel for "no stop-loss / take-profit level set".
pub const UNSET_LEVEL: f64 = 0.0;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side of the deal that closes a position opened on `self`.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order side '{0}' (expected BUY or SELL)")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("BUY") {
            Ok(Side::Buy)
        } else if s.eq_ignore_ascii_case("SELL") {
            Ok(Side::Sell)
        } else {
            Err(ParseSideError(s.to_string()))
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A market order submission.
///
/// `stop_loss` and `take_profit` use [`UNSET_LEVEL`] for "no level"; both are
/// forwarded to the venue verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub volume: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub comment: Option<String>,
}

impl OrderRequest {
    /// Market order without protective levels or comment.
    pub fn market(symbol: impl Into<String>, side: Side, volume: f64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            volume,
            stop_loss: UNSET_LEVEL,
            take_profit: UNSET_LEVEL,
            comment: None,
        }
    }

    pub fn with_levels(mut self, stop_loss: f64, take_profit: f64) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// What to do with one protective level of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelUpdate {
    /// Leave the venue's current value untouched.
    Keep,
    /// Replace the level with this price.
    Set(f64),
    /// Reset the level to the venue's unset sentinel.
    Clear,
}

impl LevelUpdate {
    /// Resolve an `(apply, value)` pair. The flag alone decides whether the
    /// level is touched; a touched level without a value is cleared.
    pub fn from_flag(apply: bool, value: Option<f64>) -> Self {
        match (apply, value) {
            (false, _) => LevelUpdate::Keep,
            (true, Some(price)) => LevelUpdate::Set(price),
            (true, None) => LevelUpdate::Clear,
        }
    }

    /// The level the venue should hold after applying this update to `current`.
    pub fn resolve(self, current: f64) -> f64 {
        match self {
            LevelUpdate::Keep => current,
            LevelUpdate::Set(price) => price,
            LevelUpdate::Clear => UNSET_LEVEL,
        }
    }

    pub fn touches(self) -> bool {
        !matches!(self, LevelUpdate::Keep)
    }
}

/// Stop-loss / take-profit adjustment for an open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub ticket: Ticket,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub apply_stop_loss: bool,
    pub apply_take_profit: bool,
}

impl ModifyRequest {
    /// A request that touches neither level.
    pub fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            stop_loss: None,
            take_profit: None,
            apply_stop_loss: false,
            apply_take_profit: false,
        }
    }

    pub fn stop_loss(mut self, value: Option<f64>) -> Self {
        self.stop_loss = value;
        self.apply_stop_loss = true;
        self
    }

    pub fn take_profit(mut self, value: Option<f64>) -> Self {
        self.take_profit = value;
        self.apply_take_profit = true;
        self
    }

    pub fn stop_loss_update(&self) -> LevelUpdate {
        LevelUpdate::from_flag(self.apply_stop_loss, self.stop_loss)
    }

    pub fn take_profit_update(&self) -> LevelUpdate {
        LevelUpdate::from_flag(self.apply_take_profit, self.take_profit)
    }
}
