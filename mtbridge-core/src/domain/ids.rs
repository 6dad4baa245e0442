use serde::{Deserialize, Serialize};
use std::fmt;

/// Venue-assigned identifier of an open position.
///
/// Owned by the venue. This crate only compares tickets for equality and
/// passes them back on close/modify requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(pub u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Ticket {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
