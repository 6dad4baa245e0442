use serde::{Deserialize, Serialize};

/// Latest quote for a symbol. Not retained anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Unix seconds (UTC).
    pub time: i64,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: u64,
}
