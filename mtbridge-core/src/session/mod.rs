//! Session capability: the narrow interface to a live terminal session.
//!
//! The bridge never talks to a venue directly. It calls one primitive of a
//! [`SessionCapability`] per command and classifies the [`SessionError`] it
//! gets back. Implementations own the connection and all venue state; they
//! are not expected to be safe for concurrent use, which is why the bridge
//! holds them behind a single lock.

pub mod paper;

use crate::domain::{Bar, LevelUpdate, OrderRequest, Position, Ticket, Tick, Timeframe};
use thiserror::Error;

pub use paper::{Deal, PaperSession, PaperSessionConfig, PaperSymbol};

/// Failures reported by a session driver.
///
/// Variants carry whatever signal the venue gives; the bridge decides what
/// each one means for the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("terminal session is not connected")]
    NotConnected,

    #[error("symbol '{symbol}' not found")]
    SymbolNotFound { symbol: String },

    #[error("position {ticket} not found")]
    TicketNotFound { ticket: Ticket },

    #[error("request rejected by terminal: {0}")]
    InvalidRequest(String),

    #[error("{comment} ({retcode})")]
    Rejected { retcode: u32, comment: String },

    #[error("terminal transport failure: {0}")]
    Transport(String),
}

impl SessionError {
    /// Venue rejection with the standard description for `retcode`.
    pub fn rejected(retcode: u32) -> Self {
        SessionError::Rejected {
            retcode,
            comment: retcode::describe(retcode).to_string(),
        }
    }
}

/// Trade server return codes used by the terminal protocol.
pub mod retcode {
    pub const DONE: u32 = 10009;
    pub const INVALID: u32 = 10013;
    pub const INVALID_VOLUME: u32 = 10014;
    pub const INVALID_STOPS: u32 = 10016;
    pub const MARKET_CLOSED: u32 = 10018;
    pub const NO_MONEY: u32 = 10019;

    pub fn describe(code: u32) -> &'static str {
        match code {
            DONE => "Request completed",
            INVALID => "Invalid request",
            INVALID_VOLUME => "Invalid volume",
            INVALID_STOPS => "Invalid stops",
            MARKET_CLOSED => "Market closed",
            NO_MONEY => "No money",
            _ => "Unknown trade server error",
        }
    }
}

/// Primitives of a terminal session.
///
/// Every method completes or fails before returning. None of them retry.
pub trait SessionCapability: Send {
    /// Open (or re-open) the connection to the terminal.
    fn connect(&mut self) -> Result<(), SessionError>;

    /// Tear the connection down. Safe to call when already disconnected.
    fn shutdown(&mut self);

    fn is_connected(&self) -> bool;

    /// Up to `count` most recent bars. Ordering is implementation-defined.
    fn get_rates(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: u32,
    ) -> Result<Vec<Bar>, SessionError>;

    fn get_tick(&self, symbol: &str) -> Result<Tick, SessionError>;

    fn list_positions(&self) -> Result<Vec<Position>, SessionError>;

    /// Place a market order and return the ticket of the resulting position.
    fn submit_order(&mut self, order: &OrderRequest) -> Result<Ticket, SessionError>;

    /// Close the whole position with an opposite-side deal.
    fn close_position(&mut self, ticket: Ticket) -> Result<(), SessionError>;

    fn modify_position(
        &mut self,
        ticket: Ticket,
        stop_loss: LevelUpdate,
        take_profit: LevelUpdate,
    ) -> Result<(), SessionError>;
}
