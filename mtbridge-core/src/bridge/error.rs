//! Outcome taxonomy and classification of session failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::session::SessionError;

/// Result of every bridge command.
pub type Outcome<T> = Result<T, BridgeError>;

/// Coarse failure class a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The session is unavailable. Retry later.
    NotConnected,
    /// The request failed local validation or the venue refused its shape. Fix the request.
    InvalidArgument,
    /// The referenced ticket or symbol does not exist on the venue. Final.
    NotFound,
    /// The venue declined a mutating operation for business reasons. Final.
    OrderRejected,
    /// Unexpected low-level failure talking to the session. Retry later.
    CapabilityError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotConnected => "not_connected",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::OrderRejected => "order_rejected",
            ErrorKind::CapabilityError => "capability_error",
        }
    }

    /// Whether repeating the same request later could succeed. Retrying a
    /// mutating command can duplicate its effect.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::NotConnected | ErrorKind::CapabilityError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed bridge command: kind plus a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("not connected: {0}")]
    NotConnected(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("capability error: {0}")]
    Capability(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::NotConnected(_) => ErrorKind::NotConnected,
            BridgeError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            BridgeError::NotFound(_) => ErrorKind::NotFound,
            BridgeError::OrderRejected(_) => ErrorKind::OrderRejected,
            BridgeError::Capability(_) => ErrorKind::CapabilityError,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            BridgeError::NotConnected(d)
            | BridgeError::InvalidArgument(d)
            | BridgeError::NotFound(d)
            | BridgeError::OrderRejected(d)
            | BridgeError::Capability(d) => d,
        }
    }

    /// Classify a session failure raised while running a `command` command.
    /// `context` prefixes the venue's own message.
    pub(crate) fn from_session(err: SessionError, command: CommandClass, context: &str) -> Self {
        let detail = format!("{context}: {err}");
        match (command, err) {
            (_, SessionError::NotConnected) => BridgeError::NotConnected(detail),
            (_, SessionError::Transport(_)) => BridgeError::Capability(detail),

            (CommandClass::Read, SessionError::SymbolNotFound { .. })
            | (CommandClass::Read, SessionError::TicketNotFound { .. }) => {
                BridgeError::NotFound(detail)
            }
            (CommandClass::Read, _) => BridgeError::InvalidArgument(detail),

            (CommandClass::Submit, _) => BridgeError::OrderRejected(detail),

            (CommandClass::Manage, SessionError::TicketNotFound { .. }) => {
                BridgeError::NotFound(detail)
            }
            (CommandClass::Manage, _) => BridgeError::OrderRejected(detail),
        }
    }
}

/// How a session failure is read depends on what the command was doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandClass {
    /// Rates, tick, positions: absence is `NotFound`, refusal is `InvalidArgument`.
    Read,
    /// New orders: any venue refusal is `OrderRejected`.
    Submit,
    /// Close/modify of an existing ticket: unknown ticket is `NotFound`.
    Manage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ticket;
    use crate::session::retcode;

    fn kind_of(err: SessionError, command: CommandClass) -> ErrorKind {
        BridgeError::from_session(err, command, "ctx").kind()
    }

    #[test]
    fn read_failures_split_absence_from_refusal() {
        let missing = SessionError::SymbolNotFound {
            symbol: "NOPE".into(),
        };
        assert_eq!(kind_of(missing, CommandClass::Read), ErrorKind::NotFound);
        assert_eq!(
            kind_of(SessionError::InvalidRequest("empty".into()), CommandClass::Read),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn submit_failures_are_rejections() {
        assert_eq!(
            kind_of(SessionError::rejected(retcode::NO_MONEY), CommandClass::Submit),
            ErrorKind::OrderRejected
        );
        let missing = SessionError::SymbolNotFound {
            symbol: "NOPE".into(),
        };
        assert_eq!(kind_of(missing, CommandClass::Submit), ErrorKind::OrderRejected);
    }

    #[test]
    fn manage_failures_report_missing_ticket() {
        let missing = SessionError::TicketNotFound { ticket: Ticket(999) };
        assert_eq!(kind_of(missing, CommandClass::Manage), ErrorKind::NotFound);
        assert_eq!(
            kind_of(
                SessionError::rejected(retcode::MARKET_CLOSED),
                CommandClass::Manage
            ),
            ErrorKind::OrderRejected
        );
    }

    #[test]
    fn connectivity_and_transport_are_command_independent() {
        for command in [CommandClass::Read, CommandClass::Submit, CommandClass::Manage] {
            assert_eq!(
                kind_of(SessionError::NotConnected, command),
                ErrorKind::NotConnected
            );
            assert_eq!(
                kind_of(SessionError::Transport("pipe closed".into()), command),
                ErrorKind::CapabilityError
            );
        }
    }

    #[test]
    fn detail_keeps_venue_message() {
        let err = BridgeError::from_session(
            SessionError::rejected(retcode::INVALID_STOPS),
            CommandClass::Submit,
            "order for EURUSD failed",
        );
        assert_eq!(err.detail(), "order for EURUSD failed: Invalid stops (10016)");
        assert_eq!(
            err.to_string(),
            "order rejected: order for EURUSD failed: Invalid stops (10016)"
        );
    }

    #[test]
    fn retryable_kinds() {
        assert!(ErrorKind::NotConnected.is_retryable());
        assert!(ErrorKind::CapabilityError.is_retryable());
        assert!(!ErrorKind::InvalidArgument.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
        assert!(!ErrorKind::OrderRejected.is_retryable());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::OrderRejected).unwrap();
        assert_eq!(json, "\"order_rejected\"");
    }
}
