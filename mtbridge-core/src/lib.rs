//! mtbridge core: the order/position lifecycle bridge.
//!
//! This crate contains everything between a parsed request and a terminal
//! session:
//! - Domain types (bars, ticks, positions, order and modify requests, tickets)
//! - The `SessionCapability` trait the bridge drives, plus an in-memory paper venue
//! - The `LifecycleBridge`: validation, connectivity guard, exclusive session
//!   access, and classification of every failure into an `ErrorKind`

pub mod bridge;
pub mod domain;
pub mod session;

pub use bridge::{BridgeError, ErrorKind, Health, LifecycleBridge, Outcome, DEFAULT_RATE_COUNT};
pub use session::{PaperSession, PaperSessionConfig, SessionCapability, SessionError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the gateway moves across threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Tick>();
        require_sync::<domain::Tick>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::OrderRequest>();
        require_sync::<domain::OrderRequest>();
        require_send::<domain::ModifyRequest>();
        require_sync::<domain::ModifyRequest>();
        require_send::<domain::Ticket>();
        require_sync::<domain::Ticket>();

        // Outcomes
        require_send::<BridgeError>();
        require_sync::<BridgeError>();
        require_send::<SessionError>();
        require_sync::<SessionError>();

        // The bridge is shared behind an Arc by the gateway.
        require_send::<LifecycleBridge<PaperSession>>();
        require_sync::<LifecycleBridge<PaperSession>>();
    }

    /// Architecture contract: the bridge reaches the venue only through the
    /// injected session, so any `SessionCapability` can stand in for a terminal.
    #[test]
    fn bridge_is_generic_over_the_session() {
        fn _build<S: SessionCapability>(session: S) -> LifecycleBridge<S> {
            LifecycleBridge::new(session)
        }
        let bridge = LifecycleBridge::new(PaperSession::with_defaults());
        assert_eq!(bridge.health().unwrap(), Health { connected: false });
    }
}
