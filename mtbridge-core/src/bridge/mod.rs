//! Lifecycle bridge: mediates every external command onto the session.
//!
//! For each command the bridge:
//! 1. Validates the request locally (nothing reaches the session on failure)
//! 2. Takes the session lock, the single access point to the venue
//! 3. Checks connectivity (advisory: the link may still drop mid-call)
//! 4. Calls exactly one session primitive
//! 5. Normalizes the result, or classifies the failure into an [`ErrorKind`]
//!
//! There is no retry and no timeout here. A hung session hangs the caller.

pub mod error;

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::bar::sort_chronologically;
use crate::domain::{Bar, ModifyRequest, OrderRequest, Position, Ticket, Tick, Timeframe};
use crate::session::SessionCapability;

use error::CommandClass;
pub use error::{BridgeError, ErrorKind, Outcome};

/// Bars returned by `get_rates` when the caller does not ask for a count.
pub const DEFAULT_RATE_COUNT: u32 = 1000;

/// Connectivity report for health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub connected: bool,
}

/// Serializes all commands against one injected session.
pub struct LifecycleBridge<S> {
    session: Mutex<S>,
}

impl<S: SessionCapability> LifecycleBridge<S> {
    /// Wrap a session. The bridge does not connect it; see [`LifecycleBridge::connect`].
    pub fn new(session: S) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    // ── Session lifecycle ──────────────────────────────────────────────

    /// Connect the underlying session. Idempotent on a connected session.
    pub fn connect(&self) -> Outcome<()> {
        let mut session = self.lock()?;
        match session.connect() {
            Ok(()) => {
                info!("terminal session connected");
                Ok(())
            }
            Err(err) => {
                let err = BridgeError::from_session(err, CommandClass::Read, "connect failed");
                warn!(kind = %err.kind(), detail = err.detail(), "terminal session connect failed");
                Err(err)
            }
        }
    }

    /// Tear the session down. Later commands fail with `NotConnected`.
    pub fn shutdown(&self) -> Outcome<()> {
        self.lock()?.shutdown();
        info!("terminal session shut down");
        Ok(())
    }

    pub fn health(&self) -> Outcome<Health> {
        let connected = self.lock()?.is_connected();
        Ok(Health { connected })
    }

    /// Read-only view of the session under the bridge lock, e.g. the paper
    /// venue's deal log. Skips the connectivity guard.
    pub fn with_session<R>(&self, f: impl FnOnce(&S) -> R) -> Outcome<R> {
        let session = self.lock()?;
        Ok(f(&*session))
    }

    // ── Retrieval ──────────────────────────────────────────────────────

    /// Most recent `count` bars, oldest first.
    pub fn get_rates(&self, symbol: &str, timeframe: Timeframe, count: u32) -> Outcome<Vec<Bar>> {
        if count == 0 {
            return Err(BridgeError::InvalidArgument(
                "bar count must be at least 1".into(),
            ));
        }

        let session = self.connected()?;
        let mut bars = session
            .get_rates(symbol, timeframe, count)
            .map_err(|err| {
                self.failed(err, CommandClass::Read, format!("failed to get rates for {symbol}"))
            })?;
        drop(session);

        sort_chronologically(&mut bars);
        debug!(symbol, %timeframe, requested = count, returned = bars.len(), "rates fetched");
        Ok(bars)
    }

    pub fn get_tick(&self, symbol: &str) -> Outcome<Tick> {
        let session = self.connected()?;
        session.get_tick(symbol).map_err(|err| {
            self.failed(err, CommandClass::Read, format!("failed to get tick for {symbol}"))
        })
    }

    /// Open positions in the order the session reports them.
    pub fn list_positions(&self) -> Outcome<Vec<Position>> {
        let session = self.connected()?;
        session.list_positions().map_err(|err| {
            self.failed(err, CommandClass::Read, "failed to get positions".to_string())
        })
    }

    // ── Order lifecycle ────────────────────────────────────────────────

    /// Place a market order. Never retried: a repeated call after an
    /// ambiguous failure can open a second position.
    pub fn submit_order(&self, order: &OrderRequest) -> Outcome<Ticket> {
        validate_order(order)?;

        let mut session = self.connected()?;
        let result = session.submit_order(order);
        drop(session);

        match result {
            Ok(ticket) => {
                info!(
                    %ticket,
                    symbol = %order.symbol,
                    side = %order.side,
                    volume = order.volume,
                    "order sent successfully"
                );
                Ok(ticket)
            }
            Err(err) => Err(self.failed(
                err,
                CommandClass::Submit,
                format!("order for {} failed", order.symbol),
            )),
        }
    }

    /// Close the full position. An unknown or already-closed ticket is `NotFound`.
    pub fn close_position(&self, ticket: Ticket) -> Outcome<()> {
        let mut session = self.connected()?;
        let result = session.close_position(ticket);
        drop(session);

        match result {
            Ok(()) => {
                info!(%ticket, "position closed successfully");
                Ok(())
            }
            Err(err) => Err(self.failed(
                err,
                CommandClass::Manage,
                format!("failed to close position {ticket}"),
            )),
        }
    }

    /// Adjust protective levels. Only levels whose apply flag is set are
    /// touched; a flagged level without a value is cleared. A request with
    /// no flags still reaches the session and succeeds vacuously.
    pub fn modify_position(&self, request: &ModifyRequest) -> Outcome<()> {
        validate_modify(request)?;

        let stop_loss = request.stop_loss_update();
        let take_profit = request.take_profit_update();
        let ticket = request.ticket;

        let mut session = self.connected()?;
        let result = session.modify_position(ticket, stop_loss, take_profit);
        drop(session);

        match result {
            Ok(()) => {
                info!(%ticket, ?stop_loss, ?take_profit, "protection updated");
                Ok(())
            }
            Err(err) => Err(self.failed(
                err,
                CommandClass::Manage,
                format!("failed to modify position {ticket}"),
            )),
        }
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn lock(&self) -> Outcome<MutexGuard<'_, S>> {
        self.session
            .lock()
            .map_err(|_| BridgeError::Capability("session lock poisoned by an earlier panic".into()))
    }

    /// Lock the session and apply the connectivity guard.
    fn connected(&self) -> Outcome<MutexGuard<'_, S>> {
        let session = self.lock()?;
        if !session.is_connected() {
            warn!("command refused: terminal session is not connected");
            return Err(BridgeError::NotConnected(
                "terminal session is not connected".into(),
            ));
        }
        Ok(session)
    }

    fn failed(
        &self,
        err: crate::session::SessionError,
        command: CommandClass,
        context: String,
    ) -> BridgeError {
        let err = BridgeError::from_session(err, command, &context);
        warn!(kind = %err.kind(), detail = err.detail(), "command failed");
        err
    }
}

/// Local checks run before any session call.
///
/// Lot limits and lot-step granularity are the venue's business and surface
/// as `OrderRejected`.
fn validate_order(order: &OrderRequest) -> Outcome<()> {
    if order.symbol.trim().is_empty() {
        return Err(BridgeError::InvalidArgument("symbol must not be empty".into()));
    }
    if !(order.volume.is_finite() && order.volume > 0.0) {
        return Err(BridgeError::InvalidArgument(format!(
            "volume must be a positive number, got {}",
            order.volume
        )));
    }
    if !order.stop_loss.is_finite() || !order.take_profit.is_finite() {
        return Err(BridgeError::InvalidArgument(
            "stop-loss and take-profit must be finite".into(),
        ));
    }
    Ok(())
}

/// Flagged levels must be finite; `None` on a flagged level means "clear".
fn validate_modify(request: &ModifyRequest) -> Outcome<()> {
    let bad = |apply: bool, level: Option<f64>| apply && level.is_some_and(|v| !v.is_finite());
    if bad(request.apply_stop_loss, request.stop_loss)
        || bad(request.apply_take_profit, request.take_profit)
    {
        return Err(BridgeError::InvalidArgument(format!(
            "stop-loss and take-profit must be finite (position {})",
            request.ticket
        )));
    }
    Ok(())
}
