//! Scripted session double shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mtbridge_core::domain::{
    Bar, LevelUpdate, OrderRequest, Position, Side, Ticket, Tick, Timeframe,
};
use mtbridge_core::{SessionCapability, SessionError};

/// Names of the primitives invoked, in call order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    fn record(&self, name: &'static str) {
        self.0.lock().unwrap().push(name);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn is_empty(&self) -> bool {
        self.calls().is_empty()
    }
}

/// Session double whose answers are set up front by the test.
pub struct ScriptedSession {
    pub connected: bool,
    pub log: CallLog,
    pub rates: Vec<Bar>,
    pub tick: Option<Tick>,
    pub positions: Vec<Position>,
    pub next_ticket: u64,
    pub fail_next: Option<SessionError>,
    /// Set while a primitive runs; a second entrant flags an overlap.
    pub in_flight: Arc<AtomicBool>,
    pub overlapped: Arc<AtomicBool>,
    pub call_delay: Duration,
}

impl ScriptedSession {
    pub fn connected() -> Self {
        Self {
            connected: true,
            log: CallLog::default(),
            rates: Vec::new(),
            tick: None,
            positions: Vec::new(),
            next_ticket: 1,
            fail_next: None,
            in_flight: Arc::new(AtomicBool::new(false)),
            overlapped: Arc::new(AtomicBool::new(false)),
            call_delay: Duration::ZERO,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::connected()
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.push(position);
        self
    }

    fn enter(&self, name: &'static str) -> Result<(), SessionError> {
        self.log.record(name);
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        if !self.call_delay.is_zero() {
            thread::sleep(self.call_delay);
        }
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn take_failure(&mut self) -> Result<(), SessionError> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn bar(time: i64, close: f64) -> Bar {
    Bar {
        time,
        open: close,
        high: close + 0.001,
        low: close - 0.001,
        close,
        tick_volume: 10,
        spread: 1,
        real_volume: 0,
    }
}

pub fn position(ticket: u64, stop_loss: Option<f64>, take_profit: Option<f64>) -> Position {
    Position {
        ticket: Ticket(ticket),
        symbol: "EURUSD".into(),
        side: Side::Buy,
        volume: 0.1,
        open_price: 1.0850,
        stop_loss,
        take_profit,
        current_price: 1.0860,
        profit: 10.0,
        open_time: 1_700_000_000,
    }
}

impl SessionCapability for ScriptedSession {
    fn connect(&mut self) -> Result<(), SessionError> {
        self.enter("connect")?;
        self.take_failure()?;
        self.connected = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.log.record("shutdown");
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.log.record("is_connected");
        self.connected
    }

    fn get_rates(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        count: u32,
    ) -> Result<Vec<Bar>, SessionError> {
        self.enter("get_rates")?;
        if let Some(err) = self.fail_next.clone() {
            return Err(err);
        }
        Ok(self.rates.iter().take(count as usize).cloned().collect())
    }

    fn get_tick(&self, symbol: &str) -> Result<Tick, SessionError> {
        self.enter("get_tick")?;
        if let Some(err) = self.fail_next.clone() {
            return Err(err);
        }
        self.tick.clone().ok_or_else(|| SessionError::SymbolNotFound {
            symbol: symbol.to_string(),
        })
    }

    fn list_positions(&self) -> Result<Vec<Position>, SessionError> {
        self.enter("list_positions")?;
        if let Some(err) = self.fail_next.clone() {
            return Err(err);
        }
        Ok(self.positions.clone())
    }

    fn submit_order(&mut self, order: &OrderRequest) -> Result<Ticket, SessionError> {
        self.enter("submit_order")?;
        self.take_failure()?;
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.positions.push(Position {
            ticket,
            symbol: order.symbol.clone(),
            side: order.side,
            volume: order.volume,
            open_price: 1.0,
            stop_loss: Position::level_from_venue(order.stop_loss),
            take_profit: Position::level_from_venue(order.take_profit),
            current_price: 1.0,
            profit: 0.0,
            open_time: 0,
        });
        Ok(ticket)
    }

    fn close_position(&mut self, ticket: Ticket) -> Result<(), SessionError> {
        self.enter("close_position")?;
        self.take_failure()?;
        let index = self
            .positions
            .iter()
            .position(|p| p.ticket == ticket)
            .ok_or(SessionError::TicketNotFound { ticket })?;
        self.positions.remove(index);
        Ok(())
    }

    fn modify_position(
        &mut self,
        ticket: Ticket,
        stop_loss: LevelUpdate,
        take_profit: LevelUpdate,
    ) -> Result<(), SessionError> {
        self.enter("modify_position")?;
        self.take_failure()?;
        let position = self
            .positions
            .iter_mut()
            .find(|p| p.ticket == ticket)
            .ok_or(SessionError::TicketNotFound { ticket })?;
        position.stop_loss = Position::level_from_venue(
            stop_loss.resolve(Position::level_to_venue(position.stop_loss)),
        );
        position.take_profit = Position::level_from_venue(
            take_profit.resolve(Position::level_to_venue(position.take_profit)),
        );
        Ok(())
    }
}
