//! Paper venue: an in-memory terminal session.
//!
//! `PaperSession` behaves like a netting-free hedging account on a single
//! trade server: every order opens its own position with a fresh ticket,
//! closing is an opposite-side deal of the full volume, and protective levels
//! are validated against the current quote. Quotes are static per symbol and
//! bars are synthesized deterministically, so two sessions with the same
//! config and clock produce identical data.
//!
//! ## Limitations
//!
//! - Quotes never move; profit only reflects the spread
//! - No partial fills, no slippage inside the deviation window
//! - No swaps or commissions

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{retcode, SessionCapability, SessionError};
use crate::domain::{
    Bar, LevelUpdate, OrderRequest, Position, Side, Ticket, Tick, Timeframe, UNSET_LEVEL,
};

/// Slippage tolerance stamped on every deal, in points.
pub const DEVIATION_POINTS: u32 = 20;

/// Expert identifier stamped on every deal.
pub const MAGIC: u64 = 123_456;

/// Most bars a single `get_rates` call returns.
pub const MAX_BARS: u32 = 100_000;

const CLOSE_COMMENT: &str = "Close position";

/// Per-symbol trading parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSymbol {
    pub bid: f64,
    pub ask: f64,
    /// Units per 1.0 lot.
    pub contract_size: f64,
    pub volume_min: f64,
    pub volume_max: f64,
    pub volume_step: f64,
    /// Price precision (decimal places).
    pub digits: u32,
    /// False simulates a closed market: orders and closes are rejected.
    pub trade_allowed: bool,
}

impl Default for PaperSymbol {
    fn default() -> Self {
        Self {
            bid: 1.0,
            ask: 1.0,
            contract_size: 100_000.0,
            volume_min: 0.01,
            volume_max: 100.0,
            volume_step: 0.01,
            digits: 5,
            trade_allowed: true,
        }
    }
}

impl PaperSymbol {
    pub fn quoted(bid: f64, ask: f64, digits: u32) -> Self {
        Self {
            bid,
            ask,
            digits,
            ..Self::default()
        }
    }

    fn point(&self) -> f64 {
        10f64.powi(-(self.digits as i32))
    }

    fn volume_is_valid(&self, volume: f64) -> bool {
        if volume < self.volume_min - f64::EPSILON || volume > self.volume_max + f64::EPSILON {
            return false;
        }
        if self.volume_step <= 0.0 {
            return true;
        }
        let steps = (volume - self.volume_min) / self.volume_step;
        (steps - steps.round()).abs() < 1e-6
    }

    /// Price a deal on `side` fills at.
    fn fill_price(&self, side: Side) -> f64 {
        match side {
            Side::Buy => self.ask,
            Side::Sell => self.bid,
        }
    }
}

/// Paper venue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperSessionConfig {
    /// Ticket assigned to the first position.
    pub first_ticket: u64,
    /// Account balance in deposit currency.
    pub balance: f64,
    pub leverage: f64,
    /// Freeze the venue clock at this Unix time (seconds). None = wall clock.
    pub fixed_time: Option<i64>,
    pub symbols: BTreeMap<String, PaperSymbol>,
}

impl Default for PaperSessionConfig {
    fn default() -> Self {
        let mut symbols = BTreeMap::new();
        symbols.insert("EURUSD".into(), PaperSymbol::quoted(1.08500, 1.08512, 5));
        symbols.insert("USDJPY".into(), PaperSymbol::quoted(151.210, 151.225, 3));
        symbols.insert(
            "XAUUSD".into(),
            PaperSymbol {
                contract_size: 100.0,
                ..PaperSymbol::quoted(2400.10, 2400.40, 2)
            },
        );

        Self {
            first_ticket: 100_000,
            balance: 10_000.0,
            leverage: 100.0,
            fixed_time: None,
            symbols,
        }
    }
}

/// One executed deal (open or close) as recorded by the paper venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub position: Ticket,
    pub symbol: String,
    pub side: Side,
    pub volume: f64,
    pub price: f64,
    pub time: i64,
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
}

#[derive(Debug, Clone)]
struct OpenPosition {
    ticket: Ticket,
    symbol: String,
    side: Side,
    volume: f64,
    open_price: f64,
    stop_loss: f64,
    take_profit: f64,
    open_time: i64,
}

/// In-memory terminal session.
#[derive(Debug)]
pub struct PaperSession {
    config: PaperSessionConfig,
    connected: bool,
    balance: f64,
    next_ticket: u64,
    positions: Vec<OpenPosition>,
    deals: Vec<Deal>,
}

impl PaperSession {
    /// Create a disconnected session. Call `connect()` before trading.
    pub fn new(config: PaperSessionConfig) -> Self {
        Self {
            balance: config.balance,
            next_ticket: config.first_ticket,
            config,
            connected: false,
            positions: Vec::new(),
            deals: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PaperSessionConfig::default())
    }

    /// Deal history, oldest first.
    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    /// Balance after realized profit of closed positions.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    fn now(&self) -> i64 {
        self.config
            .fixed_time
            .unwrap_or_else(|| Utc::now().timestamp())
    }

    fn ensure_connected(&self) -> Result<(), SessionError> {
        if self.connected {
            Ok(())
        } else {
            Err(SessionError::NotConnected)
        }
    }

    fn symbol(&self, symbol: &str) -> Result<&PaperSymbol, SessionError> {
        if symbol.trim().is_empty() {
            return Err(SessionError::InvalidRequest("empty symbol".into()));
        }
        self.config
            .symbols
            .get(symbol)
            .ok_or_else(|| SessionError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    fn position_index(&self, ticket: Ticket) -> Result<usize, SessionError> {
        self.positions
            .iter()
            .position(|p| p.ticket == ticket)
            .ok_or(SessionError::TicketNotFound { ticket })
    }

    fn margin_for(sym: &PaperSymbol, volume: f64, price: f64, leverage: f64) -> f64 {
        volume * sym.contract_size * price / leverage.max(1.0)
    }

    fn used_margin(&self) -> f64 {
        self.positions
            .iter()
            .filter_map(|p| {
                let sym = self.config.symbols.get(&p.symbol)?;
                Some(Self::margin_for(sym, p.volume, p.open_price, self.config.leverage))
            })
            .sum()
    }

    fn record_deal(&mut self, deal: Deal) {
        debug!(
            position = %deal.position,
            symbol = %deal.symbol,
            side = %deal.side,
            volume = deal.volume,
            price = deal.price,
            deviation = deal.deviation,
            magic = deal.magic,
            "paper deal executed"
        );
        self.deals.push(deal);
    }
}

/// Protective levels must sit on the losing/winning side of the price the
/// position would close at. Unset levels are always valid.
fn stops_are_valid(side: Side, sym: &PaperSymbol, stop_loss: f64, take_profit: f64) -> bool {
    let exit = sym.fill_price(side.opposite());
    let sl_ok = stop_loss == UNSET_LEVEL
        || match side {
            Side::Buy => stop_loss < exit,
            Side::Sell => stop_loss > exit,
        };
    let tp_ok = take_profit == UNSET_LEVEL
        || match side {
            Side::Buy => take_profit > exit,
            Side::Sell => take_profit < exit,
        };
    sl_ok && tp_ok
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Deterministic mid-price path: a slow wave around the quoted mid.
fn synthetic_price(mid: f64, step: i64) -> f64 {
    let phase = step as f64 / 24.0;
    mid * (1.0 + 0.002 * phase.sin() + 0.0005 * (phase * 3.7).cos())
}

impl SessionCapability for PaperSession {
    fn connect(&mut self) -> Result<(), SessionError> {
        if !self.connected {
            self.connected = true;
            info!(symbols = self.config.symbols.len(), "paper session connected");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.connected {
            self.connected = false;
            info!("paper session shut down");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    /// Bars come back newest-first, like a terminal copying from position 0.
    fn get_rates(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: u32,
    ) -> Result<Vec<Bar>, SessionError> {
        self.ensure_connected()?;
        let sym = self.symbol(symbol)?;

        let secs = timeframe.seconds();
        let latest_step = self.now().div_euclid(secs);
        let mid = (sym.bid + sym.ask) / 2.0;
        let spread_points = ((sym.ask - sym.bid) / sym.point()).round() as i32;

        let bars = (0..i64::from(count.min(MAX_BARS)))
            .map(|age| {
                let step = latest_step - age;
                let open = synthetic_price(mid, step - 1);
                let close = synthetic_price(mid, step);
                let wick = (open - close).abs() * 0.5 + sym.point() * 10.0;
                Bar {
                    time: step * secs,
                    open: round_to(open, sym.digits),
                    high: round_to(open.max(close) + wick, sym.digits),
                    low: round_to(open.min(close) - wick, sym.digits),
                    close: round_to(close, sym.digits),
                    tick_volume: 100 + step.rem_euclid(50) as u64,
                    spread: spread_points,
                    real_volume: 0,
                }
            })
            .collect();
        Ok(bars)
    }

    fn get_tick(&self, symbol: &str) -> Result<Tick, SessionError> {
        self.ensure_connected()?;
        let sym = self.symbol(symbol)?;
        Ok(Tick {
            time: self.now(),
            bid: sym.bid,
            ask: sym.ask,
            last: 0.0,
            volume: 0,
        })
    }

    fn list_positions(&self) -> Result<Vec<Position>, SessionError> {
        self.ensure_connected()?;
        let positions = self
            .positions
            .iter()
            .map(|p| {
                let sym = self.config.symbols.get(&p.symbol);
                let current_price = sym
                    .map(|s| s.fill_price(p.side.opposite()))
                    .unwrap_or(p.open_price);
                let contract_size = sym.map(|s| s.contract_size).unwrap_or(1.0);
                let direction = if p.side == Side::Buy { 1.0 } else { -1.0 };
                let profit =
                    direction * (current_price - p.open_price) * p.volume * contract_size;
                Position {
                    ticket: p.ticket,
                    symbol: p.symbol.clone(),
                    side: p.side,
                    volume: p.volume,
                    open_price: p.open_price,
                    stop_loss: Position::level_from_venue(p.stop_loss),
                    take_profit: Position::level_from_venue(p.take_profit),
                    current_price,
                    profit: round_to(profit, 2),
                    open_time: p.open_time,
                }
            })
            .collect();
        Ok(positions)
    }

    fn submit_order(&mut self, order: &OrderRequest) -> Result<Ticket, SessionError> {
        self.ensure_connected()?;
        let sym = self.symbol(&order.symbol)?.clone();

        if !sym.trade_allowed {
            return Err(SessionError::rejected(retcode::MARKET_CLOSED));
        }
        if !sym.volume_is_valid(order.volume) {
            return Err(SessionError::rejected(retcode::INVALID_VOLUME));
        }
        if !stops_are_valid(order.side, &sym, order.stop_loss, order.take_profit) {
            return Err(SessionError::rejected(retcode::INVALID_STOPS));
        }

        let price = sym.fill_price(order.side);
        let required = Self::margin_for(&sym, order.volume, price, self.config.leverage);
        if self.used_margin() + required > self.balance {
            return Err(SessionError::rejected(retcode::NO_MONEY));
        }

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        let now = self.now();

        self.positions.push(OpenPosition {
            ticket,
            symbol: order.symbol.clone(),
            side: order.side,
            volume: order.volume,
            open_price: price,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            open_time: now,
        });
        self.record_deal(Deal {
            position: ticket,
            symbol: order.symbol.clone(),
            side: order.side,
            volume: order.volume,
            price,
            time: now,
            deviation: DEVIATION_POINTS,
            magic: MAGIC,
            comment: order.comment.clone().unwrap_or_default(),
        });
        Ok(ticket)
    }

    fn close_position(&mut self, ticket: Ticket) -> Result<(), SessionError> {
        self.ensure_connected()?;
        let index = self.position_index(ticket)?;
        let sym = self.symbol(&self.positions[index].symbol)?.clone();
        if !sym.trade_allowed {
            return Err(SessionError::rejected(retcode::MARKET_CLOSED));
        }

        let position = self.positions.remove(index);
        let side = position.side.opposite();
        let price = sym.fill_price(side);
        let direction = if position.side == Side::Buy { 1.0 } else { -1.0 };
        self.balance += round_to(
            direction * (price - position.open_price) * position.volume * sym.contract_size,
            2,
        );

        let now = self.now();
        self.record_deal(Deal {
            position: ticket,
            symbol: position.symbol,
            side,
            volume: position.volume,
            price,
            time: now,
            deviation: DEVIATION_POINTS,
            magic: MAGIC,
            comment: CLOSE_COMMENT.to_string(),
        });
        Ok(())
    }

    fn modify_position(
        &mut self,
        ticket: Ticket,
        stop_loss: LevelUpdate,
        take_profit: LevelUpdate,
    ) -> Result<(), SessionError> {
        self.ensure_connected()?;
        let index = self.position_index(ticket)?;
        let (side, current_sl, current_tp, symbol) = {
            let p = &self.positions[index];
            (p.side, p.stop_loss, p.take_profit, p.symbol.clone())
        };
        let sym = self.symbol(&symbol)?;

        let new_sl = stop_loss.resolve(current_sl);
        let new_tp = take_profit.resolve(current_tp);

        // Untouched levels were accepted when they were set.
        let check_sl = if stop_loss.touches() { new_sl } else { UNSET_LEVEL };
        let check_tp = if take_profit.touches() { new_tp } else { UNSET_LEVEL };
        if !stops_are_valid(side, sym, check_sl, check_tp) {
            return Err(SessionError::rejected(retcode::INVALID_STOPS));
        }

        let position = &mut self.positions[index];
        position.stop_loss = new_sl;
        position.take_profit = new_tp;
        Ok(())
    }
}
