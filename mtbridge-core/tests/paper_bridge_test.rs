//! End-to-end bridge flows against the paper venue.

use mtbridge_core::domain::{ModifyRequest, OrderRequest, Side, Ticket, Timeframe};
use mtbridge_core::session::PaperSymbol;
use mtbridge_core::{ErrorKind, LifecycleBridge, PaperSession, PaperSessionConfig};

const NOW: i64 = 1_717_000_000;

fn bridge() -> LifecycleBridge<PaperSession> {
    let config = PaperSessionConfig {
        first_ticket: 555,
        fixed_time: Some(NOW),
        ..PaperSessionConfig::default()
    };
    let bridge = LifecycleBridge::new(PaperSession::new(config));
    bridge.connect().unwrap();
    bridge
}

#[test]
fn order_then_close_round_trip() {
    let bridge = bridge();
    let ticket = bridge
        .submit_order(&OrderRequest::market("XAUUSD", Side::Buy, 0.01))
        .unwrap();
    assert_eq!(ticket, Ticket(555));

    let positions = bridge.list_positions().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].symbol, "XAUUSD");

    bridge.close_position(ticket).unwrap();
    assert!(bridge.list_positions().unwrap().is_empty());

    let deals = bridge.with_session(|s| s.deals().to_vec()).unwrap();
    assert_eq!(deals.len(), 2);
    assert_eq!(deals[1].side, Side::Sell);
    assert_eq!(deals[1].volume, 0.01);

    assert_eq!(
        bridge.close_position(ticket).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn close_of_ticket_absent_from_listing_is_not_found() {
    let bridge = bridge();
    bridge
        .submit_order(&OrderRequest::market("EURUSD", Side::Sell, 0.1))
        .unwrap();
    let listed: Vec<Ticket> = bridge
        .list_positions()
        .unwrap()
        .iter()
        .map(|p| p.ticket)
        .collect();
    let absent = Ticket(999);
    assert!(!listed.contains(&absent));
    assert_eq!(
        bridge.close_position(absent).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn modify_sets_then_clears_protection() {
    let bridge = bridge();
    let ticket = bridge
        .submit_order(&OrderRequest::market("EURUSD", Side::Buy, 0.1))
        .unwrap();

    bridge
        .modify_position(
            &ModifyRequest::new(ticket)
                .stop_loss(Some(1.07))
                .take_profit(Some(1.10)),
        )
        .unwrap();
    let p = &bridge.list_positions().unwrap()[0];
    assert_eq!((p.stop_loss, p.take_profit), (Some(1.07), Some(1.10)));

    bridge
        .modify_position(&ModifyRequest::new(ticket).take_profit(None))
        .unwrap();
    let p = &bridge.list_positions().unwrap()[0];
    assert_eq!((p.stop_loss, p.take_profit), (Some(1.07), None));
}

#[test]
fn infinite_take_profit_never_reaches_the_venue() {
    let bridge = bridge();
    let ticket = bridge
        .submit_order(&OrderRequest::market("XAUUSD", Side::Buy, 0.01))
        .unwrap();

    let err = bridge
        .modify_position(&ModifyRequest::new(ticket).take_profit(Some(f64::INFINITY)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(bridge.list_positions().unwrap()[0].take_profit, None);
}

#[test]
fn venue_business_rules_surface_as_rejections() {
    let mut config = PaperSessionConfig {
        fixed_time: Some(NOW),
        ..PaperSessionConfig::default()
    };
    config.symbols.insert(
        "GER40".into(),
        PaperSymbol {
            trade_allowed: false,
            ..PaperSymbol::quoted(18_000.0, 18_001.5, 1)
        },
    );
    let bridge = LifecycleBridge::new(PaperSession::new(config));
    bridge.connect().unwrap();

    let closed = bridge
        .submit_order(&OrderRequest::market("GER40", Side::Buy, 1.0))
        .unwrap_err();
    assert_eq!(closed.kind(), ErrorKind::OrderRejected);
    assert!(closed.detail().contains("Market closed"));

    let unknown = bridge
        .submit_order(&OrderRequest::market("NOPE", Side::Buy, 1.0))
        .unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::OrderRejected);
}

#[test]
fn rates_from_paper_venue_are_reordered_ascending() {
    let bridge = bridge();
    let bars = bridge.get_rates("EURUSD", Timeframe::H1, 3).unwrap();
    assert_eq!(bars.len(), 3);
    assert!(bars[0].time < bars[1].time && bars[1].time < bars[2].time);
    assert_eq!(bars[2].time, NOW - NOW.rem_euclid(3600));
}

#[test]
fn shutdown_then_commands_are_not_connected() {
    let bridge = bridge();
    bridge.shutdown().unwrap();
    assert_eq!(
        bridge.get_tick("EURUSD").unwrap_err().kind(),
        ErrorKind::NotConnected
    );
}
