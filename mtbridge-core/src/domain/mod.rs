//! Domain types shared by the bridge, the session drivers and the gateway.

pub mod bar;
pub mod ids;
pub mod order;
pub mod position;
pub mod tick;

pub use bar::{Bar, ParseTimeframeError, Timeframe};
pub use ids::Ticket;
pub use order::{LevelUpdate, ModifyRequest, OrderRequest, ParseSideError, Side, UNSET_LEVEL};
pub use position::Position;
pub use tick::Tick;
