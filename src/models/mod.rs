pub mod candle;
pub mod orderbook;
pub mod position;
pub mod signal;

pub use candle::{Candle, CandleSeries};
pub use orderbook::{BookLevel, DepthSnapshot, OrderBook};
pub use position::{ExitDecision, ExitReason, Holding, PositionState};
pub use signal::{Signal, TierLabel, AUTO_BOUGHT_TAG};
