pub mod monitor;
pub mod notifier;
pub mod registry;
pub mod scanner;

pub use monitor::PositionMonitor;
pub use notifier::Notifier;
pub use registry::SignalRegistry;
pub use scanner::{MarketScanner, ScanContext};
