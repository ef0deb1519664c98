pub mod scorer;

pub use scorer::{ScoreOutcome, StrategyScorer};
