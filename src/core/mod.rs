pub mod bet;
pub mod depth;
pub mod indicators;
