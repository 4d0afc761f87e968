//! Wire-level data types

pub mod event;
pub mod result;

pub use event::TransactionEvent;
pub use result::ScoringResult;
