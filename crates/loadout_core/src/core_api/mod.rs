mod engine;
mod error;
pub mod forced_stackables;

pub use engine::{DecodeOutcome, Engine, ExchangeFormat};
pub use error::{CoreError, CoreErrorCode};
