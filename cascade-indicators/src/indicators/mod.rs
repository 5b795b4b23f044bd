//! Built-in indicator implementations provided by the crate.

pub mod apo;
pub mod ema;
pub mod macd;
pub mod sma;

pub use apo::{Apo, ApoConfig, ApoParams};
pub use ema::{Ema, EmaConfig, EmaParams};
pub use macd::{Macd, MacdConfig, MacdOutput, MacdParams};
pub use sma::{Sma, SmaConfig, SmaParams};
