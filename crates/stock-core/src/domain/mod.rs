//! 주식 원장 도메인 모델.

mod history;
mod stock;
mod system_log;
mod trading;

pub use history::*;
pub use stock::*;
pub use system_log::*;
pub use trading::*;
