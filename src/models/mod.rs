pub mod common;
pub mod gift_card;
pub mod instrument_log;
pub mod loyalty;
pub mod pagination;
pub mod promo_gift;
pub mod tier;

pub use common::*;
pub use gift_card::*;
pub use instrument_log::*;
pub use loyalty::*;
pub use pagination::*;
pub use promo_gift::*;
pub use tier::*;
