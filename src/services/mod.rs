pub mod gift_card_service;
pub mod instrument_log_service;
pub mod loyalty_service;
pub mod promo_gift_service;

pub use gift_card_service::*;
pub use instrument_log_service::*;
pub use loyalty_service::*;
pub use promo_gift_service::*;
