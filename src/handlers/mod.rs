pub mod admin;
pub mod gift_card;
pub mod loyalty;
pub mod promo_gift;

pub use admin::admin_config;
pub use gift_card::gift_card_config;
pub use loyalty::loyalty_config;
pub use promo_gift::promo_gift_config;
