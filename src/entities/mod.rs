pub mod gift_cards;
pub mod instrument_logs;
pub mod loyalty_members;
pub mod loyalty_transactions;
pub mod promo_gifts;

pub use gift_cards as gift_card_entity;
pub use instrument_logs as instrument_log_entity;
pub use loyalty_members as loyalty_member_entity;
pub use loyalty_transactions as loyalty_transaction_entity;
pub use promo_gifts as promo_gift_entity;

pub use gift_cards::GiftCardStatus;
pub use instrument_logs::{InstrumentType, LogAction};
pub use loyalty_members::MemberStatus;
pub use loyalty_transactions::LoyaltyTransactionType;
pub use promo_gifts::PromoGiftStatus;
