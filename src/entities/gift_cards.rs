use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 礼品卡状态
///
/// 状态只向前流转: active -> used | expired | cancelled，不存在回退路径。
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum GiftCardStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "used")]
    Used,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl std::fmt::Display for GiftCardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GiftCardStatus::Active => write!(f, "active"),
            GiftCardStatus::Used => write!(f, "used"),
            GiftCardStatus::Expired => write!(f, "expired"),
            GiftCardStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "gift_cards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// GC-XXXXXXXX，全大写
    pub code: String,
    /// 面值(美分)
    pub initial_amount: i64,
    /// 剩余余额(美分)，只减不增
    pub balance: i64,
    pub currency: String,
    /// 状态缓存，权威字段是 balance / expires_at
    pub status: GiftCardStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<i64>,
    pub issued_by: Option<i64>,
    /// 最近一次实际扣款对应的订单
    pub order_id: Option<i64>,
    pub issued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }

    /// 由权威字段推导出的状态。
    /// 优先级: cancelled > used(余额为0) > expired(已过期) > 存储值
    pub fn effective_status(&self, now: DateTime<Utc>) -> GiftCardStatus {
        if self.status == GiftCardStatus::Cancelled {
            return GiftCardStatus::Cancelled;
        }
        if self.balance == 0 {
            return GiftCardStatus::Used;
        }
        if self.status == GiftCardStatus::Expired || self.is_expired_at(now) {
            return GiftCardStatus::Expired;
        }
        self.status
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn card(balance: i64, status: GiftCardStatus, expires_in: Option<i64>) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            code: "GC-ABCDEFGH".into(),
            initial_amount: 5000,
            balance,
            currency: "USD".into(),
            status,
            expires_at: expires_in.map(|h| now + Duration::hours(h)),
            assigned_to: None,
            issued_by: None,
            order_id: None,
            issued_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_zero_balance_is_used_even_if_stored_active() {
        let c = card(0, GiftCardStatus::Active, None);
        assert_eq!(c.effective_status(Utc::now()), GiftCardStatus::Used);
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let c = card(100, GiftCardStatus::Active, Some(-1));
        assert!(c.is_expired_at(Utc::now()));
        assert_eq!(c.effective_status(Utc::now()), GiftCardStatus::Expired);
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let c = card(100, GiftCardStatus::Active, None);
        assert!(!c.is_expired_at(Utc::now() + Duration::days(3650)));
        assert_eq!(c.effective_status(Utc::now()), GiftCardStatus::Active);
    }

    #[test]
    fn test_cancelled_wins() {
        let c = card(0, GiftCardStatus::Cancelled, Some(-1));
        assert_eq!(c.effective_status(Utc::now()), GiftCardStatus::Cancelled);
    }
}
