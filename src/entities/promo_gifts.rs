use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum PromoGiftStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "disabled")]
    Disabled,
}

impl std::fmt::Display for PromoGiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromoGiftStatus::Active => write!(f, "active"),
            PromoGiftStatus::Expired => write!(f, "expired"),
            PromoGiftStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// 促销礼券实体
/// 说明:
/// - amount: 每次使用的固定抵扣额(美分)，不是余额
/// - times_used 达到 max_uses 时同一条 UPDATE 内置为 disabled
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "promo_gifts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub token: String,
    pub amount: i64,
    pub currency: String,
    pub max_uses: i32,
    pub times_used: i32,
    pub status: PromoGiftStatus,
    pub expires_at: DateTime<Utc>,
    pub note: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// 剩余可用次数
    pub fn remaining_uses(&self) -> i32 {
        (self.max_uses - self.times_used).max(0)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo(times_used: i32, max_uses: i32, expires_in_hours: i64) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            token: "PG-ABCDEFGH".into(),
            amount: 500,
            currency: "USD".into(),
            max_uses,
            times_used,
            status: PromoGiftStatus::Active,
            expires_at: now + Duration::hours(expires_in_hours),
            note: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_remaining_uses_never_negative() {
        assert_eq!(promo(3, 3, 24).remaining_uses(), 0);
        assert_eq!(promo(5, 3, 24).remaining_uses(), 0);
        assert_eq!(promo(1, 3, 24).remaining_uses(), 2);
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let p = promo(0, 3, -1);
        assert!(p.is_expired_at(Utc::now()));
        assert!(p.is_expired_at(p.expires_at));
        assert!(!promo(0, 3, 24).is_expired_at(Utc::now()));
    }
}
