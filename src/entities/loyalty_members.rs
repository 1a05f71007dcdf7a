use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberStatus::Active => write!(f, "ACTIVE"),
            MemberStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

/// 会员积分账户
/// 说明:
/// - total_points / used_points / total_spent 均为累计值，只增不减
/// - 可用积分 = total_points - used_points，不单独存储
/// - 这些汇总列是 loyalty_transactions 流水的物化缓存，必须同事务更新
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "loyalty_members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub status: MemberStatus,
    pub total_points: i64,
    pub used_points: i64,
    /// 累计消费(美分)
    pub total_spent: i64,
    pub birthday: Option<NaiveDate>,
    pub phone: Option<String>,
    pub marketing_opt_in: bool,
    pub signup_bonus_given: bool,
    pub join_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn available_points(&self) -> i64 {
        self.total_points - self.used_points
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::loyalty_transactions::Entity")]
    Transactions,
}

impl Related<super::loyalty_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
