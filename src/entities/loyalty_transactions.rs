use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyTransactionType {
    #[sea_orm(string_value = "EARN")]
    Earn,
    #[sea_orm(string_value = "REDEEM")]
    Redeem,
}

impl std::fmt::Display for LoyaltyTransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoyaltyTransactionType::Earn => write!(f, "EARN"),
            LoyaltyTransactionType::Redeem => write!(f, "REDEEM"),
        }
    }
}

/// 积分流水（只追加，不修改不删除）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "loyalty_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub member_id: i64,
    pub transaction_type: LoyaltyTransactionType,
    pub points: i64,
    pub description: String,
    pub related_order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loyalty_members::Entity",
        from = "Column::MemberId",
        to = "super::loyalty_members::Column::Id"
    )]
    Member,
}

impl Related<super::loyalty_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
