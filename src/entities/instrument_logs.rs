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
pub enum InstrumentType {
    #[sea_orm(string_value = "gift_card")]
    GiftCard,
    #[sea_orm(string_value = "promo_gift")]
    PromoGift,
    #[sea_orm(string_value = "loyalty")]
    Loyalty,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    #[sea_orm(string_value = "issued")]
    Issued,
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "redeemed")]
    Redeemed,
    #[sea_orm(string_value = "partial_redeemed")]
    PartialRedeemed,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "used")]
    MarkedUsed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "points_earned")]
    PointsEarned,
    #[sea_orm(string_value = "points_redeemed")]
    PointsRedeemed,
    #[sea_orm(string_value = "status_changed")]
    StatusChanged,
}

/// 凭证审计日志（只追加）
/// - gift_card: amount = 本次变动金额, balance_after = 剩余余额
/// - promo_gift: amount = 本次抵扣额, balance_after = 剩余可用次数
/// - loyalty: amount = 积分变动, balance_after = 可用积分
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "instrument_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub instrument_type: InstrumentType,
    pub instrument_id: i64,
    pub action: LogAction,
    pub amount: i64,
    pub balance_after: i64,
    pub performed_by: Option<i64>,
    pub related_order_id: Option<i64>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
