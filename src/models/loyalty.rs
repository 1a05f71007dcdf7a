use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PaginatedResponse, Tier, TierSchedule};
use crate::entities::{
    LoyaltyTransactionType, MemberStatus, loyalty_member_entity as members,
    loyalty_transaction_entity as transactions,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub user_id: i64,
    #[schema(value_type = Option<String>, example = "1990-01-01")]
    pub birthday: Option<NaiveDate>,
    pub phone: Option<String>,
    #[serde(default)]
    pub marketing_opt_in: bool,
}

/// 会员信息（含实时推导的等级）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoyaltyMemberResponse {
    pub id: i64,
    pub user_id: i64,
    pub status: MemberStatus,
    pub tier: Tier,
    /// 当前等级积分比例 (basis points)
    pub earn_rate_bp: i64,
    pub total_points: i64,
    pub used_points: i64,
    pub available_points: i64,
    pub total_spent: i64,
    /// 下一等级（已是最高级时为空）
    pub next_tier: Option<Tier>,
    /// 距下一等级还需消费(美分)
    pub spend_to_next_tier: Option<i64>,
    #[schema(value_type = Option<String>)]
    pub birthday: Option<NaiveDate>,
    pub phone: Option<String>,
    pub marketing_opt_in: bool,
    pub signup_bonus_given: bool,
    pub join_date: DateTime<Utc>,
}

impl LoyaltyMemberResponse {
    pub fn from_model(m: members::Model, tiers: &TierSchedule) -> Self {
        let tier = tiers.tier_of(m.total_spent);
        let next = tiers.next_rule(m.total_spent);
        Self {
            id: m.id,
            user_id: m.user_id,
            status: m.status,
            tier,
            earn_rate_bp: tiers.earn_rate_bp(tier),
            total_points: m.total_points,
            used_points: m.used_points,
            available_points: m.available_points(),
            total_spent: m.total_spent,
            next_tier: next.map(|r| r.tier),
            spend_to_next_tier: next.map(|r| r.min_spent - m.total_spent),
            birthday: m.birthday,
            phone: m.phone,
            marketing_opt_in: m.marketing_opt_in,
            signup_bonus_given: m.signup_bonus_given,
            join_date: m.join_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoyaltyTransactionResponse {
    pub id: i64,
    pub transaction_type: LoyaltyTransactionType,
    pub points: i64,
    pub description: String,
    pub related_order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<transactions::Model> for LoyaltyTransactionResponse {
    fn from(m: transactions::Model) -> Self {
        Self {
            id: m.id,
            transaction_type: m.transaction_type,
            points: m.points,
            description: m.description,
            related_order_id: m.related_order_id,
            created_at: m.created_at,
        }
    }
}

/// 会员详情 + 积分流水
#[derive(Debug, Clone, Serialize)]
pub struct LoyaltyMemberDetail {
    pub member: LoyaltyMemberResponse,
    pub transactions: PaginatedResponse<LoyaltyTransactionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberTransactionQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPointsRequest {
    pub user_id: i64,
    pub points: i64,
    #[schema(example = "Checkout discount")]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedeemPointsResponse {
    pub success: bool,
    pub message: String,
    pub available_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPurchaseRequest {
    pub user_id: i64,
    pub order_id: i64,
    /// 订单实付金额(美分)
    pub amount: i64,
}

/// 单笔消费积分结算明细
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PurchaseAccrual {
    pub member_id: i64,
    pub order_id: i64,
    pub amount: i64,
    pub total_spent: i64,
    pub tier_before: Tier,
    pub tier_after: Tier,
    /// 按新等级比例计算的消费积分
    pub purchase_points: i64,
    pub first_purchase_bonus: i64,
    pub tier_up_bonus: i64,
    /// 本次合计发放
    pub total_awarded: i64,
    pub available_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordPurchaseResponse {
    /// false 表示未产生任何积分变动（非会员/已停用/金额不足/订单已结算）
    pub recorded: bool,
    pub accrual: Option<PurchaseAccrual>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetMemberStatusRequest {
    pub status: MemberStatus,
}
