use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{PromoGiftStatus, promo_gift_entity as promo_gifts};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromoGiftRequest {
    /// 每次抵扣额(美分)
    #[schema(example = 500)]
    pub amount: i64,
    pub currency: Option<String>,
    /// 有效小时数
    #[schema(example = 48)]
    pub hours: i64,
    #[schema(example = 3)]
    pub max_uses: i32,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromoGiftResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub amount: i64,
    pub currency: String,
    pub max_uses: i32,
}

impl From<promo_gifts::Model> for CreatePromoGiftResponse {
    fn from(m: promo_gifts::Model) -> Self {
        Self {
            token: m.token,
            expires_at: m.expires_at,
            amount: m.amount,
            currency: m.currency,
            max_uses: m.max_uses,
        }
    }
}

/// 公开查询结果
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromoGiftView {
    pub token: String,
    pub amount: i64,
    pub currency: String,
    /// 剩余可用次数
    pub remaining: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPromoGiftRequest {
    /// 订单金额(美分)，抵扣额不超过订单金额
    pub order_total: Option<i64>,
    pub order_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPromoGiftResponse {
    pub applied: i64,
    pub times_used: i32,
    pub remaining_uses: i32,
    pub status: PromoGiftStatus,
}

/// 管理端列表
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoGiftResponse {
    pub id: i64,
    pub token: String,
    pub amount: i64,
    pub currency: String,
    pub max_uses: i32,
    pub times_used: i32,
    pub status: PromoGiftStatus,
    pub expires_at: DateTime<Utc>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<promo_gifts::Model> for PromoGiftResponse {
    fn from(m: promo_gifts::Model) -> Self {
        Self {
            id: m.id,
            token: m.token,
            amount: m.amount,
            currency: m.currency,
            max_uses: m.max_uses,
            times_used: m.times_used,
            status: m.status,
            expires_at: m.expires_at,
            note: m.note,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoGiftQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<PromoGiftStatus>,
}
