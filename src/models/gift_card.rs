use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{GiftCardStatus, gift_card_entity as gift_cards};

/// 管理员发卡请求
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueGiftCardRequest {
    /// 面值(美分)，必须为正
    #[schema(example = 5000)]
    pub amount: i64,
    /// 币种标签，缺省使用配置中的默认币种
    #[schema(example = "USD")]
    pub currency: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// 指定持卡用户
    pub assigned_to: Option<i64>,
}

/// 完整礼品卡信息（发卡结果 / 管理端列表）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiftCardResponse {
    pub id: i64,
    pub code: String,
    pub initial_amount: i64,
    pub balance: i64,
    pub currency: String,
    pub status: GiftCardStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<i64>,
    pub order_id: Option<i64>,
    pub issued_at: DateTime<Utc>,
}

impl From<gift_cards::Model> for GiftCardResponse {
    fn from(m: gift_cards::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            initial_amount: m.initial_amount,
            balance: m.balance,
            currency: m.currency,
            status: m.status,
            expires_at: m.expires_at,
            assigned_to: m.assigned_to,
            order_id: m.order_id,
            issued_at: m.issued_at,
        }
    }
}

/// 公开查询结果
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiftCardView {
    pub code: String,
    pub balance: i64,
    pub currency: String,
    pub status: GiftCardStatus,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(rename = "isExpired")]
    pub is_expired: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemGiftCardRequest {
    #[schema(example = "GC-7K2M9QXA")]
    pub code: String,
    /// 希望抵扣的金额(美分)，缺省为全部余额
    pub amount_to_apply: Option<i64>,
    /// 缺省时只做预览，不扣款
    pub order_id: Option<i64>,
}

/// 预览报价。
///
/// 只能由 `GiftCardService::quote` 生成，并且只能被 `GiftCardService::commit`
/// 消费一次。持有报价不代表已经扣款。
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GiftCardQuote {
    code: String,
    requested: Option<i64>,
    applied: i64,
    balance: i64,
    status: GiftCardStatus,
}

impl GiftCardQuote {
    pub(crate) fn new(
        code: String,
        requested: Option<i64>,
        applied: i64,
        balance: i64,
        status: GiftCardStatus,
    ) -> Self {
        Self {
            code,
            requested,
            applied,
            balance,
            status,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn requested(&self) -> Option<i64> {
        self.requested
    }

    /// 若此刻提交将抵扣的金额
    pub fn applied(&self) -> i64 {
        self.applied
    }

    /// 报价时的余额（预览不改变余额）
    pub fn balance(&self) -> i64 {
        self.balance
    }
}

/// 实际扣款结果
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiftCardRedemption {
    pub code: String,
    pub applied: i64,
    pub balance_after: i64,
    pub status: GiftCardStatus,
    pub order_id: i64,
    /// 同一订单重复提交时返回首次结果，不再扣款
    pub replayed: bool,
}

/// 兑换接口响应；committed = false 表示仅为预览
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedeemGiftCardResponse {
    pub applied: i64,
    pub balance: i64,
    pub status: GiftCardStatus,
    pub committed: bool,
    pub order_id: Option<i64>,
}

impl From<GiftCardQuote> for RedeemGiftCardResponse {
    fn from(q: GiftCardQuote) -> Self {
        Self {
            applied: q.applied,
            balance: q.balance,
            status: q.status,
            committed: false,
            order_id: None,
        }
    }
}

impl From<GiftCardRedemption> for RedeemGiftCardResponse {
    fn from(r: GiftCardRedemption) -> Self {
        Self {
            applied: r.applied,
            balance: r.balance_after,
            status: r.status,
            committed: true,
            order_id: Some(r.order_id),
        }
    }
}

/// 两阶段兑换的返回: 预览或已提交，调用方必须显式区分
#[derive(Debug, Clone)]
pub enum GiftCardRedeemOutcome {
    Preview(GiftCardQuote),
    Committed(GiftCardRedemption),
}

impl From<GiftCardRedeemOutcome> for RedeemGiftCardResponse {
    fn from(outcome: GiftCardRedeemOutcome) -> Self {
        match outcome {
            GiftCardRedeemOutcome::Preview(q) => q.into(),
            GiftCardRedeemOutcome::Committed(r) => r.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CancelGiftCardRequest {
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiftCardQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<GiftCardStatus>,
    pub assigned_to: Option<i64>,
}
