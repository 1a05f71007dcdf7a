use crate::config::LedgerConfig;
use crate::entities::{InstrumentType, LogAction, PromoGiftStatus, promo_gift_entity as promo_gifts};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreatePromoGiftRequest, CreatePromoGiftResponse, PaginatedResponse, PaginationParams,
    PromoGiftQuery, PromoGiftResponse, PromoGiftView, RedeemPromoGiftResponse,
};
use crate::services::instrument_log_service::{NewLogEntry, append_log};
use crate::utils::{generate_promo_gift_token, is_gift_card_code, normalize_code};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;

/// 可用性校验: 过期 -> 次数用尽 -> 状态
fn check_usable(promo: &promo_gifts::Model, now: DateTime<Utc>) -> AppResult<()> {
    if promo.is_expired_at(now) || promo.status == PromoGiftStatus::Expired {
        return Err(AppError::Expired("Promo gift has expired".into()));
    }
    if promo.times_used >= promo.max_uses {
        return Err(AppError::LimitReached(
            "Promo gift usage limit reached".into(),
        ));
    }
    if promo.status != PromoGiftStatus::Active {
        return Err(AppError::NotActive("Promo gift is not active".into()));
    }
    Ok(())
}

/// 规范化券码，并拒绝礼品卡号
fn normalize_promo_token(raw: &str) -> AppResult<String> {
    let token = normalize_code(raw);
    if token.is_empty() {
        return Err(AppError::ValidationError("Promo gift token is required".into()));
    }
    if is_gift_card_code(&token) {
        log::warn!("Gift card code {} submitted as promo gift", token);
        return Err(AppError::WrongInstrumentType(
            "This is a gift card code, not a promo gift token".into(),
        ));
    }
    Ok(token)
}

#[derive(Clone)]
pub struct PromoGiftService {
    pool: DatabaseConnection,
    ledger: Arc<LedgerConfig>,
}

impl PromoGiftService {
    pub fn new(pool: DatabaseConnection, ledger: Arc<LedgerConfig>) -> Self {
        Self { pool, ledger }
    }

    /// 创建促销券（管理员）
    pub async fn create(
        &self,
        req: CreatePromoGiftRequest,
        created_by: Option<i64>,
    ) -> AppResult<CreatePromoGiftResponse> {
        if req.amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Promo gift amount must be positive".into(),
            ));
        }
        if req.hours <= 0 {
            return Err(AppError::ValidationError(
                "Validity hours must be positive".into(),
            ));
        }
        if req.max_uses < 1 {
            return Err(AppError::ValidationError(
                "max_uses must be at least 1".into(),
            ));
        }
        let currency = req
            .currency
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.ledger.default_currency.clone());

        let now = Utc::now();
        let expires_at = Duration::try_hours(req.hours)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| AppError::ValidationError("Validity hours out of range".into()))?;

        let txn = self.pool.begin().await?;
        let token = self.unique_token(&txn).await?;

        let promo = promo_gifts::ActiveModel {
            token: Set(token),
            amount: Set(req.amount),
            currency: Set(currency),
            max_uses: Set(req.max_uses),
            times_used: Set(0),
            status: Set(PromoGiftStatus::Active),
            expires_at: Set(expires_at),
            note: Set(req.note),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        append_log(
            &txn,
            NewLogEntry::new(
                InstrumentType::PromoGift,
                promo.id,
                LogAction::Created,
                promo.amount,
                promo.max_uses as i64,
            )
            .performed_by(created_by),
        )
        .await?;

        txn.commit().await?;
        log::info!(
            "Promo gift {} created: amount={} max_uses={} expires_at={}",
            promo.token,
            promo.amount,
            promo.max_uses,
            promo.expires_at
        );
        Ok(promo.into())
    }

    async fn unique_token(&self, txn: &DatabaseTransaction) -> AppResult<String> {
        for _ in 0..self.ledger.code_generation_attempts {
            let token = generate_promo_gift_token();
            let exists = promo_gifts::Entity::find()
                .filter(promo_gifts::Column::Token.eq(token.as_str()))
                .count(txn)
                .await?;
            if exists == 0 {
                return Ok(token);
            }
        }
        Err(AppError::InternalError(
            "Failed to generate a unique promo gift token".into(),
        ))
    }

    /// 公开查询（只读）
    pub async fn inspect(&self, raw_token: &str) -> AppResult<PromoGiftView> {
        let token = normalize_promo_token(raw_token)?;
        let promo = promo_gifts::Entity::find()
            .filter(promo_gifts::Column::Token.eq(token.as_str()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Promo gift not found".into()))?;

        check_usable(&promo, Utc::now())?;

        Ok(PromoGiftView {
            remaining: promo.remaining_uses(),
            token: promo.token,
            amount: promo.amount,
            currency: promo.currency,
            expires_at: promo.expires_at,
        })
    }

    /// 使用一次。次数递增与达到上限时置为 disabled 在同一条 UPDATE 中完成。
    pub async fn redeem(
        &self,
        raw_token: &str,
        order_total: Option<i64>,
        order_id: Option<i64>,
        performed_by: Option<i64>,
    ) -> AppResult<RedeemPromoGiftResponse> {
        let token = normalize_promo_token(raw_token)?;
        if matches!(order_total, Some(t) if t <= 0) {
            return Err(AppError::InvalidAmount(
                "Order total must be positive".into(),
            ));
        }

        let txn = self.pool.begin().await?;
        let promo = promo_gifts::Entity::find()
            .filter(promo_gifts::Column::Token.eq(token.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Promo gift not found".into()))?;

        if let Err(e) = check_usable(&promo, Utc::now()) {
            txn.rollback().await?;
            return Err(e);
        }

        let applied = order_total.map_or(promo.amount, |t| promo.amount.min(t));
        let times_used = promo.times_used + 1;
        let status = if times_used >= promo.max_uses {
            PromoGiftStatus::Disabled
        } else {
            PromoGiftStatus::Active
        };

        let mut am = promo.into_active_model();
        am.times_used = Set(times_used);
        am.status = Set(status);
        am.updated_at = Set(Utc::now());
        let promo = am.update(&txn).await?;

        append_log(
            &txn,
            NewLogEntry::new(
                InstrumentType::PromoGift,
                promo.id,
                LogAction::Redeemed,
                applied,
                promo.remaining_uses() as i64,
            )
            .performed_by(performed_by)
            .order(order_id),
        )
        .await?;

        txn.commit().await?;
        log::info!(
            "Promo gift {} redeemed: applied={} times_used={}/{} order={:?}",
            promo.token,
            applied,
            promo.times_used,
            promo.max_uses,
            order_id
        );

        Ok(RedeemPromoGiftResponse {
            applied,
            times_used: promo.times_used,
            remaining_uses: promo.remaining_uses(),
            status: promo.status,
        })
    }

    /// 管理端分页列表
    pub async fn list(&self, query: &PromoGiftQuery) -> AppResult<PaginatedResponse<PromoGiftResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let mut base = promo_gifts::Entity::find();
        if let Some(status) = query.status {
            base = base.filter(promo_gifts::Column::Status.eq(status));
        }

        let total = base.clone().count(&self.pool).await? as i64;
        let rows = base
            .order_by(promo_gifts::Column::Id, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }

    /// 将过期的 active 券标记为 expired，返回修正数量
    pub async fn expire_overdue(&self) -> AppResult<u64> {
        let now = Utc::now();
        let overdue = promo_gifts::Entity::find()
            .filter(promo_gifts::Column::Status.eq(PromoGiftStatus::Active))
            .filter(promo_gifts::Column::ExpiresAt.lte(now))
            .all(&self.pool)
            .await?;

        let mut healed = 0;
        for promo in overdue {
            let txn = self.pool.begin().await?;
            let res = promo_gifts::Entity::update_many()
                .col_expr(promo_gifts::Column::Status, Expr::value(PromoGiftStatus::Expired))
                .col_expr(promo_gifts::Column::UpdatedAt, Expr::value(now))
                .filter(promo_gifts::Column::Id.eq(promo.id))
                .filter(promo_gifts::Column::Status.eq(PromoGiftStatus::Active))
                .exec(&txn)
                .await?;
            if res.rows_affected == 1 {
                append_log(
                    &txn,
                    NewLogEntry::new(
                        InstrumentType::PromoGift,
                        promo.id,
                        LogAction::Expired,
                        0,
                        promo.remaining_uses() as i64,
                    ),
                )
                .await?;
                healed += 1;
            }
            txn.commit().await?;
        }
        Ok(healed)
    }
}
