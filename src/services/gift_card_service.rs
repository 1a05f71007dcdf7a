use crate::config::LedgerConfig;
use crate::entities::{GiftCardStatus, InstrumentType, LogAction, gift_card_entity as gift_cards};
use crate::error::{AppError, AppResult};
use crate::models::{
    GiftCardQuery, GiftCardQuote, GiftCardRedeemOutcome, GiftCardRedemption, GiftCardResponse,
    GiftCardView, InstrumentLogResponse, IssueGiftCardRequest, PaginatedResponse,
    PaginationParams,
};
use crate::services::instrument_log_service::{
    InstrumentLogService, NewLogEntry, append_log, find_redemption_for_order,
};
use crate::utils::{generate_gift_card_code, is_promo_gift_token, normalize_code};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use std::sync::Arc;

/// 校验失败: 对外错误 + 需要顺带落库的状态修正
struct Rejection {
    error: AppError,
    heal: Option<GiftCardStatus>,
}

impl Rejection {
    fn plain(error: AppError) -> Self {
        Self { error, heal: None }
    }
}

/// 兑换前置校验，按 已用完 -> 状态 -> 过期 的顺序。
/// 对存储状态与权威字段不一致的卡，返回需要修正的目标状态。
fn check_redeemable(card: &gift_cards::Model, now: DateTime<Utc>) -> Result<(), Rejection> {
    if card.status == GiftCardStatus::Used || card.balance == 0 {
        let heal = (card.status == GiftCardStatus::Active).then_some(GiftCardStatus::Used);
        return Err(Rejection {
            error: AppError::AlreadyUsed("Gift card has already been used".into()),
            heal,
        });
    }
    match card.status {
        GiftCardStatus::Cancelled => {
            return Err(Rejection::plain(AppError::NotActive(
                "Gift card is not active".into(),
            )));
        }
        GiftCardStatus::Expired => {
            return Err(Rejection::plain(AppError::Expired(
                "Gift card has expired".into(),
            )));
        }
        GiftCardStatus::Active | GiftCardStatus::Used => {}
    }
    if card.is_expired_at(now) {
        return Err(Rejection {
            error: AppError::Expired("Gift card has expired".into()),
            heal: Some(GiftCardStatus::Expired),
        });
    }
    Ok(())
}

/// 本次抵扣额 = min(请求额 或 全部余额, 余额)
fn compute_applied(requested: Option<i64>, balance: i64) -> AppResult<i64> {
    if let Some(r) = requested {
        if r <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount to apply must be positive".into(),
            ));
        }
    }
    let applied = requested.unwrap_or(balance).min(balance);
    if applied <= 0 {
        return Err(AppError::InvalidAmount(
            "Nothing to apply from this gift card".into(),
        ));
    }
    Ok(applied)
}

/// 规范化卡号，并拒绝促销券码
fn normalize_gift_card_code(raw: &str) -> AppResult<String> {
    let code = normalize_code(raw);
    if code.is_empty() {
        return Err(AppError::ValidationError("Gift card code is required".into()));
    }
    if is_promo_gift_token(&code) {
        log::warn!("Promo gift token {} submitted as gift card", code);
        return Err(AppError::WrongInstrumentType(
            "This is a promo gift token, not a gift card code".into(),
        ));
    }
    Ok(code)
}

fn heal_action(target: GiftCardStatus) -> LogAction {
    match target {
        GiftCardStatus::Used => LogAction::MarkedUsed,
        _ => LogAction::Expired,
    }
}

#[derive(Clone)]
pub struct GiftCardService {
    pool: DatabaseConnection,
    ledger: Arc<LedgerConfig>,
    logs: InstrumentLogService,
}

impl GiftCardService {
    pub fn new(pool: DatabaseConnection, ledger: Arc<LedgerConfig>) -> Self {
        let logs = InstrumentLogService::new(pool.clone());
        Self { pool, ledger, logs }
    }

    /// 发卡（管理员）
    pub async fn issue(
        &self,
        req: IssueGiftCardRequest,
        issued_by: Option<i64>,
    ) -> AppResult<GiftCardResponse> {
        if req.amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Gift card amount must be positive".into(),
            ));
        }
        let now = Utc::now();
        if matches!(req.expires_at, Some(exp) if exp <= now) {
            return Err(AppError::ValidationError(
                "Expiry must be in the future".into(),
            ));
        }
        let currency = req
            .currency
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.ledger.default_currency.clone());

        let txn = self.pool.begin().await?;
        let code = self.unique_code(&txn).await?;

        let card = gift_cards::ActiveModel {
            code: Set(code),
            initial_amount: Set(req.amount),
            balance: Set(req.amount),
            currency: Set(currency),
            status: Set(GiftCardStatus::Active),
            expires_at: Set(req.expires_at),
            assigned_to: Set(req.assigned_to),
            issued_by: Set(issued_by),
            order_id: Set(None),
            issued_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        append_log(
            &txn,
            NewLogEntry::new(
                InstrumentType::GiftCard,
                card.id,
                LogAction::Issued,
                card.initial_amount,
                card.balance,
            )
            .performed_by(issued_by),
        )
        .await?;

        txn.commit().await?;
        log::info!(
            "Gift card {} issued: amount={} currency={} by={:?}",
            card.code,
            card.initial_amount,
            card.currency,
            issued_by
        );
        Ok(card.into())
    }

    /// 在事务内生成不重复的卡号
    async fn unique_code(&self, txn: &DatabaseTransaction) -> AppResult<String> {
        for _ in 0..self.ledger.code_generation_attempts {
            let code = generate_gift_card_code();
            let exists = gift_cards::Entity::find()
                .filter(gift_cards::Column::Code.eq(code.as_str()))
                .count(txn)
                .await?;
            if exists == 0 {
                return Ok(code);
            }
        }
        Err(AppError::InternalError(
            "Failed to generate a unique gift card code".into(),
        ))
    }

    /// 公开查询。只读；若存储状态已过时则顺带修正并记日志。
    pub async fn inspect(&self, raw_code: &str) -> AppResult<GiftCardView> {
        let code = normalize_gift_card_code(raw_code)?;
        let card = gift_cards::Entity::find()
            .filter(gift_cards::Column::Code.eq(code.as_str()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift card not found".into()))?;

        let now = Utc::now();
        let effective = card.effective_status(now);
        if effective != card.status
            && matches!(effective, GiftCardStatus::Expired | GiftCardStatus::Used)
        {
            self.heal_status(&card, effective).await?;
        }

        Ok(GiftCardView {
            is_expired: card.is_expired_at(now),
            code: card.code,
            balance: card.balance,
            currency: card.currency,
            status: effective,
            expires_at: card.expires_at,
        })
    }

    /// 独立事务中修正状态，返回是否由本次调用完成修正
    async fn heal_status(&self, card: &gift_cards::Model, target: GiftCardStatus) -> AppResult<bool> {
        let txn = self.pool.begin().await?;
        let healed = Self::persist_status(&txn, card, target).await?;
        txn.commit().await?;
        Ok(healed)
    }

    /// 条件更新 status <> target；只有真正改动了行的调用者写审计日志，
    /// 并发修正同一张卡时日志只有一条。
    async fn persist_status<C>(
        conn: &C,
        card: &gift_cards::Model,
        target: GiftCardStatus,
    ) -> AppResult<bool>
    where
        C: ConnectionTrait,
    {
        let res = gift_cards::Entity::update_many()
            .col_expr(gift_cards::Column::Status, Expr::value(target))
            .col_expr(gift_cards::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(gift_cards::Column::Id.eq(card.id))
            .filter(gift_cards::Column::Status.ne(target))
            .filter(gift_cards::Column::Status.ne(GiftCardStatus::Cancelled))
            .exec(conn)
            .await?;
        if res.rows_affected != 1 {
            return Ok(false);
        }
        append_log(
            conn,
            NewLogEntry::new(
                InstrumentType::GiftCard,
                card.id,
                heal_action(target),
                0,
                card.balance,
            )
            .note(format!("status corrected to {target}")),
        )
        .await?;
        log::info!("Gift card {} status corrected to {}", card.code, target);
        Ok(true)
    }

    async fn lock_card(
        txn: &DatabaseTransaction,
        code: &str,
    ) -> AppResult<gift_cards::Model> {
        gift_cards::Entity::find()
            .filter(gift_cards::Column::Code.eq(code))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift card not found".into()))
    }

    /// 校验失败时: 需要修正状态则提交修正，否则回滚；总是返回原错误
    async fn reject<T>(
        txn: DatabaseTransaction,
        card: &gift_cards::Model,
        rejection: Rejection,
    ) -> AppResult<T> {
        match rejection.heal {
            Some(target) => {
                Self::persist_status(&txn, card, target).await?;
                txn.commit().await?;
            }
            None => txn.rollback().await?,
        }
        Err(rejection.error)
    }

    /// 预览: 与提交相同的加锁与校验，但总是回滚，不改变任何数据
    pub async fn quote(&self, raw_code: &str, requested: Option<i64>) -> AppResult<GiftCardQuote> {
        let code = normalize_gift_card_code(raw_code)?;
        let txn = self.pool.begin().await?;
        let card = Self::lock_card(&txn, &code).await?;
        let now = Utc::now();

        if let Err(rejection) = check_redeemable(&card, now) {
            txn.rollback().await?;
            return Err(rejection.error);
        }
        let applied = compute_applied(requested, card.balance)?;
        txn.rollback().await?;

        Ok(GiftCardQuote::new(
            card.code,
            requested,
            applied,
            card.balance,
            card.status,
        ))
    }

    /// 提交报价。报价中的金额仅作参考，锁内按最新余额重新计算。
    pub async fn commit(
        &self,
        quote: GiftCardQuote,
        order_id: i64,
        performed_by: Option<i64>,
    ) -> AppResult<GiftCardRedemption> {
        self.apply(quote.code(), quote.requested(), order_id, performed_by)
            .await
    }

    /// 兑换入口: 无订单号时只预览，有订单号时扣款
    pub async fn redeem(
        &self,
        raw_code: &str,
        amount_to_apply: Option<i64>,
        order_id: Option<i64>,
        performed_by: Option<i64>,
    ) -> AppResult<GiftCardRedeemOutcome> {
        match order_id {
            None => Ok(GiftCardRedeemOutcome::Preview(
                self.quote(raw_code, amount_to_apply).await?,
            )),
            Some(order_id) => {
                let code = normalize_gift_card_code(raw_code)?;
                let redemption = self
                    .apply(&code, amount_to_apply, order_id, performed_by)
                    .await?;
                Ok(GiftCardRedeemOutcome::Committed(redemption))
            }
        }
    }

    /// 行锁内完成: 重复订单检查 -> 校验 -> 扣减余额 -> 审计日志
    async fn apply(
        &self,
        code: &str,
        requested: Option<i64>,
        order_id: i64,
        performed_by: Option<i64>,
    ) -> AppResult<GiftCardRedemption> {
        if order_id <= 0 {
            return Err(AppError::ValidationError("Invalid order id".into()));
        }
        let txn = self.pool.begin().await?;
        let card = Self::lock_card(&txn, code).await?;

        // 同一订单只扣一次，重复提交返回首次结果
        if let Some(prev) =
            find_redemption_for_order(&txn, InstrumentType::GiftCard, card.id, order_id).await?
        {
            txn.rollback().await?;
            log::warn!(
                "Gift card {} already redeemed for order {}, replaying",
                card.code,
                order_id
            );
            return Ok(GiftCardRedemption {
                code: card.code,
                applied: prev.amount,
                balance_after: prev.balance_after,
                status: card.status,
                order_id,
                replayed: true,
            });
        }

        let now = Utc::now();
        if let Err(rejection) = check_redeemable(&card, now) {
            return Self::reject(txn, &card, rejection).await;
        }
        let applied = compute_applied(requested, card.balance)?;
        let balance_after = card.balance - applied;
        let status = if balance_after == 0 {
            GiftCardStatus::Used
        } else {
            GiftCardStatus::Active
        };

        let card_id = card.id;
        let mut am = card.into_active_model();
        am.balance = Set(balance_after);
        am.status = Set(status);
        am.order_id = Set(Some(order_id));
        am.updated_at = Set(now);
        let card = am.update(&txn).await?;

        let action = if status == GiftCardStatus::Used {
            LogAction::Redeemed
        } else {
            LogAction::PartialRedeemed
        };
        append_log(
            &txn,
            NewLogEntry::new(InstrumentType::GiftCard, card_id, action, applied, balance_after)
                .performed_by(performed_by)
                .order(Some(order_id)),
        )
        .await?;

        txn.commit().await?;
        log::info!(
            "Gift card {} redeemed: applied={} balance={} order={}",
            card.code,
            applied,
            balance_after,
            order_id
        );

        Ok(GiftCardRedemption {
            code: card.code,
            applied,
            balance_after,
            status,
            order_id,
            replayed: false,
        })
    }

    /// 作废（管理员）。仅 active 卡可作废。
    pub async fn cancel(
        &self,
        raw_code: &str,
        performed_by: Option<i64>,
        note: Option<String>,
    ) -> AppResult<GiftCardResponse> {
        let code = normalize_gift_card_code(raw_code)?;
        let txn = self.pool.begin().await?;
        let card = Self::lock_card(&txn, &code).await?;

        if card.effective_status(Utc::now()) != GiftCardStatus::Active {
            txn.rollback().await?;
            return Err(AppError::NotActive("Only active gift cards can be cancelled".into()));
        }

        let mut am = card.into_active_model();
        am.status = Set(GiftCardStatus::Cancelled);
        am.updated_at = Set(Utc::now());
        let card = am.update(&txn).await?;

        let mut entry = NewLogEntry::new(
            InstrumentType::GiftCard,
            card.id,
            LogAction::Cancelled,
            0,
            card.balance,
        )
        .performed_by(performed_by);
        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            entry = entry.note(note);
        }
        append_log(&txn, entry).await?;

        txn.commit().await?;
        log::info!("Gift card {} cancelled by {:?}", card.code, performed_by);
        Ok(card.into())
    }

    /// 某张卡的审计日志
    pub async fn logs(&self, raw_code: &str) -> AppResult<Vec<InstrumentLogResponse>> {
        let code = normalize_gift_card_code(raw_code)?;
        let card = gift_cards::Entity::find()
            .filter(gift_cards::Column::Code.eq(code.as_str()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift card not found".into()))?;
        self.logs.list_for(InstrumentType::GiftCard, card.id).await
    }

    /// 管理端分页列表
    pub async fn list(&self, query: &GiftCardQuery) -> AppResult<PaginatedResponse<GiftCardResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let mut base = gift_cards::Entity::find();
        if let Some(status) = query.status {
            base = base.filter(gift_cards::Column::Status.eq(status));
        }
        if let Some(user_id) = query.assigned_to {
            base = base.filter(gift_cards::Column::AssignedTo.eq(user_id));
        }

        let total = base.clone().count(&self.pool).await? as i64;
        let rows = base
            .order_by(gift_cards::Column::Id, Order::Desc)
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

    /// 将已过期但仍为 active 的卡批量标记为 expired，返回修正数量
    pub async fn expire_overdue(&self) -> AppResult<u64> {
        let now = Utc::now();
        let overdue = gift_cards::Entity::find()
            .filter(gift_cards::Column::Status.eq(GiftCardStatus::Active))
            .filter(gift_cards::Column::Balance.gt(0))
            .filter(gift_cards::Column::ExpiresAt.lte(now))
            .all(&self.pool)
            .await?;

        let mut healed = 0;
        for card in &overdue {
            if self.heal_status(card, GiftCardStatus::Expired).await? {
                healed += 1;
            }
        }
        Ok(healed)
    }
}
