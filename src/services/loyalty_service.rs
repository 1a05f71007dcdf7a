use crate::config::LoyaltyConfig;
use crate::entities::{
    InstrumentType, LogAction, LoyaltyTransactionType, MemberStatus,
    loyalty_member_entity as members, loyalty_transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    EnrollRequest, LoyaltyMemberDetail, LoyaltyMemberResponse, LoyaltyTransactionResponse,
    MemberTransactionQuery, PaginatedResponse, PaginationParams, PurchaseAccrual,
    RedeemPointsResponse, Tier,
};
use crate::services::instrument_log_service::{NewLogEntry, append_log};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct LoyaltyService {
    pool: DatabaseConnection,
    config: Arc<LoyaltyConfig>,
}

impl LoyaltyService {
    pub fn new(pool: DatabaseConnection, config: Arc<LoyaltyConfig>) -> Self {
        Self { pool, config }
    }

    /// 由累计消费推导等级
    pub fn tier_of(&self, total_spent: i64) -> Tier {
        self.config.tiers.tier_of(total_spent)
    }

    /// 入会并发放欢迎积分
    pub async fn enroll(&self, req: EnrollRequest) -> AppResult<LoyaltyMemberResponse> {
        if req.user_id <= 0 {
            return Err(AppError::ValidationError("Invalid user id".into()));
        }
        let txn = self.pool.begin().await?;

        let existing = members::Entity::find()
            .filter(members::Column::UserId.eq(req.user_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::AlreadyEnrolled(
                "User is already a loyalty member".into(),
            ));
        }

        let now = Utc::now();
        let inserted = members::ActiveModel {
            user_id: Set(req.user_id),
            status: Set(MemberStatus::Active),
            total_points: Set(0),
            used_points: Set(0),
            total_spent: Set(0),
            birthday: Set(req.birthday),
            phone: Set(req.phone.filter(|p| !p.trim().is_empty())),
            marketing_opt_in: Set(req.marketing_opt_in),
            signup_bonus_given: Set(false),
            join_date: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await;

        // 并发入会由唯一索引兜底
        let mut member = match inserted {
            Ok(m) => m,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(AppError::AlreadyEnrolled(
                    "User is already a loyalty member".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let welcome = self.config.welcome_bonus_points;
        if welcome > 0 {
            member = self
                .append_points(
                    &txn,
                    member,
                    LoyaltyTransactionType::Earn,
                    welcome,
                    "Welcome bonus".to_string(),
                    None,
                )
                .await?;
        }

        txn.commit().await?;
        log::info!(
            "User {} enrolled in loyalty program, member_id={}",
            member.user_id,
            member.id
        );
        Ok(LoyaltyMemberResponse::from_model(member, &self.config.tiers))
    }

    /// 写一条积分流水，同步更新会员汇总列和审计日志（调用方负责事务）
    async fn append_points(
        &self,
        txn: &DatabaseTransaction,
        member: members::Model,
        kind: LoyaltyTransactionType,
        points: i64,
        description: String,
        related_order_id: Option<i64>,
    ) -> AppResult<members::Model> {
        let now = Utc::now();
        let member_id = member.id;
        let totals = match kind {
            LoyaltyTransactionType::Earn => member
                .total_points
                .checked_add(points)
                .map(|t| (t, member.used_points)),
            LoyaltyTransactionType::Redeem => member
                .used_points
                .checked_add(points)
                .map(|u| (member.total_points, u)),
        };
        let Some((total_points, used_points)) = totals else {
            return Err(AppError::InvalidAmount("Points total out of range".into()));
        };

        let mut am = member.into_active_model();
        am.total_points = Set(total_points);
        am.used_points = Set(used_points);
        am.updated_at = Set(now);
        let member = am.update(txn).await?;

        transactions::ActiveModel {
            member_id: Set(member_id),
            transaction_type: Set(kind),
            points: Set(points),
            description: Set(description.clone()),
            related_order_id: Set(related_order_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let action = match kind {
            LoyaltyTransactionType::Earn => LogAction::PointsEarned,
            LoyaltyTransactionType::Redeem => LogAction::PointsRedeemed,
        };
        append_log(
            txn,
            NewLogEntry::new(
                InstrumentType::Loyalty,
                member_id,
                action,
                points,
                member.available_points(),
            )
            .order(related_order_id)
            .note(description),
        )
        .await?;

        Ok(member)
    }

    async fn lock_member(
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> Result<Option<members::Model>, DbErr> {
        members::Entity::find()
            .filter(members::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(txn)
            .await
    }

    /// 记录一笔消费并结算积分。
    ///
    /// 非会员、已停用、金额非正、积分为 0、订单已结算时不做任何写入，返回 None。
    /// 否则在同一事务内: 累计消费 -> 按新等级算积分 -> 首购奖励 -> 升级奖励 -> 消费积分。
    pub async fn record_purchase(
        &self,
        user_id: i64,
        order_id: i64,
        amount: i64,
    ) -> AppResult<Option<PurchaseAccrual>> {
        if amount <= 0 {
            return Ok(None);
        }
        let txn = self.pool.begin().await?;

        let Some(member) = Self::lock_member(&txn, user_id).await? else {
            txn.rollback().await?;
            log::debug!("record_purchase: user {} is not a loyalty member", user_id);
            return Ok(None);
        };
        if !member.is_active() {
            txn.rollback().await?;
            log::debug!("record_purchase: member {} is inactive", member.id);
            return Ok(None);
        }

        let accrued = transactions::Entity::find()
            .filter(transactions::Column::MemberId.eq(member.id))
            .filter(transactions::Column::RelatedOrderId.eq(order_id))
            .count(&txn)
            .await?;
        if accrued > 0 {
            txn.rollback().await?;
            log::warn!(
                "record_purchase: order {} already accrued for member {}",
                order_id,
                member.id
            );
            return Ok(None);
        }

        let tiers = &self.config.tiers;
        let tier_before = tiers.tier_of(member.total_spent);
        let Some(total_spent) = member.total_spent.checked_add(amount) else {
            txn.rollback().await?;
            return Err(AppError::InvalidAmount(
                "Purchase amount out of range".into(),
            ));
        };
        let tier_after = tiers.tier_of(total_spent);
        let purchase_points = tiers.points_for(tier_after, amount);
        if purchase_points <= 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let now = Utc::now();
        let first_purchase_eligible = !member.signup_bonus_given
            && (now - member.join_date).num_days() <= self.config.first_purchase_window_days
            && amount >= self.config.first_purchase_min_amount;

        let points_before = member.total_points;
        let mut am = member.into_active_model();
        am.total_spent = Set(total_spent);
        if first_purchase_eligible {
            am.signup_bonus_given = Set(true);
        }
        am.updated_at = Set(now);
        let mut member = am.update(&txn).await?;

        let mut first_purchase_bonus = 0;
        if first_purchase_eligible && self.config.first_purchase_bonus_points > 0 {
            first_purchase_bonus = self.config.first_purchase_bonus_points;
            member = self
                .append_points(
                    &txn,
                    member,
                    LoyaltyTransactionType::Earn,
                    first_purchase_bonus,
                    "First purchase bonus".to_string(),
                    Some(order_id),
                )
                .await?;
        }

        let mut tier_up_bonus = 0;
        if tier_after != tier_before && self.config.tier_up_bonus_points > 0 {
            tier_up_bonus = self.config.tier_up_bonus_points;
            member = self
                .append_points(
                    &txn,
                    member,
                    LoyaltyTransactionType::Earn,
                    tier_up_bonus,
                    format!("Tier upgrade bonus: {tier_after}"),
                    Some(order_id),
                )
                .await?;
        }

        member = self
            .append_points(
                &txn,
                member,
                LoyaltyTransactionType::Earn,
                purchase_points,
                format!("Purchase: order #{order_id}"),
                Some(order_id),
            )
            .await?;

        txn.commit().await?;

        let total_awarded = member.total_points - points_before;
        log::info!(
            "Member {} accrued {} points for order {} (tier {} -> {})",
            member.id,
            total_awarded,
            order_id,
            tier_before,
            tier_after
        );

        Ok(Some(PurchaseAccrual {
            member_id: member.id,
            order_id,
            amount,
            total_spent: member.total_spent,
            tier_before,
            tier_after,
            purchase_points,
            first_purchase_bonus,
            tier_up_bonus,
            total_awarded,
            available_points: member.available_points(),
        }))
    }

    /// 积分抵扣。校验顺序: 会员存在 -> 会员状态 -> 积分数 -> 余额
    pub async fn redeem(
        &self,
        user_id: i64,
        points: i64,
        reason: &str,
    ) -> AppResult<RedeemPointsResponse> {
        let txn = self.pool.begin().await?;

        let member = Self::lock_member(&txn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Loyalty member not found".into()))?;
        if !member.is_active() {
            return Err(AppError::MemberInactive(
                "Loyalty membership is inactive".into(),
            ));
        }
        if points <= 0 {
            return Err(AppError::InvalidAmount("Points must be positive".into()));
        }
        if points > member.available_points() {
            return Err(AppError::InsufficientBalance(format!(
                "Insufficient points: available {}, requested {}",
                member.available_points(),
                points
            )));
        }

        let description = match reason.trim() {
            "" => "Points redemption".to_string(),
            r => r.to_string(),
        };
        let member = self
            .append_points(
                &txn,
                member,
                LoyaltyTransactionType::Redeem,
                points,
                description,
                None,
            )
            .await?;

        txn.commit().await?;
        log::info!("Member {} redeemed {} points", member.id, points);

        Ok(RedeemPointsResponse {
            success: true,
            message: format!("Redeemed {points} points"),
            available_points: member.available_points(),
        })
    }

    /// 会员详情（含等级）与积分流水
    pub async fn get_member(
        &self,
        user_id: i64,
        query: &MemberTransactionQuery,
    ) -> AppResult<LoyaltyMemberDetail> {
        let member = members::Entity::find()
            .filter(members::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Loyalty member not found".into()))?;

        let params = PaginationParams::new(query.page, query.per_page);
        let base = transactions::Entity::find()
            .filter(transactions::Column::MemberId.eq(member.id));
        let total = base.clone().count(&self.pool).await? as i64;
        let rows = base
            .order_by(transactions::Column::Id, Order::Desc)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;
        let items: Vec<LoyaltyTransactionResponse> = rows.into_iter().map(Into::into).collect();

        Ok(LoyaltyMemberDetail {
            member: LoyaltyMemberResponse::from_model(member, &self.config.tiers),
            transactions: PaginatedResponse::new(
                items,
                params.get_page(),
                params.get_limit(),
                total,
            ),
        })
    }

    /// 启用/停用会员（管理员）
    pub async fn set_status(
        &self,
        user_id: i64,
        status: MemberStatus,
        performed_by: Option<i64>,
    ) -> AppResult<LoyaltyMemberResponse> {
        let txn = self.pool.begin().await?;
        let member = Self::lock_member(&txn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Loyalty member not found".into()))?;

        if member.status == status {
            txn.rollback().await?;
            return Ok(LoyaltyMemberResponse::from_model(member, &self.config.tiers));
        }

        let previous = member.status;
        let mut am = member.into_active_model();
        am.status = Set(status);
        am.updated_at = Set(Utc::now());
        let member = am.update(&txn).await?;

        append_log(
            &txn,
            NewLogEntry::new(
                InstrumentType::Loyalty,
                member.id,
                LogAction::StatusChanged,
                0,
                member.available_points(),
            )
            .performed_by(performed_by)
            .note(format!("{previous} -> {status}")),
        )
        .await?;

        txn.commit().await?;
        log::info!("Member {} status changed: {} -> {}", member.id, previous, status);
        Ok(LoyaltyMemberResponse::from_model(member, &self.config.tiers))
    }
}
