use crate::entities::{InstrumentType, LogAction, instrument_log_entity as logs};
use crate::error::AppResult;
use crate::models::InstrumentLogResponse;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};

/// 一条待写入的审计记录
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub instrument_type: InstrumentType,
    pub instrument_id: i64,
    pub action: LogAction,
    pub amount: i64,
    pub balance_after: i64,
    pub performed_by: Option<i64>,
    pub related_order_id: Option<i64>,
    pub note: Option<String>,
}

impl NewLogEntry {
    pub fn new(
        instrument_type: InstrumentType,
        instrument_id: i64,
        action: LogAction,
        amount: i64,
        balance_after: i64,
    ) -> Self {
        Self {
            instrument_type,
            instrument_id,
            action,
            amount,
            balance_after,
            performed_by: None,
            related_order_id: None,
            note: None,
        }
    }

    pub fn performed_by(mut self, user_id: Option<i64>) -> Self {
        self.performed_by = user_id;
        self
    }

    pub fn order(mut self, order_id: Option<i64>) -> Self {
        self.related_order_id = order_id;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// 追加一条审计日志。
///
/// 必须传入调用方的事务，使日志与它所记录的状态变更同时提交或同时回滚。
pub async fn append_log<C>(conn: &C, entry: NewLogEntry) -> Result<logs::Model, DbErr>
where
    C: ConnectionTrait,
{
    logs::ActiveModel {
        instrument_type: Set(entry.instrument_type),
        instrument_id: Set(entry.instrument_id),
        action: Set(entry.action),
        amount: Set(entry.amount),
        balance_after: Set(entry.balance_after),
        performed_by: Set(entry.performed_by),
        related_order_id: Set(entry.related_order_id),
        note: Set(entry.note),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

/// 查找某订单在该凭证上已记录的扣款（用于保证每个订单最多扣一次）
pub async fn find_redemption_for_order<C>(
    conn: &C,
    instrument_type: InstrumentType,
    instrument_id: i64,
    order_id: i64,
) -> Result<Option<logs::Model>, DbErr>
where
    C: ConnectionTrait,
{
    logs::Entity::find()
        .filter(logs::Column::InstrumentType.eq(instrument_type))
        .filter(logs::Column::InstrumentId.eq(instrument_id))
        .filter(logs::Column::RelatedOrderId.eq(order_id))
        .filter(logs::Column::Action.is_in([LogAction::Redeemed, LogAction::PartialRedeemed]))
        .one(conn)
        .await
}

/// 审计日志只读查询
#[derive(Clone)]
pub struct InstrumentLogService {
    pool: DatabaseConnection,
}

impl InstrumentLogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 某个凭证的完整日志（按时间正序）
    pub async fn list_for(
        &self,
        instrument_type: InstrumentType,
        instrument_id: i64,
    ) -> AppResult<Vec<InstrumentLogResponse>> {
        let rows = logs::Entity::find()
            .filter(logs::Column::InstrumentType.eq(instrument_type))
            .filter(logs::Column::InstrumentId.eq(instrument_id))
            .order_by_asc(logs::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
