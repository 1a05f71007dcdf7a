use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{InstrumentType, LogAction, instrument_log_entity as logs};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstrumentLogResponse {
    pub id: i64,
    pub instrument_type: InstrumentType,
    pub instrument_id: i64,
    pub action: LogAction,
    pub amount: i64,
    pub balance_after: i64,
    pub performed_by: Option<i64>,
    pub related_order_id: Option<i64>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<logs::Model> for InstrumentLogResponse {
    fn from(m: logs::Model) -> Self {
        Self {
            id: m.id,
            instrument_type: m.instrument_type,
            instrument_id: m.instrument_id,
            action: m.action,
            amount: m.amount,
            balance_after: m.balance_after,
            performed_by: m.performed_by,
            related_order_id: m.related_order_id,
            note: m.note,
            timestamp: m.created_at,
        }
    }
}
