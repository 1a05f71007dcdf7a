use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Not active: {0}")]
    NotActive(String),

    #[error("Already used: {0}")]
    AlreadyUsed(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Limit reached: {0}")]
    LimitReached(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Wrong instrument type: {0}")]
    WrongInstrumentType(String),

    #[error("Member inactive: {0}")]
    MemberInactive(String),

    #[error("Already enrolled: {0}")]
    AlreadyEnrolled(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// 稳定的机器可读错误码
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidAmount(_) => "INVALID_AMOUNT",
            AppError::NotActive(_) => "NOT_ACTIVE",
            AppError::AlreadyUsed(_) => "ALREADY_USED",
            AppError::Expired(_) => "EXPIRED",
            AppError::LimitReached(_) => "LIMIT_REACHED",
            AppError::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            AppError::WrongInstrumentType(_) => "WRONG_INSTRUMENT_TYPE",
            AppError::MemberInactive(_) => "MEMBER_INACTIVE",
            AppError::AlreadyEnrolled(_) => "ALREADY_ENROLLED",
            AppError::DatabaseError(_)
            | AppError::ConfigError(_)
            | AppError::InternalError(_)
            | AppError::SerdeJsonError(_) => "INTERNAL_ERROR",
        }
    }

    /// 基础设施类错误（数据库/配置/内部），对外只返回通用提示
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_)
                | AppError::ConfigError(_)
                | AppError::InternalError(_)
                | AppError::SerdeJsonError(_)
        )
    }

    fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidAmount(msg)
            | AppError::NotActive(msg)
            | AppError::AlreadyUsed(msg)
            | AppError::Expired(msg)
            | AppError::LimitReached(msg)
            | AppError::InsufficientBalance(msg)
            | AppError::WrongInstrumentType(msg)
            | AppError::MemberInactive(msg)
            | AppError::AlreadyEnrolled(msg) => msg.clone(),
            AppError::JwtError(_) => "Invalid access token".to_string(),
            _ => "Service temporarily unavailable, please try again".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotActive(_)
            | AppError::AlreadyUsed(_)
            | AppError::Expired(_)
            | AppError::LimitReached(_)
            | AppError::InsufficientBalance(_)
            | AppError::WrongInstrumentType(_)
            | AppError::MemberInactive(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AlreadyEnrolled(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::AuthError(msg) | AppError::Unauthorized(msg) => {
                log::warn!("Authentication error: {msg}");
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
            }
            err if err.is_infrastructure() => {
                log::error!("Internal error: {err}");
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": self.kind(),
                "message": self.user_message()
            }
        }))
    }
}
