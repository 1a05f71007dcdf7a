use crate::models::TierSchedule;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 凭证账本配置（启动时加载一次，之后只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub default_currency: String,
    /// 生成唯一卡号/券码时的最大重试次数
    pub code_generation_attempts: u32,
    /// 过期扫描间隔(秒)
    pub expiry_sweep_interval_secs: u64,
    pub loyalty: LoyaltyConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_currency: "USD".to_string(),
            code_generation_attempts: 10,
            expiry_sweep_interval_secs: 3600,
            loyalty: LoyaltyConfig::default(),
        }
    }
}

/// 积分规则: 奖励常量 + 等级表
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltyConfig {
    /// 入会即送
    pub welcome_bonus_points: i64,
    /// 入会后首笔达标消费的一次性奖励
    pub first_purchase_bonus_points: i64,
    pub first_purchase_window_days: i64,
    /// 首购奖励的单笔最低消费(美分)
    pub first_purchase_min_amount: i64,
    /// 升级奖励
    pub tier_up_bonus_points: i64,
    pub tiers: TierSchedule,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            welcome_bonus_points: 50,
            first_purchase_bonus_points: 50,
            first_purchase_window_days: 30,
            first_purchase_min_amount: 15_000,
            tier_up_bonus_points: 100,
            tiers: TierSchedule::default(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.default_currency.trim().is_empty() {
            return Err("ledger.default_currency must not be empty".to_string());
        }
        if self.code_generation_attempts == 0 {
            return Err("ledger.code_generation_attempts must be at least 1".to_string());
        }
        if self.expiry_sweep_interval_secs == 0 {
            return Err("ledger.expiry_sweep_interval_secs must be positive".to_string());
        }
        let l = &self.loyalty;
        if l.welcome_bonus_points < 0
            || l.first_purchase_bonus_points < 0
            || l.tier_up_bonus_points < 0
            || l.first_purchase_window_days < 0
            || l.first_purchase_min_amount < 0
        {
            return Err("ledger.loyalty constants must not be negative".to_string());
        }
        l.tiers.validate().map_err(|e| format!("ledger.loyalty.tiers: {e}"))
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    ledger: LedgerConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }

        // 账本
        if let Ok(v) = env::var("LEDGER_DEFAULT_CURRENCY") {
            config.ledger.default_currency = v;
        }
        if let Ok(v) = env::var("LEDGER_EXPIRY_SWEEP_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            config.ledger.expiry_sweep_interval_secs = n;
        }

        config
            .ledger
            .validate()
            .map_err(crate::error::AppError::ConfigError)?;

        Ok(config)
    }
}
