#![allow(dead_code)]

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::sync::Arc;
use storefront_ledger::config::LedgerConfig;
use storefront_ledger::services::{GiftCardService, LoyaltyService, PromoGiftService};

/// 单连接内存库，每个测试独立
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("failed to open in-memory sqlite");
    Migrator::up(&db, None).await.expect("failed to run migrations");
    db
}

pub fn ledger() -> Arc<LedgerConfig> {
    Arc::new(LedgerConfig::default())
}

pub struct Services {
    pub db: DatabaseConnection,
    pub gift_cards: GiftCardService,
    pub promo_gifts: PromoGiftService,
    pub loyalty: LoyaltyService,
}

pub async fn setup() -> Services {
    services(setup_db().await)
}

fn services(db: DatabaseConnection) -> Services {
    let ledger = ledger();
    Services {
        gift_cards: GiftCardService::new(db.clone(), ledger.clone()),
        promo_gifts: PromoGiftService::new(db.clone(), ledger.clone()),
        loyalty: LoyaltyService::new(db.clone(), Arc::new(ledger.loyalty.clone())),
        db,
    }
}

/// 真实 Postgres 上的隔离 schema，用于验证行锁下的并发行为
pub struct PgHarness {
    pub services: Services,
    admin: DatabaseConnection,
    schema: String,
}

impl PgHarness {
    pub async fn teardown(self) {
        drop(self.services);
        self.admin
            .execute_unprepared(&format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", self.schema))
            .await
            .expect("failed to drop test schema");
    }
}

/// 未设置 TEST_DATABASE_URL 时返回 None，调用方跳过测试
pub async fn setup_postgres() -> Option<PgHarness> {
    let url = std::env::var("TEST_DATABASE_URL")
        .ok()
        .filter(|u| u.starts_with("postgres"))?;
    let schema = format!("ledger_test_{:08x}", rand::random::<u32>());

    let admin = Database::connect(ConnectOptions::new(url.clone()))
        .await
        .expect("failed to connect to postgres");
    admin
        .execute_unprepared(&format!("CREATE SCHEMA \"{schema}\""))
        .await
        .expect("failed to create test schema");

    let mut opts = ConnectOptions::new(url);
    opts.max_connections(16)
        .sqlx_logging(false)
        .set_schema_search_path(schema.clone());
    let db = Database::connect(opts)
        .await
        .expect("failed to open postgres pool");
    Migrator::up(&db, None).await.expect("failed to run migrations");

    Some(PgHarness {
        services: services(db),
        admin,
        schema,
    })
}
