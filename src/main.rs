use actix_web::{App, HttpResponse, HttpServer, ResponseError, error, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines
use std::sync::Arc;

use storefront_ledger::{
    AppError,
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 账本配置启动后只读
    let ledger = Arc::new(config.ledger.clone());
    let loyalty_config = Arc::new(config.ledger.loyalty.clone());

    let gift_card_service = GiftCardService::new(pool.clone(), ledger.clone());
    let promo_gift_service = PromoGiftService::new(pool.clone(), ledger.clone());
    let loyalty_service = LoyaltyService::new(pool.clone(), loyalty_config);

    tasks::spawn_all(
        gift_card_service.clone(),
        promo_gift_service.clone(),
        ledger.expiry_sweep_interval_secs,
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        // 请求体/路径解析失败统一返回 VALIDATION_ERROR
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            let response = AppError::ValidationError(err.to_string()).error_response();
            error::InternalError::from_response(err, response).into()
        });
        let path_config = web::PathConfig::default().error_handler(|err, _req| {
            let response = AppError::ValidationError(err.to_string()).error_response();
            error::InternalError::from_response(err, response).into()
        });

        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(json_config)
            .app_data(path_config)
            .app_data(web::Data::new(gift_card_service.clone()))
            .app_data(web::Data::new(promo_gift_service.clone()))
            .app_data(web::Data::new(loyalty_service.clone()))
            .configure(swagger_config)
            .route("/health", web::get().to(health))
            .service(
                web::scope("/api/v1")
                    .configure(handlers::gift_card_config)
                    .configure(handlers::promo_gift_config)
                    .configure(handlers::loyalty_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
