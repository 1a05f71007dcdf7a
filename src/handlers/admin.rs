use super::gift_card::{cancel_gift_card, get_gift_card_logs, list_gift_cards};
use super::loyalty::set_member_status;
use super::promo_gift::list_promo_gifts;
use actix_web::web;

/// 管理端路由（各处理函数内部校验管理员身份）
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/gift-cards", web::get().to(list_gift_cards))
            .route("/gift-cards/{code}/logs", web::get().to(get_gift_card_logs))
            .route("/gift-cards/{code}/cancel", web::post().to(cancel_gift_card))
            .route("/promo-gifts", web::get().to(list_promo_gifts))
            .route(
                "/loyalty/members/{user_id}/status",
                web::post().to(set_member_status),
            ),
    );
}
