use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    GiftCardStatus, InstrumentType, LogAction, LoyaltyTransactionType, MemberStatus,
    PromoGiftStatus,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::gift_card::issue_gift_card,
        handlers::gift_card::get_gift_card,
        handlers::gift_card::redeem_gift_card,
        handlers::gift_card::list_gift_cards,
        handlers::gift_card::get_gift_card_logs,
        handlers::gift_card::cancel_gift_card,
        handlers::promo_gift::create_promo_gift,
        handlers::promo_gift::get_promo_gift,
        handlers::promo_gift::redeem_promo_gift,
        handlers::promo_gift::list_promo_gifts,
        handlers::loyalty::enroll,
        handlers::loyalty::get_member,
        handlers::loyalty::redeem_points,
        handlers::loyalty::record_purchase,
        handlers::loyalty::set_member_status,
    ),
    components(
        schemas(
            GiftCardStatus,
            PromoGiftStatus,
            MemberStatus,
            LoyaltyTransactionType,
            InstrumentType,
            LogAction,
            Tier,
            IssueGiftCardRequest,
            GiftCardResponse,
            GiftCardView,
            RedeemGiftCardRequest,
            RedeemGiftCardResponse,
            CancelGiftCardRequest,
            CreatePromoGiftRequest,
            CreatePromoGiftResponse,
            PromoGiftView,
            RedeemPromoGiftRequest,
            RedeemPromoGiftResponse,
            PromoGiftResponse,
            EnrollRequest,
            LoyaltyMemberResponse,
            LoyaltyTransactionResponse,
            RedeemPointsRequest,
            RedeemPointsResponse,
            RecordPurchaseRequest,
            RecordPurchaseResponse,
            PurchaseAccrual,
            SetMemberStatusRequest,
            InstrumentLogResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "gift_cards", description = "Gift card API"),
        (name = "promo_gifts", description = "Promo gift API"),
        (name = "loyalty", description = "Loyalty points API"),
        (name = "admin", description = "Admin ledger API"),
    ),
    info(
        title = "Storefront Ledger API",
        version = "1.0.0",
        description = "Gift cards, promo gifts and loyalty points REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
