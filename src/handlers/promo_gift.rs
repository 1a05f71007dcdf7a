use crate::entities::PromoGiftStatus;
use crate::middlewares::{current_auth, require_admin};
use crate::models::*;
use crate::services::PromoGiftService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/promo-gifts",
    tag = "promo_gifts",
    request_body = CreatePromoGiftRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建成功", body = CreatePromoGiftResponse),
        (status = 400, description = "参数无效"),
        (status = 403, description = "需要管理员权限")
    )
)]
/// 管理员创建促销礼券
pub async fn create_promo_gift(
    service: web::Data<PromoGiftService>,
    req: HttpRequest,
    body: web::Json<CreatePromoGiftRequest>,
) -> Result<HttpResponse> {
    let ctx = match require_admin(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match service.create(body.into_inner(), Some(ctx.user_id)).await {
        Ok(promo) => Ok(HttpResponse::Ok().json(ApiResponse::success(promo))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/promo-gifts/{token}",
    tag = "promo_gifts",
    params(
        ("token" = String, Path, description = "券码 (PG-XXXXXXXX，大小写不敏感)")
    ),
    responses(
        (status = 200, description = "可用", body = PromoGiftView),
        (status = 404, description = "券码不存在"),
        (status = 422, description = "已过期 / 次数用尽 / 已停用 / 类型错误")
    )
)]
/// 公开查询促销礼券（无需登录，不改变任何数据）
pub async fn get_promo_gift(
    service: web::Data<PromoGiftService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.inspect(&path.into_inner()).await {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(view))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/promo-gifts/{token}/redeem",
    tag = "promo_gifts",
    params(
        ("token" = String, Path, description = "券码")
    ),
    request_body = RedeemPromoGiftRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "使用成功", body = RedeemPromoGiftResponse),
        (status = 404, description = "券码不存在"),
        (status = 422, description = "已过期 / 次数用尽 / 已停用")
    )
)]
/// 使用一次促销礼券
pub async fn redeem_promo_gift(
    service: web::Data<PromoGiftService>,
    req: HttpRequest,
    path: web::Path<String>,
    body: Option<web::Json<RedeemPromoGiftRequest>>,
) -> Result<HttpResponse> {
    let performed_by = current_auth(&req).map(|ctx| ctx.user_id);
    let body = body.map(|b| b.into_inner()).unwrap_or_default();
    match service
        .redeem(&path.into_inner(), body.order_total, body.order_id, performed_by)
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/promo-gifts",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)"),
        ("status" = Option<PromoGiftStatus>, Query, description = "按状态过滤")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "分页促销礼券列表"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_promo_gifts(
    service: web::Data<PromoGiftService>,
    req: HttpRequest,
    query: web::Query<PromoGiftQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match service.list(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn promo_gift_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/promo-gifts")
            .route("", web::post().to(create_promo_gift))
            .route("/{token}", web::get().to(get_promo_gift))
            .route("/{token}/redeem", web::post().to(redeem_promo_gift)),
    );
}
