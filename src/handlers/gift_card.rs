use crate::entities::GiftCardStatus;
use crate::middlewares::{require_admin, require_auth};
use crate::models::*;
use crate::services::GiftCardService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/gift-cards/issue",
    tag = "gift_cards",
    request_body = IssueGiftCardRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "发卡成功", body = GiftCardResponse),
        (status = 400, description = "金额或有效期无效"),
        (status = 403, description = "需要管理员权限")
    )
)]
/// 管理员发放礼品卡
pub async fn issue_gift_card(
    service: web::Data<GiftCardService>,
    req: HttpRequest,
    body: web::Json<IssueGiftCardRequest>,
) -> Result<HttpResponse> {
    let ctx = match require_admin(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match service.issue(body.into_inner(), Some(ctx.user_id)).await {
        Ok(card) => Ok(HttpResponse::Ok().json(ApiResponse::success(card))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/gift-cards/{code}",
    tag = "gift_cards",
    params(
        ("code" = String, Path, description = "礼品卡号 (GC-XXXXXXXX，大小写不敏感)")
    ),
    responses(
        (status = 200, description = "查询成功", body = GiftCardView),
        (status = 404, description = "卡号不存在"),
        (status = 422, description = "传入的是促销券码")
    )
)]
/// 公开查询礼品卡余额与状态（无需登录）
pub async fn get_gift_card(
    service: web::Data<GiftCardService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.inspect(&path.into_inner()).await {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(view))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/gift-cards/redeem",
    tag = "gift_cards",
    request_body = RedeemGiftCardRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "预览或扣款成功 (committed 区分)", body = RedeemGiftCardResponse),
        (status = 404, description = "卡号不存在"),
        (status = 422, description = "已用完 / 已过期 / 未激活 / 类型错误")
    )
)]
/// 兑换礼品卡:
/// - 不带 orderId: 仅预览本次可抵扣金额，不改变余额
/// - 带 orderId: 实际扣款；同一订单重复提交返回首次结果
pub async fn redeem_gift_card(
    service: web::Data<GiftCardService>,
    req: HttpRequest,
    body: web::Json<RedeemGiftCardRequest>,
) -> Result<HttpResponse> {
    let ctx = match require_auth(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    let body = body.into_inner();
    match service
        .redeem(
            &body.code,
            body.amount_to_apply,
            body.order_id,
            Some(ctx.user_id),
        )
        .await
    {
        Ok(outcome) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RedeemGiftCardResponse::from(outcome),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/gift-cards",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)"),
        ("status" = Option<GiftCardStatus>, Query, description = "按状态过滤"),
        ("assigned_to" = Option<i64>, Query, description = "按持卡用户过滤")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "分页礼品卡列表"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_gift_cards(
    service: web::Data<GiftCardService>,
    req: HttpRequest,
    query: web::Query<GiftCardQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match service.list(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/gift-cards/{code}/logs",
    tag = "admin",
    params(
        ("code" = String, Path, description = "礼品卡号")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "审计日志（按时间正序）", body = [InstrumentLogResponse]),
        (status = 404, description = "卡号不存在")
    )
)]
pub async fn get_gift_card_logs(
    service: web::Data<GiftCardService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match service.logs(&path.into_inner()).await {
        Ok(logs) => Ok(HttpResponse::Ok().json(ApiResponse::success(logs))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/gift-cards/{code}/cancel",
    tag = "admin",
    params(
        ("code" = String, Path, description = "礼品卡号")
    ),
    request_body = CancelGiftCardRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已作废", body = GiftCardResponse),
        (status = 422, description = "卡片不是 active 状态")
    )
)]
/// 作废礼品卡（仅 active 卡）
pub async fn cancel_gift_card(
    service: web::Data<GiftCardService>,
    req: HttpRequest,
    path: web::Path<String>,
    body: Option<web::Json<CancelGiftCardRequest>>,
) -> Result<HttpResponse> {
    let ctx = match require_admin(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    let note = body.and_then(|b| b.into_inner().note);
    match service
        .cancel(&path.into_inner(), Some(ctx.user_id), note)
        .await
    {
        Ok(card) => Ok(HttpResponse::Ok().json(ApiResponse::success(card))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn gift_card_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gift-cards")
            .route("/issue", web::post().to(issue_gift_card))
            .route("/redeem", web::post().to(redeem_gift_card))
            .route("/{code}", web::get().to(get_gift_card)),
    );
}
