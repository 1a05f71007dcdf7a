use crate::middlewares::{require_admin, require_self_or_admin};
use crate::models::*;
use crate::services::LoyaltyService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/loyalty/enroll",
    tag = "loyalty",
    request_body = EnrollRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "入会成功，已发放欢迎积分", body = LoyaltyMemberResponse),
        (status = 409, description = "已是会员")
    )
)]
/// 加入积分计划（本人或管理员代办）
pub async fn enroll(
    service: web::Data<LoyaltyService>,
    req: HttpRequest,
    body: web::Json<EnrollRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    if let Err(e) = require_self_or_admin(&req, body.user_id) {
        return Ok(e.error_response());
    }
    match service.enroll(body).await {
        Ok(member) => Ok(HttpResponse::Ok().json(ApiResponse::success(member))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/loyalty/member/{user_id}",
    tag = "loyalty",
    params(
        ("user_id" = i64, Path, description = "用户ID"),
        ("page" = Option<u32>, Query, description = "流水页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "会员信息（含等级）与积分流水"),
        (status = 404, description = "不是会员")
    )
)]
pub async fn get_member(
    service: web::Data<LoyaltyService>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<MemberTransactionQuery>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    if let Err(e) = require_self_or_admin(&req, user_id) {
        return Ok(e.error_response());
    }
    match service.get_member(user_id, &query.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(detail))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/loyalty/redeem",
    tag = "loyalty",
    request_body = RedeemPointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抵扣成功", body = RedeemPointsResponse),
        (status = 404, description = "不是会员"),
        (status = 422, description = "会员已停用 / 积分不足")
    )
)]
/// 使用积分
pub async fn redeem_points(
    service: web::Data<LoyaltyService>,
    req: HttpRequest,
    body: web::Json<RedeemPointsRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    if let Err(e) = require_self_or_admin(&req, body.user_id) {
        return Ok(e.error_response());
    }
    match service.redeem(body.user_id, body.points, &body.reason).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/loyalty/record-purchase",
    tag = "loyalty",
    request_body = RecordPurchaseRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "recorded = false 表示未产生积分变动", body = RecordPurchaseResponse),
        (status = 403, description = "需要管理员权限")
    )
)]
/// 订单完成后结算积分（由订单系统以管理员身份调用）
pub async fn record_purchase(
    service: web::Data<LoyaltyService>,
    req: HttpRequest,
    body: web::Json<RecordPurchaseRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    let body = body.into_inner();
    match service
        .record_purchase(body.user_id, body.order_id, body.amount)
        .await
    {
        Ok(accrual) => Ok(HttpResponse::Ok().json(ApiResponse::success(RecordPurchaseResponse {
            recorded: accrual.is_some(),
            accrual,
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/loyalty/members/{user_id}/status",
    tag = "admin",
    params(
        ("user_id" = i64, Path, description = "用户ID")
    ),
    request_body = SetMemberStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "状态已更新", body = LoyaltyMemberResponse),
        (status = 404, description = "不是会员")
    )
)]
/// 启用/停用会员
pub async fn set_member_status(
    service: web::Data<LoyaltyService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SetMemberStatusRequest>,
) -> Result<HttpResponse> {
    let ctx = match require_admin(&req) {
        Ok(ctx) => ctx,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .set_status(path.into_inner(), body.into_inner().status, Some(ctx.user_id))
        .await
    {
        Ok(member) => Ok(HttpResponse::Ok().json(ApiResponse::success(member))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn loyalty_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/loyalty")
            .route("/enroll", web::post().to(enroll))
            .route("/member/{user_id}", web::get().to(get_member))
            .route("/redeem", web::post().to(redeem_points))
            .route("/record-purchase", web::post().to(record_purchase)),
    );
}
