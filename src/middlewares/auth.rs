use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// 鉴权通过后注入请求扩展的调用方身份
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub is_admin: bool,
}

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // 仅 GET 公开（按码查询）
    get_prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/health",
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
            ],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/"],
            get_prefix_paths: vec!["/api/v1/gift-cards/", "/api/v1/promo-gifts/"],
        }
    }

    fn is_public_path(&self, method: &Method, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }
        // GET /gift-cards/{code}、GET /promo-gifts/{token}，只放行单段路径
        *method == Method::GET
            && self.get_prefix_paths.iter().any(|&prefix| {
                path.strip_prefix(prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        if self.public_paths.is_public_path(req.method(), req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::to_owned);

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        let ctx = self
            .jwt_service
            .verify_access_token(&token)
            .ok()
            .and_then(|claims| {
                let user_id = claims.sub.parse::<i64>().ok()?;
                Some(AuthContext {
                    user_id,
                    is_admin: claims.is_admin(),
                })
            });

        match ctx {
            Some(ctx) => {
                req.extensions_mut().insert(ctx);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            None => {
                log::warn!("Rejected access token on {} {}", req.method(), req.path());
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// 当前请求的调用方（公开路径上为 None）
pub fn current_auth(req: &HttpRequest) -> Option<AuthContext> {
    req.extensions().get::<AuthContext>().copied()
}

pub fn require_auth(req: &HttpRequest) -> AppResult<AuthContext> {
    current_auth(req).ok_or_else(|| AppError::AuthError("Missing access token".into()))
}

pub fn require_admin(req: &HttpRequest) -> AppResult<AuthContext> {
    let ctx = require_auth(req)?;
    if !ctx.is_admin {
        return Err(AppError::Unauthorized("Admin privileges required".into()));
    }
    Ok(ctx)
}

/// 本人或管理员
pub fn require_self_or_admin(req: &HttpRequest, user_id: i64) -> AppResult<AuthContext> {
    let ctx = require_auth(req)?;
    if !ctx.is_admin && ctx.user_id != user_id {
        return Err(AppError::Unauthorized(
            "Cannot act on another user's account".into(),
        ));
    }
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_paths_public_only_for_get() {
        let p = PublicPaths::new();
        assert!(p.is_public_path(&Method::GET, "/api/v1/gift-cards/GC-ABCDEFGH"));
        assert!(p.is_public_path(&Method::GET, "/api/v1/promo-gifts/PG-ABCDEFGH"));
        assert!(!p.is_public_path(&Method::POST, "/api/v1/gift-cards/redeem"));
        assert!(!p.is_public_path(&Method::POST, "/api/v1/promo-gifts/PG-ABCDEFGH/redeem"));
    }

    #[test]
    fn test_nested_and_admin_paths_are_protected() {
        let p = PublicPaths::new();
        assert!(!p.is_public_path(&Method::GET, "/api/v1/gift-cards/"));
        assert!(!p.is_public_path(&Method::GET, "/api/v1/admin/gift-cards"));
        assert!(!p.is_public_path(&Method::GET, "/api/v1/loyalty/member/1"));
    }

    #[test]
    fn test_docs_and_health_are_public() {
        let p = PublicPaths::new();
        assert!(p.is_public_path(&Method::GET, "/health"));
        assert!(p.is_public_path(&Method::GET, "/swagger-ui/index.html"));
        assert!(p.is_public_path(&Method::GET, "/api-docs/openapi.json"));
    }
}
