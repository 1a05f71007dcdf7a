pub mod auth;
pub mod cors;

pub use auth::{
    AuthContext, AuthMiddleware, current_auth, require_admin, require_auth, require_self_or_admin,
};
pub use cors::create_cors;
