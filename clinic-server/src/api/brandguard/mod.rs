//! Brand Guard API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_manager;
use crate::core::ServerState;

/// Brand guard router (all routes require authentication)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/brandguard", routes())
}

fn routes() -> Router<ServerState> {
    // 读取和生成路由：所有登录用户可用
    let staff_routes = Router::new()
        .route(
            "/vi-config",
            get(handler::get_vi_config).put(handler::put_vi_config),
        )
        .route("/templates", get(handler::list_templates))
        .route("/generate", post(handler::generate_poster))
        .route("/posters", get(handler::list_posters))
        .route("/check-compliance", post(handler::check_compliance));

    // 模板写入路由：需要 manager 角色
    let manager_routes = Router::new()
        .route("/templates", post(handler::create_template))
        .layer(middleware::from_fn(require_manager));

    staff_routes.merge(manager_routes)
}
