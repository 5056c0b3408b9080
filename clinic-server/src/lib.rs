//! Clinic Server - 医美诊所业务后端
//!
//! # 架构概述
//!
//! 本模块是诊所后端的主入口，提供以下核心功能：
//!
//! - **面部模拟** (`facesim`): 照片质量检测、皮肤分析、治疗效果模拟
//! - **品牌物料** (`brandguard`): VI 配置、海报模板、广告合规检测
//! - **数据库** (`db`): 嵌入式 SQLite 存储 (sqlx)
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! clinic-server/src/
//! ├── core/          # 配置、状态、服务器启动
//! ├── auth/          # JWT 认证、角色检查
//! ├── facesim/       # 面部模拟工作流
//! ├── brandguard/    # 合规检测
//! ├── api/           # HTTP 路由和处理器
//! ├── routes/        # 路由组装和中间件栈
//! ├── utils/         # 错误、日志、校验
//! └── db/            # 数据库层
//! ```

pub mod api;
pub mod auth;
pub mod brandguard;
pub mod core;
pub mod db;
pub mod facesim;
pub mod routes;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use facesim::FaceSimService;
pub use routes::{OneshotResult, OneshotRouter};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
╔══════════════════════════════════════════╗
║        Clinic Server - FaceSim API       ║
╚══════════════════════════════════════════╝
    "#
    );
}
