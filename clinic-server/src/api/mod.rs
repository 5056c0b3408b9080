//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查接口
//! - [`auth`] - 认证相关接口
//! - [`facesim`] - 面部模拟接口
//! - [`brandguard`] - 品牌物料与合规接口
//! - [`uploads`] - 图片与生成产物访问接口

pub mod auth;
pub mod brandguard;
pub mod facesim;
pub mod health;
pub mod uploads;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
