//! 数据模型模块
//! 用户（主体）与认证请求/响应

pub mod auth;
pub mod user;
