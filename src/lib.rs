//! 衣橱服务认证库
//! 令牌签发与校验、请求认证闸门、用户存储

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
