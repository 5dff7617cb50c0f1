pub mod advisory;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod redis;
pub mod routing;
