pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logger;
pub mod markdown;
pub mod metrics;
pub mod models;
pub mod proxy;
pub mod server;
pub mod state;
pub mod vendors;
