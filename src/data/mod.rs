//! Data module for configuration and cached token state

pub mod config;
pub mod token_cache;

pub use config::AppConfig;
pub use token_cache::{BaiduTokenFetcher, CachedToken, FreshToken, TokenCache, TokenFetcher};
