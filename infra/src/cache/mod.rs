//! Cache module for Redis-based counters
//!
//! This module provides the Redis connection used by the Redis counter
//! store, with connection retry and exponential backoff.

pub mod redis_client;

pub use redis_client::RedisClient;

// Re-export commonly used types
pub use og_shared::config::cache::CacheConfig;
