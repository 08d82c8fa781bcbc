//! Rate-limit counter stores
//!
//! Every store implements `RateLimitStoreTrait`, whose `conditional_upsert`
//! must re-check cooldown and cap and increment in one atomic step:
//! - `RedisRateLimitStore`: a Lua script, atomic on the server
//! - `InMemoryRateLimitStore`: the phone's `DashMap` shard lock
//! - `MySqlRateLimitStore`: a transaction holding the phone's row lock

pub mod memory_store;
#[cfg(feature = "mysql")]
pub mod mysql_store;
pub mod redis_store;

#[cfg(test)]
mod tests;

pub use memory_store::InMemoryRateLimitStore;
#[cfg(feature = "mysql")]
pub use mysql_store::MySqlRateLimitStore;
pub use redis_store::RedisRateLimitStore;

use sha2::{Digest, Sha256};

/// Hex SHA-256 of a phone number, used where phones would otherwise appear in keys
pub(crate) fn hash_phone(phone: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(phone.as_bytes());
    format!("{:x}", hasher.finalize())
}
