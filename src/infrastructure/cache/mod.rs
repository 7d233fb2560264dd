//! Cache infrastructure - Redis and in-memory store implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{create_cache, CacheBackend, CacheFactoryConfig};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
