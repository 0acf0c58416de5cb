pub mod memory;
pub mod postgres;
pub mod redis;
pub mod repository;

pub use memory::InMemoryRepository;
pub use postgres::{create_pool, PgRepository};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;
pub use repository::MusicRepository;
