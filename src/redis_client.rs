use redis::{aio::ConnectionManager, Client};
use tracing::info;

// Соединение с Redis, в котором живут веб-сессии.
// ConnectionManager сам переподключается после обрыва.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_connection_manager().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis session store reachable");
        Ok(RedisClient { conn })
    }
}
