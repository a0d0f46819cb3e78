//! Popular products cache.
//!
//! Every request host gets its own pair of redis keys: a sorted set of view
//! counts and a list holding the current top product ids. Reads only touch the
//! list, so the catalog keeps working with a stale or missing cache.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Timed out waiting for redis")]
    Timeout,
}

#[async_trait]
pub trait PopularCache: Send + Sync {
    /// Product ids of the popular list for `host`, most popular first.
    async fn popular_ids(&self, host: &str) -> Result<Vec<String>, CacheError>;

    /// Counts one view of `product_id` and refreshes the popular list.
    async fn record_view(&self, host: &str, product_id: &str) -> Result<(), CacheError>;
}

pub fn list_key(host: &str) -> String {
    format!("popular:{}:products", host)
}

pub fn views_key(host: &str) -> String {
    format!("popular:{}:views", host)
}

#[derive(Clone)]
pub struct RedisPopularCache {
    client: redis::Client,
    limit: isize,
    timeout: Duration,
}

impl RedisPopularCache {
    pub fn new(url: &str, limit: isize, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            limit,
            timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Runs a whole cache exchange, connect and commands alike, under the timeout.
    async fn bounded<T, F>(&self, work: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| CacheError::Timeout)?
    }
}

#[async_trait]
impl PopularCache for RedisPopularCache {
    async fn popular_ids(&self, host: &str) -> Result<Vec<String>, CacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let ids: Vec<String> = conn.lrange(list_key(host), 0, -1).await?;
            Ok(ids)
        })
        .await
    }

    async fn record_view(&self, host: &str, product_id: &str) -> Result<(), CacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let views = views_key(host);
            let list = list_key(host);

            conn.zincr::<_, _, _, f64>(&views, product_id, 1).await?;
            let top: Vec<String> = conn.zrevrange(&views, 0, self.limit - 1).await?;
            if top.is_empty() {
                return Ok(());
            }

            redis::pipe()
                .atomic()
                .del(&list)
                .ignore()
                .rpush(&list, &top)
                .ignore()
                .query_async::<_, ()>(&mut conn)
                .await?;
            debug!(host, product_id, "Recorded product view");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_by_host() {
        assert_eq!(list_key("shop.local:3000"), "popular:shop.local:3000:products");
        assert_eq!(views_key("shop.local"), "popular:shop.local:views");
        assert_ne!(list_key("a"), list_key("b"));
    }

    #[tokio::test]
    async fn unreachable_redis_is_an_error_not_a_hang() {
        let cache =
            RedisPopularCache::new("redis://127.0.0.1:1", 8, Duration::from_millis(200)).unwrap();
        assert!(cache.popular_ids("localhost").await.is_err());
    }

    #[tokio::test]
    async fn silent_redis_times_out() {
        // accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let cache =
            RedisPopularCache::new(&format!("redis://{addr}"), 8, Duration::from_millis(200))
                .unwrap();

        let read = tokio::time::timeout(Duration::from_secs(5), cache.popular_ids("localhost"))
            .await
            .expect("read outlived the cache timeout");
        assert!(matches!(read, Err(CacheError::Timeout)));

        let write = tokio::time::timeout(
            Duration::from_secs(5),
            cache.record_view("localhost", "some-id"),
        )
        .await
        .expect("write outlived the cache timeout");
        assert!(matches!(write, Err(CacheError::Timeout)));
    }
}
