use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::SqlitePool;
use std::sync::RwLock;
use std::time::Duration;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;
const CACHE_CAPACITY: u64 = 50_000;
const CACHE_TTL: Duration = Duration::from_secs(86_400);

#[inline]
fn normalize(username: &str) -> String {
    username.trim().to_lowercase()
}

/// In-memory answer to "is this username taken?".
///
/// The cuckoo filter gives fast negatives, the cache fast positives, and the
/// database settles everything else.
pub struct UsernameIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, bool>,
}

impl Default for UsernameIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl UsernameIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// Record a username as taken after a successful insert.
    pub async fn mark_taken(&self, username: &str) {
        let username = normalize(username);
        if let Ok(mut filter) = self.filter.write() {
            filter.add(&username);
        }
        self.taken.insert(username, true).await;
    }

    /// true  => username AVAILABLE
    /// false => username TAKEN
    pub async fn is_available(&self, pool: &SqlitePool, username: &str) -> Result<bool, sqlx::Error> {
        let username = normalize(username);

        // Cuckoo filter: a miss means the name was never seen
        let might_exist = match self.filter.read() {
            Ok(filter) => filter.contains(&username),
            Err(_) => true,
        };
        if !might_exist {
            return Ok(true);
        }

        if self.taken.get(&username).await.unwrap_or(false) {
            return Ok(false);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = ? LIMIT 1)",
        )
        .bind(&username)
        .fetch_one(pool)
        .await?;

        if exists {
            self.taken.insert(username, true).await;
        }

        Ok(!exists)
    }

    /// Load every stored username into the filter, in batches.
    pub async fn warmup(&self, pool: &SqlitePool, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT username FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (username,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(normalize(&username));
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch)?;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch)?;
        }

        tracing::info!(total, "Username index warmup complete");
        Ok(total)
    }

    fn insert_batch(&self, usernames: &[String]) -> Result<()> {
        let mut filter = self
            .filter
            .write()
            .map_err(|_| anyhow!("username filter poisoned"))?;

        for username in usernames {
            filter.add(username);
        }
        Ok(())
    }
}
