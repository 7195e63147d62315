use autoscale_cuckoo_filter::CuckooFilter;
use futures::future::join_all;
use futures_util::TryStreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Every registered email. A miss means the address is definitely free.
static REGISTERED: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Emails confirmed taken: recent logins, fresh registrations and database hits.
static TAKEN: Lazy<Cache<String, ()>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000)
        .time_to_live(Duration::from_secs(24 * 60 * 60))
        .build()
});

#[inline]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn might_be_registered(email: &str) -> bool {
    REGISTERED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(email)
}

fn add_to_filter(emails: &[String]) {
    let mut filter = REGISTERED.write().unwrap_or_else(PoisonError::into_inner);
    for email in emails {
        filter.add(email);
    }
}

async fn mark_taken(emails: Vec<String>) {
    join_all(emails.into_iter().map(|e| TAKEN.insert(e, ()))).await;
}

/// Whether `email` can still be registered. Only asks the database when
/// neither the filter nor the cache can answer.
pub async fn is_available(email: &str, pool: &MySqlPool) -> Result<bool, sqlx::Error> {
    let email = normalize(email);

    if !might_be_registered(&email) {
        return Ok(true);
    }
    if TAKEN.get(&email).await.is_some() {
        return Ok(false);
    }

    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM employee WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await?;
    let found = exists != 0;

    if found {
        TAKEN.insert(email, ()).await;
    }
    Ok(!found)
}

/// Records a newly registered email.
pub async fn remember(email: &str) {
    let email = normalize(email);
    add_to_filter(std::slice::from_ref(&email));
    TAKEN.insert(email, ()).await;
}

/// Streams the `employee` table once: every email goes into the filter, those
/// that logged in within `recent_days` also go into the cache.
pub async fn warmup(pool: &MySqlPool, recent_days: u32, batch_size: usize) -> anyhow::Result<()> {
    let mut rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT email,
               CAST(COALESCE(last_login_at >= NOW() - INTERVAL ? DAY, 0) AS SIGNED) AS recent
        FROM employee
        "#,
    )
    .bind(recent_days)
    .fetch(pool);

    let batch_size = batch_size.max(1);
    let mut all = Vec::with_capacity(batch_size);
    let mut recent = Vec::new();
    let (mut total, mut cached) = (0usize, 0usize);

    while let Some((email, is_recent)) = rows.try_next().await? {
        let email = normalize(&email);
        if is_recent != 0 {
            recent.push(email.clone());
        }
        all.push(email);

        if all.len() >= batch_size {
            total += all.len();
            cached += recent.len();
            add_to_filter(&all);
            mark_taken(std::mem::take(&mut recent)).await;
            all.clear();
        }
    }

    total += all.len();
    cached += recent.len();
    add_to_filter(&all);
    mark_taken(recent).await;

    tracing::info!(total, cached, recent_days, "Email registry warmup complete");
    Ok(())
}
