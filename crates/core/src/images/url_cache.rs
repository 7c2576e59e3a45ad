use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};

use super::entry::{CacheEntry, TierLookup};
use super::{ImageCacheConfig, ImageRef, PrefetchReport, ResolvedUrl, UrlSource};
use crate::{Clock, DurableStore, ObjectStorage, SystemClock};

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Read-through cache of image access URLs.
///
/// Cloning is cheap; clones share every tier.
#[derive(Clone)]
pub struct ImageUrlCache {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn ObjectStorage>,
    durable: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    config: ImageCacheConfig,
    public: RwLock<HashMap<String, CacheEntry>>,
    memory: RwLock<HashMap<String, CacheEntry>>,
}

fn read_tier(tier: &RwLock<HashMap<String, CacheEntry>>, entity_id: &str, now_ms: i64) -> TierLookup {
    let tier = tier.read().unwrap_or_else(PoisonError::into_inner);
    TierLookup::check(tier.get(entity_id), now_ms)
}

fn write_tier(tier: &RwLock<HashMap<String, CacheEntry>>, entity_id: &str, entry: CacheEntry) {
    tier.write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(entity_id.to_string(), entry);
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

impl std::fmt::Debug for ImageUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUrlCache").field("config", &self.inner.config).finish()
    }
}

impl ImageUrlCache {
    pub fn new(storage: Arc<dyn ObjectStorage>, durable: Arc<dyn DurableStore>, config: ImageCacheConfig) -> Self {
        Self::with_clock(storage, durable, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        storage: Arc<dyn ObjectStorage>, durable: Arc<dyn DurableStore>, config: ImageCacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                durable,
                clock,
                config,
                public: RwLock::new(HashMap::new()),
                memory: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &ImageCacheConfig {
        &self.inner.config
    }

    /// Namespaced durable key for `entity_id`.
    pub fn durable_key(&self, entity_id: &str) -> String {
        format!("{}{}", self.inner.config.key_prefix, entity_id)
    }

    /// A currently usable URL for the image, or `None` if the image is
    /// unavailable. `expiry_hours` defaults to the configured window and only
    /// affects how long a newly signed URL is reused locally.
    pub async fn get_cached_image_url(
        &self, resource_path: &str, entity_id: &str, expiry_hours: Option<u32>,
    ) -> Option<String> {
        self.resolve(resource_path, entity_id, expiry_hours)
            .await
            .map(|resolved| resolved.url)
    }

    /// Like [`get_cached_image_url`](Self::get_cached_image_url), also
    /// reporting which tier answered.
    pub async fn resolve(&self, resource_path: &str, entity_id: &str, expiry_hours: Option<u32>) -> Option<ResolvedUrl> {
        if resource_path.is_empty() || entity_id.is_empty() {
            tracing::warn!(resource_path, entity_id, "cannot resolve image without path and entity id");
            return None;
        }

        let inner = &self.inner;
        let now = inner.clock.now_ms();

        if inner.config.prefer_public_urls
            && let Some(url) = self.public_url(resource_path, entity_id, now)
        {
            return Some(ResolvedUrl { url, source: UrlSource::Public });
        }

        match read_tier(&inner.memory, entity_id, now) {
            TierLookup::Hit(entry) => {
                tracing::debug!(entity_id, "image url memory hit");
                return Some(ResolvedUrl { url: entry.url, source: UrlSource::Memory });
            }
            lookup => tracing::debug!(entity_id, tier = "memory", outcome = lookup.label(), "image url lookup"),
        }

        let key = self.durable_key(entity_id);
        match self.read_durable(&key, now).await {
            TierLookup::Hit(entry) => {
                tracing::debug!(
                    entity_id,
                    expires_in_min = (entry.expires_at_ms - now) / 60_000,
                    "image url durable hit"
                );
                write_tier(&inner.memory, entity_id, entry.clone());
                return Some(ResolvedUrl { url: entry.url, source: UrlSource::Durable });
            }
            lookup => tracing::debug!(entity_id, tier = "durable", outcome = lookup.label(), "image url lookup"),
        }

        let expiry_hours = expiry_hours.unwrap_or(inner.config.default_expiry_hours);
        self.fetch_signed(resource_path, entity_id, &key, expiry_hours)
            .await
            .map(|url| ResolvedUrl { url, source: UrlSource::Signed })
    }

    fn public_url(&self, resource_path: &str, entity_id: &str, now: i64) -> Option<String> {
        let inner = &self.inner;
        if let TierLookup::Hit(entry) = read_tier(&inner.public, entity_id, now) {
            return Some(entry.url);
        }

        let url = inner
            .storage
            .public_url(resource_path)
            .filter(|url| !url.is_empty())?;
        let expires = now.saturating_add(duration_ms(inner.config.public_url_memo));
        write_tier(&inner.public, entity_id, CacheEntry::new(url.clone(), expires));
        tracing::debug!(entity_id, "using public image url");
        Some(url)
    }

    /// Local reuse window for a new signed URL, never longer than the token.
    fn local_lifetime_ms(&self, entity_id: &str, expiry_hours: u32) -> i64 {
        let requested = i64::from(expiry_hours).saturating_mul(MS_PER_HOUR);
        let token = duration_ms(self.inner.config.signed_url_ttl);
        if requested > token {
            tracing::debug!(entity_id, expiry_hours, token_ms = token, "local image expiry capped at token lifetime");
        }
        requested.min(token)
    }

    async fn read_durable(&self, key: &str, now: i64) -> TierLookup {
        match self.inner.durable.get(key).await {
            Ok(raw) => TierLookup::decode(raw.as_deref(), now),
            Err(e) => {
                tracing::warn!(key, error = %e, "durable image cache read failed");
                TierLookup::Miss
            }
        }
    }

    async fn fetch_signed(&self, resource_path: &str, entity_id: &str, key: &str, expiry_hours: u32) -> Option<String> {
        let inner = &self.inner;
        tracing::debug!(entity_id, resource_path, "requesting signed image url");
        let requested_at = inner.clock.now_ms();

        let url = match inner
            .storage
            .issue_signed_url(resource_path, inner.config.signed_url_ttl)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(entity_id, resource_path, error = %e, "failed to issue signed image url");
                return None;
            }
        };

        let expires = requested_at.saturating_add(self.local_lifetime_ms(entity_id, expiry_hours));
        let entry = CacheEntry::new(url.clone(), expires);

        match entry.to_json() {
            Ok(raw) => {
                if let Err(e) = inner.durable.set(key, &raw).await {
                    tracing::warn!(key, error = %e, "durable image cache write failed");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "failed to encode image cache entry"),
        }
        write_tier(&inner.memory, entity_id, entry);

        Some(url)
    }

    /// Warm the cache for `items`.
    ///
    /// Items are resolved `prefetch_batch_size` at a time with a pause
    /// between batches to stay under the storage service's rate limits.
    pub async fn prefetch_image_urls(&self, items: &[ImageRef]) -> PrefetchReport {
        let usable: Vec<&ImageRef> = items
            .iter()
            .filter(|item| !item.resource_path.is_empty() && !item.entity_id.is_empty())
            .collect();
        let mut report =
            PrefetchReport { requested: items.len(), skipped: items.len() - usable.len(), ..Default::default() };

        let batch_size = self.inner.config.prefetch_batch_size.max(1);
        for (index, batch) in usable.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.inner.config.prefetch_batch_delay).await;
            }

            let mut join_set = JoinSet::new();
            for item in batch {
                let cache = self.clone();
                let item = (*item).clone();
                join_set.spawn(async move {
                    cache
                        .resolve(&item.resource_path, &item.entity_id, None)
                        .await
                        .is_some()
                });
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(true) => report.resolved += 1,
                    Ok(false) => report.unavailable += 1,
                    Err(e) => {
                        tracing::error!(error = %e, "image prefetch task failed");
                        report.unavailable += 1;
                    }
                }
            }
        }

        tracing::debug!(
            requested = report.requested,
            resolved = report.resolved,
            unavailable = report.unavailable,
            "image prefetch finished"
        );
        report
    }

    /// Run [`prefetch_image_urls`](Self::prefetch_image_urls) in the background.
    pub fn spawn_prefetch(&self, items: Vec<ImageRef>) -> JoinHandle<PrefetchReport> {
        let cache = self.clone();
        tokio::spawn(async move { cache.prefetch_image_urls(&items).await })
    }

    /// Forget everything cached for `entity_id` in every tier.
    pub async fn invalidate(&self, entity_id: &str) {
        let inner = &self.inner;
        inner.public.write().unwrap_or_else(PoisonError::into_inner).remove(entity_id);
        inner.memory.write().unwrap_or_else(PoisonError::into_inner).remove(entity_id);

        let key = self.durable_key(entity_id);
        if let Err(e) = inner.durable.remove(&key).await {
            tracing::warn!(key, error = %e, "failed to drop durable image cache entry");
        }
    }

    /// Drop both in-process tiers. Returns the number of entries removed.
    pub fn clear_memory(&self) -> usize {
        let inner = &self.inner;
        let mut removed = 0;
        for tier in [&inner.public, &inner.memory] {
            let mut tier = tier.write().unwrap_or_else(PoisonError::into_inner);
            removed += tier.len();
            tier.clear();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheDb, Error, ManualClock};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const T0: i64 = 1_700_000_000_000;

    #[derive(Default)]
    struct FakeStorage {
        public_base: Option<String>,
        fail_signing: AtomicBool,
        public_calls: AtomicUsize,
        signed_calls: AtomicUsize,
        last_ttl: Mutex<Option<Duration>>,
    }

    impl FakeStorage {
        fn private() -> Self {
            Self::default()
        }

        fn public(base: &str) -> Self {
            Self { public_base: Some(base.to_string()), ..Default::default() }
        }

        fn signed(&self) -> usize {
            self.signed_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ObjectStorage for FakeStorage {
        fn public_url(&self, resource_path: &str) -> Option<String> {
            self.public_calls.fetch_add(1, Ordering::SeqCst);
            self.public_base.as_ref().map(|base| format!("{base}/{resource_path}"))
        }

        async fn issue_signed_url(&self, resource_path: &str, ttl: Duration) -> Result<String, Error> {
            let n = self.signed_calls.fetch_add(1, Ordering::SeqCst) + 1;
            *self.last_ttl.lock().unwrap() = Some(ttl);
            if self.fail_signing.load(Ordering::SeqCst) {
                return Err(Error::Remote("storage unavailable".into()));
            }
            Ok(format!("https://storage.test/sign/{resource_path}?token=t{n}"))
        }
    }

    #[derive(Default)]
    struct MemoryDurable {
        values: Mutex<HashMap<String, String>>,
        fail_writes: bool,
    }

    #[async_trait::async_trait]
    impl DurableStore for MemoryDurable {
        async fn get(&self, key: &str) -> Result<Option<String>, Error> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
            if self.fail_writes {
                return Err(Error::InvalidInput("quota exceeded".into()));
            }
            self.values.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<(), Error> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct Fixture {
        storage: Arc<FakeStorage>,
        durable: Arc<MemoryDurable>,
        clock: Arc<ManualClock>,
        cache: ImageUrlCache,
    }

    fn fixture(storage: FakeStorage, durable: MemoryDurable, config: ImageCacheConfig) -> Fixture {
        let storage = Arc::new(storage);
        let durable = Arc::new(durable);
        let clock = Arc::new(ManualClock::new(T0));
        let cache = ImageUrlCache::with_clock(storage.clone(), durable.clone(), config, clock.clone());
        Fixture { storage, durable, clock, cache }
    }

    fn private_fixture() -> Fixture {
        fixture(FakeStorage::private(), MemoryDurable::default(), ImageCacheConfig::default())
    }

    fn seed(durable: &MemoryDurable, key: &str, raw: &str) {
        durable.values.lock().unwrap().insert(key.to_string(), raw.to_string());
    }

    #[tokio::test]
    async fn test_public_url_skips_signing() {
        let f = fixture(FakeStorage::public("https://cdn.test"), MemoryDurable::default(), ImageCacheConfig::default());

        let resolved = f.cache.resolve("uploads/a.png", "p1", None).await.unwrap();

        assert_eq!(resolved.source, UrlSource::Public);
        assert_eq!(resolved.url, "https://cdn.test/uploads/a.png");
        assert_eq!(f.storage.signed(), 0);
    }

    #[tokio::test]
    async fn test_public_url_is_memoized_for_an_hour() {
        let f = fixture(FakeStorage::public("https://cdn.test"), MemoryDurable::default(), ImageCacheConfig::default());

        f.cache.resolve("uploads/a.png", "p1", None).await.unwrap();
        f.clock.advance_ms(59 * 60 * 1000);
        f.cache.resolve("uploads/a.png", "p1", None).await.unwrap();
        assert_eq!(f.storage.public_calls.load(Ordering::SeqCst), 1);

        f.clock.advance_ms(60 * 1000);
        f.cache.resolve("uploads/a.png", "p1", None).await.unwrap();
        assert_eq!(f.storage.public_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_public_urls_disabled_uses_signed_path() {
        let config = ImageCacheConfig { prefer_public_urls: false, ..Default::default() };
        let f = fixture(FakeStorage::public("https://cdn.test"), MemoryDurable::default(), config);

        let resolved = f.cache.resolve("uploads/a.png", "p1", None).await.unwrap();
        assert_eq!(resolved.source, UrlSource::Signed);
        assert_eq!(f.storage.public_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_call_served_from_memory() {
        let f = private_fixture();

        let first = f.cache.resolve("uploads/a.png", "p2", Some(1)).await.unwrap();
        let second = f.cache.resolve("uploads/a.png", "p2", Some(1)).await.unwrap();

        assert_eq!(first.source, UrlSource::Signed);
        assert_eq!(second.source, UrlSource::Memory);
        assert_eq!(first.url, second.url);
        assert_eq!(f.storage.signed(), 1);
    }

    #[tokio::test]
    async fn test_signed_ttl_is_independent_of_local_expiry() {
        let f = private_fixture();
        f.cache.get_cached_image_url("uploads/a.png", "p2", Some(1)).await.unwrap();

        assert_eq!(*f.storage.last_ttl.lock().unwrap(), Some(Duration::from_secs(86_400)));
        let stored = CacheEntry::from_json(&f.durable.values.lock().unwrap()["pet_image_p2"]).unwrap();
        assert_eq!(stored.expires_at_ms, T0 + MS_PER_HOUR);
    }

    #[tokio::test]
    async fn test_local_expiry_never_outlives_token() {
        let f = private_fixture();
        let first = f.cache.resolve("uploads/a.png", "p2", Some(48)).await.unwrap();
        assert_eq!(first.source, UrlSource::Signed);

        let stored = CacheEntry::from_json(&f.durable.values.lock().unwrap()["pet_image_p2"]).unwrap();
        assert_eq!(stored.expires_at_ms, T0 + 24 * MS_PER_HOUR);

        f.clock.set(T0 + 24 * MS_PER_HOUR - 1);
        let before = f.cache.resolve("uploads/a.png", "p2", Some(48)).await.unwrap();
        assert_eq!(before.source, UrlSource::Memory);

        f.clock.set(T0 + 30 * MS_PER_HOUR);
        let later = f.cache.resolve("uploads/a.png", "p2", Some(48)).await.unwrap();
        assert_eq!(later.source, UrlSource::Signed);
        assert_eq!(f.storage.signed(), 2);
    }

    #[tokio::test]
    async fn test_memory_entry_expires_at_boundary() {
        let f = private_fixture();
        f.cache.resolve("uploads/a.png", "p2", Some(1)).await.unwrap();

        f.clock.set(T0 + MS_PER_HOUR - 1);
        let before = f.cache.resolve("uploads/a.png", "p2", Some(1)).await.unwrap();
        assert_eq!(before.source, UrlSource::Memory);

        f.clock.set(T0 + MS_PER_HOUR);
        let after = f.cache.resolve("uploads/a.png", "p2", Some(1)).await.unwrap();
        assert_eq!(after.source, UrlSource::Signed);
        assert_eq!(f.storage.signed(), 2);
    }

    #[tokio::test]
    async fn test_durable_entry_just_valid_is_served_without_network() {
        let f = private_fixture();
        seed(&f.durable, "pet_image_p3", &format!(r#"{{"url":"https://old/p3","expires":{}}}"#, T0 + 1));

        let resolved = f.cache.resolve("uploads/p3.png", "p3", None).await.unwrap();

        assert_eq!(resolved, ResolvedUrl { url: "https://old/p3".into(), source: UrlSource::Durable });
        assert_eq!(f.storage.signed(), 0);
    }

    #[tokio::test]
    async fn test_durable_entry_just_expired_is_refetched() {
        let f = private_fixture();
        seed(&f.durable, "pet_image_p3", &format!(r#"{{"url":"https://old/p3","expires":{}}}"#, T0 - 1));

        let resolved = f.cache.resolve("uploads/p3.png", "p3", None).await.unwrap();

        assert_eq!(resolved.source, UrlSource::Signed);
        assert_ne!(resolved.url, "https://old/p3");
        assert_eq!(f.storage.signed(), 1);
    }

    #[tokio::test]
    async fn test_durable_hit_repopulates_memory() {
        let f = private_fixture();
        seed(&f.durable, "pet_image_p4", &format!(r#"{{"url":"https://old/p4","expires":{}}}"#, T0 + 60_000));

        f.cache.resolve("uploads/p4.png", "p4", None).await.unwrap();
        f.durable.values.lock().unwrap().clear();

        let resolved = f.cache.resolve("uploads/p4.png", "p4", None).await.unwrap();
        assert_eq!(resolved.source, UrlSource::Memory);
        assert_eq!(resolved.url, "https://old/p4");
    }

    #[tokio::test]
    async fn test_corrupt_durable_entry_falls_through_to_fetch() {
        let f = private_fixture();
        seed(&f.durable, "pet_image_p5", "definitely not json");

        let resolved = f.cache.resolve("uploads/p5.png", "p5", None).await.unwrap();

        assert_eq!(resolved.source, UrlSource::Signed);
        let repaired = f.durable.values.lock().unwrap()["pet_image_p5"].clone();
        assert_eq!(CacheEntry::from_json(&repaired).unwrap().url, resolved.url);
    }

    #[tokio::test]
    async fn test_signing_failure_returns_none_and_caches_nothing() {
        let f = private_fixture();
        f.storage.fail_signing.store(true, Ordering::SeqCst);

        assert!(f.cache.get_cached_image_url("uploads/p6.png", "p6", None).await.is_none());
        assert!(f.durable.values.lock().unwrap().is_empty());

        f.storage.fail_signing.store(false, Ordering::SeqCst);
        let resolved = f.cache.resolve("uploads/p6.png", "p6", None).await.unwrap();
        assert_eq!(resolved.source, UrlSource::Signed);
        assert_eq!(f.storage.signed(), 2);
    }

    #[tokio::test]
    async fn test_durable_write_failure_still_returns_url() {
        let durable = MemoryDurable { fail_writes: true, ..Default::default() };
        let f = fixture(FakeStorage::private(), durable, ImageCacheConfig::default());

        let first = f.cache.resolve("uploads/p7.png", "p7", None).await.unwrap();
        let second = f.cache.resolve("uploads/p7.png", "p7", None).await.unwrap();

        assert_eq!(first.source, UrlSource::Signed);
        assert_eq!(second.source, UrlSource::Memory);
    }

    #[tokio::test]
    async fn test_missing_path_or_id_is_unavailable() {
        let f = private_fixture();
        assert!(f.cache.resolve("", "p8", None).await.is_none());
        assert!(f.cache.resolve("uploads/p8.png", "", None).await.is_none());
        assert_eq!(f.storage.signed(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_clears_every_tier() {
        let f = private_fixture();
        f.cache.resolve("uploads/p9.png", "p9", None).await.unwrap();

        f.cache.invalidate("p9").await;
        assert!(f.durable.values.lock().unwrap().is_empty());

        let resolved = f.cache.resolve("uploads/p9.png", "p9", None).await.unwrap();
        assert_eq!(resolved.source, UrlSource::Signed);
        assert_eq!(f.storage.signed(), 2);
    }

    #[tokio::test]
    async fn test_clear_memory_keeps_durable() {
        let f = private_fixture();
        f.cache.resolve("uploads/a.png", "a", None).await.unwrap();
        f.cache.resolve("uploads/b.png", "b", None).await.unwrap();

        assert_eq!(f.cache.clear_memory(), 2);
        let resolved = f.cache.resolve("uploads/a.png", "a", None).await.unwrap();
        assert_eq!(resolved.source, UrlSource::Durable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_batches_and_warms_cache() {
        let f = private_fixture();
        let mut items: Vec<ImageRef> =
            (0..11).map(|i| ImageRef::new(format!("uploads/{i}.png"), format!("pet-{i}"))).collect();
        items.push(ImageRef::new("", "no-path"));

        let started = tokio::time::Instant::now();
        let report = f.cache.prefetch_image_urls(&items).await;

        assert_eq!(report, PrefetchReport { requested: 12, resolved: 11, unavailable: 0, skipped: 1 });
        assert!(started.elapsed() >= Duration::from_millis(200));

        let resolved = f.cache.resolve("uploads/7.png", "pet-7", None).await.unwrap();
        assert_eq!(resolved.source, UrlSource::Memory);
        assert_eq!(f.storage.signed(), 11);
    }

    #[tokio::test]
    async fn test_spawn_prefetch_reports_unavailable() {
        let f = private_fixture();
        f.storage.fail_signing.store(true, Ordering::SeqCst);

        let report = f
            .cache
            .spawn_prefetch(vec![ImageRef::new("uploads/x.png", "x")])
            .await
            .unwrap();

        assert_eq!(report.unavailable, 1);
        assert_eq!(report.resolved, 0);
    }

    #[tokio::test]
    async fn test_sqlite_tier_survives_new_cache_instance() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let storage = Arc::new(FakeStorage::private());

        let first = ImageUrlCache::new(storage.clone(), db.clone(), ImageCacheConfig::default());
        let url = first.get_cached_image_url("uploads/r.png", "r", None).await.unwrap();

        let reloaded = ImageUrlCache::new(storage.clone(), db.clone(), ImageCacheConfig::default());
        let resolved = reloaded.resolve("uploads/r.png", "r", None).await.unwrap();

        assert_eq!(resolved, ResolvedUrl { url, source: UrlSource::Durable });
        assert_eq!(storage.signed(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_corrupt_entry_is_a_miss() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        db.set("pet_image_c", "{\"url\":").await.unwrap();
        let cache = ImageUrlCache::new(Arc::new(FakeStorage::private()), db.clone(), ImageCacheConfig::default());

        let resolved = cache.resolve("uploads/c.png", "c", None).await.unwrap();
        assert_eq!(resolved.source, UrlSource::Signed);
    }
}
