//! Cache-first offline support for the site's static assets.
//!
//! One named bucket per cache version. `install` precaches the manifest,
//! `activate` drops buckets from older versions, and `fetch` answers from the
//! cache before touching the network. Bumping the version is the only way to
//! invalidate cached assets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use thiserror::Error;

pub const CACHE_NAME: &str = "austen-academy-v2.0.0";

pub const PRECACHE_URLS: [&str; 9] = [
    "/",
    "/index.html",
    "/styles.css",
    "/script.js",
    "/Logo.jpeg",
    "/Austen Academy Students in Kénitra.png",
    "/manifest.json",
    "https://fonts.googleapis.com/css2?family=Montserrat:wght@300;400;500;600;700&display=swap",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
];

/// Served when a page navigation fails offline.
pub const OFFLINE_FALLBACK: &str = "/index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A navigable page load.
    Document,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub url: String,
    pub destination: Destination,
}

impl AssetRequest {
    pub fn document(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: Destination::Document,
        }
    }

    pub fn asset(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: Destination::Other,
        }
    }
}

/// Where a response came from, as seen by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Same origin.
    Basic,
    Cors,
    Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub kind: ResponseType,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl AssetResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only complete same-origin answers are worth keeping.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseType::Basic
    }
}

#[derive(Debug, Error)]
#[error("network request for {url} failed: {reason}")]
pub struct NetworkError {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("precache of {url} failed: {reason}")]
    Precache { url: String, reason: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("offline and no cached fallback for {0}")]
    NoFallback(String),

    #[error("cache storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError>;
}

/// Named buckets of url → response.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Store every entry or none.
    async fn put_all(&self, bucket: &str, entries: Vec<(String, AssetResponse)>) -> Result<(), CacheError>;

    async fn put(&self, bucket: &str, url: &str, response: AssetResponse) -> Result<(), CacheError>;

    /// First match across all buckets, oldest bucket first.
    async fn lookup(&self, url: &str) -> Result<Option<AssetResponse>, CacheError>;

    async fn bucket_names(&self) -> Result<Vec<String>, CacheError>;

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCacheStorage {
    // Vec keeps creation order for lookup.
    buckets: RwLock<Vec<(String, HashMap<String, AssetResponse>)>>,
}

impl InMemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of entries in `bucket`, if it exists.
    pub fn bucket_len(&self, bucket: &str) -> Option<usize> {
        let buckets = self.buckets.read().ok()?;
        buckets.iter().find(|(name, _)| name == bucket).map(|(_, b)| b.len())
    }
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Storage("cache lock poisoned".to_string())
}

fn bucket_mut<'a>(
    buckets: &'a mut Vec<(String, HashMap<String, AssetResponse>)>,
    name: &str,
) -> &'a mut HashMap<String, AssetResponse> {
    let idx = match buckets.iter().position(|(n, _)| n == name) {
        Some(idx) => idx,
        None => {
            buckets.push((name.to_string(), HashMap::new()));
            buckets.len() - 1
        }
    };
    &mut buckets[idx].1
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn put_all(&self, bucket: &str, entries: Vec<(String, AssetResponse)>) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().map_err(poisoned)?;
        bucket_mut(&mut buckets, bucket).extend(entries);
        Ok(())
    }

    async fn put(&self, bucket: &str, url: &str, response: AssetResponse) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().map_err(poisoned)?;
        bucket_mut(&mut buckets, bucket).insert(url.to_string(), response);
        Ok(())
    }

    async fn lookup(&self, url: &str) -> Result<Option<AssetResponse>, CacheError> {
        let buckets = self.buckets.read().map_err(poisoned)?;
        Ok(buckets.iter().find_map(|(_, b)| b.get(url).cloned()))
    }

    async fn bucket_names(&self) -> Result<Vec<String>, CacheError> {
        let buckets = self.buckets.read().map_err(poisoned)?;
        Ok(buckets.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        let mut buckets = self.buckets.write().map_err(poisoned)?;
        let before = buckets.len();
        buckets.retain(|(name, _)| name != bucket);
        Ok(buckets.len() != before)
    }
}

/// Lifecycle flags, observable for tests and diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub installed: bool,
    pub skip_waiting: bool,
    pub activated: bool,
    pub clients_claimed: bool,
}

pub struct OfflineCache {
    version: String,
    manifest: Vec<String>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    lifecycle: Mutex<Lifecycle>,
}

impl core::fmt::Debug for OfflineCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OfflineCache")
            .field("version", &self.version)
            .field("manifest", &self.manifest.len())
            .finish_non_exhaustive()
    }
}

impl OfflineCache {
    pub fn new(
        version: impl Into<String>,
        manifest: impl IntoIterator<Item = impl Into<String>>,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            version: version.into(),
            manifest: manifest.into_iter().map(Into::into).collect(),
            storage,
            network,
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// The site's current bucket and manifest.
    pub fn for_site(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self::new(CACHE_NAME, PRECACHE_URLS, storage, network)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.lock().map(|l| *l).unwrap_or_default()
    }

    fn update_lifecycle(&self, f: impl FnOnce(&mut Lifecycle)) {
        if let Ok(mut l) = self.lifecycle.lock() {
            f(&mut l);
        }
    }

    /// Precache the manifest. Any failure leaves the bucket untouched.
    pub async fn install(&self) -> Result<(), CacheError> {
        tracing::debug!(version = %self.version, "installing offline cache");

        let mut entries = Vec::with_capacity(self.manifest.len());
        for url in &self.manifest {
            let response = self
                .network
                .fetch(&AssetRequest::asset(url.clone()))
                .await
                .map_err(|e| CacheError::Precache {
                    url: url.clone(),
                    reason: e.reason,
                })?;
            if !response.is_ok() {
                return Err(CacheError::Precache {
                    url: url.clone(),
                    reason: format!("status {}", response.status),
                });
            }
            entries.push((url.clone(), response));
        }

        self.storage.put_all(&self.version, entries).await?;
        self.update_lifecycle(|l| {
            l.installed = true;
            l.skip_waiting = true;
        });
        Ok(())
    }

    /// Delete every bucket but the current one and take control of open pages.
    /// Returns the deleted bucket names.
    pub async fn activate(&self) -> Result<Vec<String>, CacheError> {
        let mut deleted = Vec::new();
        for name in self.storage.bucket_names().await? {
            if name != self.version && self.storage.delete_bucket(&name).await? {
                tracing::debug!(bucket = %name, "deleted stale cache bucket");
                deleted.push(name);
            }
        }
        self.update_lifecycle(|l| {
            l.activated = true;
            l.clients_claimed = true;
        });
        Ok(deleted)
    }

    /// Cache first, then network; pages fall back to the cached index offline.
    pub async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, CacheError> {
        if let Some(hit) = self.storage.lookup(&request.url).await? {
            tracing::debug!(url = %request.url, "serving from cache");
            return Ok(hit);
        }

        tracing::debug!(url = %request.url, "fetching from network");
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    if let Err(e) = self.storage.put(&self.version, &request.url, response.clone()).await {
                        tracing::warn!(url = %request.url, error = %e, "failed to cache response");
                    }
                }
                Ok(response)
            }
            Err(e) if request.destination == Destination::Document => {
                tracing::debug!(url = %request.url, error = %e, "offline navigation, trying fallback page");
                self.storage
                    .lookup(OFFLINE_FALLBACK)
                    .await?
                    .ok_or_else(|| CacheError::NoFallback(request.url.clone()))
            }
            Err(e) => Err(CacheError::Network(e)),
        }
    }
}

/// `Network` over reqwest. Relative URLs resolve against `origin`, and
/// responses from `origin` count as same-origin.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
    origin: String,
}

impl HttpNetwork {
    pub fn new(client: reqwest::Client, origin: impl Into<String>) -> Self {
        Self {
            client,
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.origin, url)
        } else {
            url.to_string()
        }
    }

    /// Scheme, host and port all match. Unparseable URLs never do.
    fn is_same_origin(&self, url: &str) -> bool {
        match (reqwest::Url::parse(&self.origin), reqwest::Url::parse(url)) {
            (Ok(site), Ok(target)) => site.origin() == target.origin(),
            _ => false,
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
        let url = self.absolute(&request.url);
        let failed = |e: reqwest::Error| NetworkError {
            url: request.url.clone(),
            reason: e.to_string(),
        };

        let res = self.client.get(&url).send().await.map_err(failed)?;
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res.bytes().await.map_err(failed)?.to_vec();
        let kind = if self.is_same_origin(&url) {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        };

        Ok(AssetResponse {
            status,
            kind,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    /// Serves `body = url` for every request, counting calls.
    #[derive(Default)]
    struct FakeNetwork {
        calls: AtomicUsize,
        offline: AtomicBool,
        failing: Mutex<HashSet<String>>,
        cross_origin: Mutex<HashSet<String>>,
    }

    impl FakeNetwork {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Network for FakeNetwork {
        async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(NetworkError {
                    url: request.url.clone(),
                    reason: "offline".to_string(),
                });
            }
            let status = if self.failing.lock().unwrap().contains(&request.url) { 404 } else { 200 };
            let kind = if self.cross_origin.lock().unwrap().contains(&request.url) {
                ResponseType::Cors
            } else {
                ResponseType::Basic
            };
            Ok(AssetResponse {
                status,
                kind,
                content_type: None,
                body: request.url.as_bytes().to_vec(),
            })
        }
    }

    fn setup() -> (Arc<InMemoryCacheStorage>, Arc<FakeNetwork>) {
        (InMemoryCacheStorage::arc(), Arc::new(FakeNetwork::default()))
    }

    #[tokio::test]
    async fn install_precaches_the_whole_manifest() {
        let (storage, network) = setup();
        let cache = OfflineCache::for_site(storage.clone(), network.clone());

        cache.install().await.unwrap();

        assert_eq!(storage.bucket_len(CACHE_NAME), Some(PRECACHE_URLS.len()));
        assert_eq!(network.calls(), PRECACHE_URLS.len());
        let lc = cache.lifecycle();
        assert!(lc.installed && lc.skip_waiting);
        assert!(!lc.activated);
    }

    #[tokio::test]
    async fn install_is_all_or_nothing() {
        let (storage, network) = setup();
        network.failing.lock().unwrap().insert("/styles.css".to_string());
        let cache = OfflineCache::for_site(storage.clone(), network.clone());

        let err = cache.install().await.unwrap_err();

        assert!(matches!(err, CacheError::Precache { ref url, .. } if url == "/styles.css"));
        assert_eq!(storage.bucket_len(CACHE_NAME), None);
        assert!(!cache.lifecycle().installed);
    }

    #[tokio::test]
    async fn cached_assets_never_touch_the_network() {
        let (storage, network) = setup();
        let cache = OfflineCache::for_site(storage.clone(), network.clone());
        cache.install().await.unwrap();
        cache.activate().await.unwrap();
        let after_install = network.calls();

        for _ in 0..3 {
            let res = cache.fetch(&AssetRequest::asset("/styles.css")).await.unwrap();
            assert_eq!(res.body, b"/styles.css");
        }
        assert_eq!(network.calls(), after_install);
    }

    #[tokio::test]
    async fn only_same_origin_200s_are_stored() {
        let (storage, network) = setup();
        network.cross_origin.lock().unwrap().insert("https://cdn.example/x.js".to_string());
        network.failing.lock().unwrap().insert("/missing.png".to_string());
        let cache = OfflineCache::new("v1", Vec::<String>::new(), storage.clone(), network.clone());

        cache.fetch(&AssetRequest::asset("/new.png")).await.unwrap();
        let res = cache.fetch(&AssetRequest::asset("https://cdn.example/x.js")).await.unwrap();
        assert_eq!(res.kind, ResponseType::Cors);
        let res = cache.fetch(&AssetRequest::asset("/missing.png")).await.unwrap();
        assert_eq!(res.status, 404);

        assert_eq!(storage.bucket_len("v1"), Some(1));
        assert!(storage.lookup("/new.png").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn offline_navigation_falls_back_to_the_index() {
        let (storage, network) = setup();
        let cache = OfflineCache::for_site(storage.clone(), network.clone());
        cache.install().await.unwrap();
        network.go_offline();

        let page = cache.fetch(&AssetRequest::document("/formations")).await.unwrap();
        assert_eq!(page.body, b"/index.html");

        let err = cache.fetch(&AssetRequest::asset("/uncached.png")).await.unwrap_err();
        assert!(matches!(err, CacheError::Network(_)));
    }

    #[tokio::test]
    async fn offline_navigation_without_index_is_an_error() {
        let (storage, network) = setup();
        network.go_offline();
        let cache = OfflineCache::new("v1", Vec::<String>::new(), storage, network);

        let err = cache.fetch(&AssetRequest::document("/")).await.unwrap_err();
        assert!(matches!(err, CacheError::NoFallback(ref u) if u == "/"));
    }

    #[tokio::test]
    async fn version_bump_replaces_the_old_bucket() {
        let (storage, network) = setup();
        let v1 = OfflineCache::new("site-v1", ["/index.html"], storage.clone(), network.clone());
        v1.install().await.unwrap();
        v1.activate().await.unwrap();
        v1.fetch(&AssetRequest::asset("/photo.png")).await.unwrap();
        assert_eq!(storage.bucket_len("site-v1"), Some(2));

        let v2 = OfflineCache::new("site-v2", ["/index.html"], storage.clone(), network.clone());
        v2.install().await.unwrap();
        let deleted = v2.activate().await.unwrap();
        assert_eq!(deleted, vec!["site-v1".to_string()]);
        assert_eq!(storage.bucket_names().await.unwrap(), vec!["site-v2".to_string()]);
        assert!(v2.lifecycle().clients_claimed);

        // First fetch after the bump goes to the network and repopulates.
        let before = network.calls();
        v2.fetch(&AssetRequest::asset("/photo.png")).await.unwrap();
        assert_eq!(network.calls(), before + 1);
        assert_eq!(storage.bucket_len("site-v2"), Some(2));

        v2.fetch(&AssetRequest::asset("/photo.png")).await.unwrap();
        assert_eq!(network.calls(), before + 1);
    }

    #[test]
    fn relative_urls_resolve_against_the_origin() {
        let net = HttpNetwork::new(reqwest::Client::new(), "https://austenacademymaroc.com/");
        assert_eq!(net.absolute("/styles.css"), "https://austenacademymaroc.com/styles.css");
        assert_eq!(net.absolute(PRECACHE_URLS[8]), PRECACHE_URLS[8]);
    }

    #[test]
    fn lookalike_hosts_are_not_same_origin() {
        let net = HttpNetwork::new(reqwest::Client::new(), "https://austenacademymaroc.com");
        assert!(net.is_same_origin(&net.absolute("/index.html")));
        assert!(net.is_same_origin("https://austenacademymaroc.com:443/Logo.jpeg"));
        assert!(!net.is_same_origin("https://austenacademymaroc.com.evil.example/x"));
        assert!(!net.is_same_origin("http://austenacademymaroc.com/index.html"));
        assert!(!net.is_same_origin(PRECACHE_URLS[7]));
        assert!(!net.is_same_origin("not a url"));
    }
}
