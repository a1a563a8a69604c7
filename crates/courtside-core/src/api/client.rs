//! Cached, deduplicating API client for the club backend.
//!
//! `FetchClient` is the single entry point every screen uses to read from or
//! write to the backend. Reads go through an in-memory cache with
//! stale-while-revalidate semantics, concurrent reads of the same URL share
//! one network request, and transient failures are retried with a fixed
//! backoff. Mutations bypass the cache and invalidate the entries of the
//! endpoint they target.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::cache::{cache_key, Clock, Freshness, ResponseCache, SystemClock};
use crate::config::Config;
use crate::models::{CompletedEvent, EventResult, Registration, UpcomingEvent};

use super::FetchError;

// ============================================================================
// Endpoints
// ============================================================================

const COMPLETED_EVENTS: &str = "/completed-events/";
const UPCOMING_EVENTS: &str = "/events/?upcoming=true";
const EVENTS: &str = "/events/";
const EVENT_RESULTS: &str = "/event-results/";
const REGISTRATIONS: &str = "/registrations/";

/// Outcome of one network fetch, shared by every caller coalesced onto it.
type FetchOutcome = Result<Arc<Value>, FetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Per-request overrides for reads.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Extra headers; these replace the defaults of the same name.
    pub headers: HeaderMap,
    /// When false, skip the cache lookup. The result is only cached if a
    /// caller sharing the same request reads through the cache.
    pub use_cache: bool,
    /// Retry budget override; `None` uses `Config::max_retries`.
    pub retries: Option<u32>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            headers: HeaderMap::new(),
            use_cache: true,
            retries: None,
        }
    }
}

impl RequestOptions {
    pub fn uncached() -> Self {
        Self {
            use_cache: false,
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Request body for a mutating call.
#[derive(Debug)]
pub enum MutationBody {
    Empty,
    Json(Value),
    Form(Form),
}

/// Upcoming and completed listings fetched together for the home page.
#[derive(Debug, Clone, Default)]
pub struct AllEvents {
    pub upcoming: Vec<UpcomingEvent>,
    pub completed: Vec<CompletedEvent>,
}

/// A registered network fetch that later callers for the same key can join.
struct InFlight {
    id: u64,
    fetch: SharedFetch,
    /// Write the result to the cache. Set if any caller sharing the fetch
    /// reads through the cache.
    store: bool,
}

#[derive(Default)]
struct ClientState {
    cache: ResponseCache,
    in_flight: HashMap<String, InFlight>,
    next_fetch_id: u64,
}

impl ClientState {
    /// Remove the registry entry for `key` if it still belongs to fetch `id`.
    fn take_in_flight(&mut self, key: &str, id: u64) -> Option<InFlight> {
        if self.in_flight.get(key).is_some_and(|entry| entry.id == id) {
            self.in_flight.remove(key)
        } else {
            None
        }
    }

    /// Unregister every fetch whose key contains `url`. Detached fetches
    /// still answer their current callers but are never joined again and
    /// never write the cache.
    fn detach_in_flight(&mut self, url: &str) -> usize {
        let before = self.in_flight.len();
        self.in_flight.retain(|key, _| !key.contains(url));
        before - self.in_flight.len()
    }
}

/// Everything a spawned fetch task needs, prepared under the state lock.
struct FetchTask {
    id: u64,
    key: String,
    url: String,
    headers: HeaderMap,
    retries: u32,
    generation: u64,
    background: bool,
    tx: oneshot::Sender<FetchOutcome>,
}

struct Inner {
    http: Client,
    config: Config,
    clock: Arc<dyn Clock>,
    state: Mutex<ClientState>,
}

/// API client for the club backend.
/// Clone is cheap - all clones share one cache, registry and connection pool.
#[derive(Clone)]
pub struct FetchClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("base_url", &self.inner.config.base_url)
            .field("clock", &self.inner.clock)
            .finish_non_exhaustive()
    }
}

/// Removes a fetch from the in-flight registry when its task ends, whether
/// it finished, panicked, or was dropped before it ever ran.
struct InFlightGuard {
    client: FetchClient,
    key: String,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.client.state().take_in_flight(&self.key, self.id);
    }
}

impl FetchClient {
    /// Create a client using the wall clock.
    pub fn new(config: Config) -> Result<Self, FetchError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a client with an explicit clock for cache ages.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                clock,
                state: Mutex::new(ClientState::default()),
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Absolute URL for an endpoint. Anything starting with `http` is used as-is.
    pub fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http") {
            return endpoint.to_string();
        }
        let base = self.inner.config.base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Reads =====

    /// Read and decode a JSON resource through the cache.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        self.get_with(endpoint, RequestOptions::default()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, FetchError> {
        let value = self.get_json_with(endpoint, options).await?;
        decode(&value)
    }

    /// Read a JSON resource without decoding it.
    pub async fn get_json(&self, endpoint: &str) -> Result<Arc<Value>, FetchError> {
        self.get_json_with(endpoint, RequestOptions::default()).await
    }

    pub async fn get_json_with(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Arc<Value>, FetchError> {
        let url = self.resolve_url(endpoint);
        let key = cache_key(&Method::GET, &url);

        let (fetch, task) = {
            let mut state = self.state();

            if options.use_cache {
                let now = self.inner.clock.now();
                if let Some(hit) = state.cache.lookup(&key, now, self.inner.config.cache_ttl()) {
                    if hit.freshness == Freshness::Fresh {
                        debug!(key = %key, "Cache hit");
                        return Ok(hit.data);
                    }
                    let refreshing = match state.in_flight.get_mut(&key) {
                        Some(entry) => {
                            entry.store = true;
                            true
                        }
                        None => false,
                    };
                    let refresh = if refreshing {
                        debug!(key = %key, "Serving stale entry, refresh already in flight");
                        None
                    } else {
                        debug!(key = %key, "Serving stale entry, refreshing in background");
                        let (_, task) =
                            self.register_fetch(&mut state, key, url, options.headers, 0, true, true);
                        Some(task)
                    };
                    drop(state);
                    if let Some(task) = refresh {
                        self.spawn_fetch(task);
                    }
                    return Ok(hit.data);
                }
            }

            let joined = state.in_flight.get_mut(&key).map(|entry| {
                entry.store |= options.use_cache;
                entry.fetch.clone()
            });
            match joined {
                Some(fetch) => {
                    debug!(key = %key, "Joining in-flight request");
                    (fetch, None)
                }
                None => {
                    let retries = options.retries.unwrap_or(self.inner.config.max_retries);
                    let (fetch, task) = self.register_fetch(
                        &mut state,
                        key,
                        url,
                        options.headers,
                        retries,
                        options.use_cache,
                        false,
                    );
                    (fetch, Some(task))
                }
            }
        };

        if let Some(task) = task {
            self.spawn_fetch(task);
        }
        fetch.await
    }

    /// Register a fetch for `key` so later callers can join it.
    ///
    /// Must be called with the state lock held and no fetch registered for
    /// `key`. The returned task must be handed to `spawn_fetch` once the lock
    /// is released.
    #[allow(clippy::too_many_arguments)]
    fn register_fetch(
        &self,
        state: &mut ClientState,
        key: String,
        url: String,
        headers: HeaderMap,
        retries: u32,
        store: bool,
        background: bool,
    ) -> (SharedFetch, FetchTask) {
        let id = state.next_fetch_id;
        state.next_fetch_id += 1;

        let (tx, rx) = oneshot::channel();
        let fetch = async move {
            rx.await.unwrap_or_else(|_| {
                Err(FetchError::Aborted("fetch task ended without a result".to_string()))
            })
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            key.clone(),
            InFlight {
                id,
                fetch: fetch.clone(),
                store,
            },
        );

        let task = FetchTask {
            id,
            key,
            url,
            headers,
            retries,
            generation: state.cache.generation(),
            background,
            tx,
        };
        (fetch, task)
    }

    /// Run a registered fetch on its own task.
    ///
    /// The task owns the cache write and the registry removal, so a caller
    /// dropping its future does not affect anyone else.
    fn spawn_fetch(&self, task: FetchTask) {
        let guard = InFlightGuard {
            client: self.clone(),
            key: task.key.clone(),
            id: task.id,
        };
        let client = self.clone();

        tokio::spawn(async move {
            let result = client.fetch_with_retry(&task.url, &task.headers, task.retries).await;

            {
                let mut state = client.state();
                let entry = state.take_in_flight(&task.key, task.id);
                if let (Ok(data), Some(entry)) = (&result, entry) {
                    if entry.store {
                        let now = client.inner.clock.now();
                        state
                            .cache
                            .insert_if_current(task.key, Arc::clone(data), now, task.generation);
                    }
                }
            }

            if let Err(e) = &result {
                if task.background {
                    warn!(url = %task.url, error = %e, "Background refresh failed, keeping stale entry");
                }
            }
            // Callers may have gone away.
            let _ = task.tx.send(result);
            drop(guard);
        });
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        headers: &HeaderMap,
        retries: u32,
    ) -> FetchOutcome {
        let backoff = self.inner.config.retry_backoff();
        let mut remaining = retries;

        loop {
            match self.send(Method::GET, url, headers, MutationBody::Empty).await {
                Ok(value) => return Ok(Arc::new(value)),
                Err(e) if e.is_transient() && remaining > 0 => {
                    remaining -= 1;
                    warn!(
                        url = url,
                        error = %e,
                        retries_left = remaining,
                        backoff_ms = backoff.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    debug!(url = url, error = %e, "Request failed");
                    return Err(e);
                }
            }
        }
    }

    /// Issue a single request and parse its JSON body.
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: MutationBody,
    ) -> Result<Value, FetchError> {
        let mut request = self
            .inner
            .http
            .request(method.clone(), url)
            .header(header::ACCEPT, "application/json");

        request = match body {
            MutationBody::Empty => request,
            MutationBody::Json(json) => request.json(&json),
            MutationBody::Form(form) => request.multipart(form),
        };
        let request = request.headers(headers.clone());

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let elapsed = started.elapsed();
        if elapsed > self.inner.config.slow_request_threshold() {
            warn!(
                method = %method,
                url = url,
                elapsed_ms = elapsed.as_millis() as u64,
                "Slow API request"
            );
        }

        if !status.is_success() {
            return Err(FetchError::from_status(status, &text));
        }
        parse_body(&text)
    }

    // ===== Mutations =====

    /// Issue a mutating call. Never cached, never retried, never coalesced.
    ///
    /// Every cache entry whose key contains the target URL is dropped before
    /// the request is sent and again once it succeeds.
    pub async fn mutate<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: MutationBody,
    ) -> Result<T, FetchError> {
        let url = self.resolve_url(endpoint);
        self.invalidate_url(&url);

        let headers = self.auth_headers()?;
        let value = self.send(method, &url, &headers, body).await?;

        self.invalidate_url(&url);
        decode(&value)
    }

    pub async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<T, FetchError> {
        self.mutate(endpoint, Method::POST, MutationBody::Json(body)).await
    }

    pub async fn post_form<T: DeserializeOwned>(&self, endpoint: &str, form: Form) -> Result<T, FetchError> {
        self.mutate(endpoint, Method::POST, MutationBody::Form(form)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<T, FetchError> {
        self.mutate(endpoint, Method::PUT, MutationBody::Json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FetchError> {
        self.mutate(endpoint, Method::DELETE, MutationBody::Empty).await
    }

    fn auth_headers(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = self.inner.config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    // ===== Invalidation =====

    /// Drop cached entries for an endpoint (substring match on the resolved
    /// URL), or the whole cache when `endpoint` is `None`.
    ///
    /// Matching in-flight reads are detached as well, so the next read starts
    /// a new request instead of joining one that began before this call.
    pub fn invalidate(&self, endpoint: Option<&str>) {
        match endpoint {
            Some(endpoint) => {
                let url = self.resolve_url(endpoint);
                self.invalidate_url(&url);
            }
            None => {
                let mut state = self.state();
                state.cache.clear();
                state.in_flight.clear();
                debug!("Cache cleared");
            }
        }
    }

    fn invalidate_url(&self, url: &str) {
        let (removed, detached) = {
            let mut state = self.state();
            (state.cache.invalidate_matching(url), state.detach_in_flight(url))
        };
        debug!(url = url, removed = removed, detached = detached, "Invalidated cache entries");
    }

    pub fn cache_len(&self) -> usize {
        self.state().cache.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.state().in_flight.len()
    }

    // ===== Club data =====

    pub async fn fetch_completed_events(&self) -> Result<Vec<CompletedEvent>, FetchError> {
        self.get(COMPLETED_EVENTS).await
    }

    pub async fn fetch_completed_event(&self, id: i64) -> Result<CompletedEvent, FetchError> {
        self.get(&format!("{}{}/", COMPLETED_EVENTS, id)).await
    }

    pub async fn fetch_upcoming_events(&self) -> Result<Vec<UpcomingEvent>, FetchError> {
        self.get(UPCOMING_EVENTS).await
    }

    pub async fn fetch_events(&self) -> Result<Vec<UpcomingEvent>, FetchError> {
        self.get(EVENTS).await
    }

    pub async fn fetch_event_results(&self) -> Result<Vec<EventResult>, FetchError> {
        self.get(EVENT_RESULTS).await
    }

    pub async fn fetch_registrations(&self, event_id: Option<i64>) -> Result<Vec<Registration>, FetchError> {
        match event_id {
            Some(id) => self.get(&format!("{}?event_id={}", REGISTRATIONS, id)).await,
            None => self.get(REGISTRATIONS).await,
        }
    }

    /// Fetch upcoming and completed events in parallel.
    /// Either side falls back to an empty list if its request fails.
    pub async fn fetch_all_events(&self) -> AllEvents {
        let (upcoming, completed) =
            futures::join!(self.fetch_upcoming_events(), self.fetch_completed_events());

        AllEvents {
            upcoming: upcoming.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to fetch upcoming events");
                Vec::new()
            }),
            completed: completed.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to fetch completed events");
                Vec::new()
            }),
        }
    }

    pub async fn create_registration(&self, form: Form) -> Result<Value, FetchError> {
        self.post_form(REGISTRATIONS, form).await
    }

    pub async fn create_event_result(&self, form: Form) -> Result<EventResult, FetchError> {
        self.post_form(EVENT_RESULTS, form).await
    }
}

/// Empty bodies (e.g. `204 No Content`) parse as `null`.
fn parse_body(text: &str) -> Result<Value, FetchError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text)?)
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, FetchError> {
    T::deserialize(value).map_err(|e| FetchError::Parse(e.to_string()))
}
