//! The API client: ties transport, cache, and session together.
//!
//! Reads flow through [`ApiClient::run_query`], which consults the cache and
//! coalesces concurrent identical requests. Writes flow through
//! [`ApiClient::run_mutation`], which invalidates the declared tags on
//! confirmed success and re-runs every subscribed query they cover.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use parcelflow_core::ApiEnvelope;

use crate::cache::entry::EntryStatus;
use crate::cache::store::{CacheStore, FetchPlan, RefetchJob, Subscription};
use crate::cache::CacheSnapshot;
use crate::config::ClientConfig;
use crate::endpoint::{CacheKey, MutationEndpoint, QueryEndpoint};
use crate::error::{AuthError, ClientError, Result};
use crate::session::SessionStore;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Decoded result of a read endpoint: the envelope's `data` plus the total
/// row count for paginated lists.
#[derive(Debug, Clone)]
pub struct QueryData<D> {
    pub data: D,
    pub count: Option<u64>,
}

/// Shared client handle. Cheap to clone; all clones share the same cache,
/// session, and transport.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    cache: CacheStore,
    session: SessionStore,
}

impl ApiClient {
    /// Build a production client over HTTP.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        let session = SessionStore::new(config.session_file.clone());
        Self::new(Arc::new(HttpTransport::new(config)), session)
    }

    /// Build a client over an arbitrary transport. Used by tests to run the
    /// full stack against a scripted fake.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self {
            transport,
            cache: CacheStore::new(),
            session,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub const fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Run a read endpoint through the cache.
    ///
    /// Concurrent identical calls share one network request; a cached success
    /// is served without touching the network.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` on transport failure, `ClientError::Api`
    /// when the backend reports failure, and `ClientError::Auth` when the
    /// bearer token is rejected (the session is torn down first).
    #[instrument(skip_all, fields(endpoint = Q::NAME))]
    pub async fn run_query<Q: QueryEndpoint>(&self, args: &Q::Args) -> Result<QueryData<Q::Data>> {
        let path = Q::path(args);
        let key = CacheKey::new(Q::NAME, path.clone());
        let request = ApiRequest::get(path);

        loop {
            match self.cache.begin_fetch(&key, &request, Q::PROVIDES) {
                FetchPlan::Serve(snapshot) => {
                    let Some(payload) = snapshot.payload else {
                        return Err(ClientError::Api {
                            status: 0,
                            message: "cached entry has no payload".to_string(),
                        });
                    };
                    return decode_query(&payload);
                }
                FetchPlan::Fetch { seq } => return self.fetch_and_apply::<Q>(&key, &request, seq).await,
                FetchPlan::Join(mut done) => {
                    if done.wait_for(|landed| *landed).await.is_err() {
                        // The entry vanished mid-flight (cache cleared); replan.
                        continue;
                    }
                    match self.joined_result(&key) {
                        Some(outcome) => return outcome,
                        // Deferred refetch took over; join the new request.
                        None => continue,
                    }
                }
            }
        }
    }

    /// Run a write endpoint.
    ///
    /// On confirmed success the endpoint's tags are invalidated and every
    /// subscribed query providing one of them refetches exactly once. A
    /// failed write leaves the cache untouched and is never retried here.
    ///
    /// # Errors
    ///
    /// Same classification as [`ApiClient::run_query`]; additionally
    /// `ClientError::Decode` when the response does not match the endpoint's
    /// declared data shape.
    #[instrument(skip_all, fields(endpoint = M::NAME, verb = %M::VERB))]
    pub async fn run_mutation<M: MutationEndpoint>(
        &self,
        args: &M::Args,
    ) -> Result<ApiEnvelope<M::Data>> {
        let request = ApiRequest::write(M::VERB, M::path(args), M::body(args));
        let body = self.execute(&request).await?;

        // The server has confirmed the write at this point; invalidation must
        // happen even if the response body fails the typed decode below.
        debug!(tags = ?M::INVALIDATES, "mutation confirmed; invalidating");
        for job in self.cache.invalidate(M::INVALIDATES) {
            self.execute_refetch(job).await;
        }

        let envelope: ApiEnvelope<M::Data> = serde_json::from_value(body)?;
        Ok(envelope)
    }

    /// Subscribe to a read endpoint's cache entry.
    ///
    /// The handle observes every change to the entry (loading flips, fresh
    /// data after invalidation) until dropped; dropping the last handle lets
    /// the entry leave the cache.
    #[must_use]
    pub fn subscribe<Q: QueryEndpoint>(&self, args: &Q::Args) -> QueryHandle<Q::Data> {
        let path = Q::path(args);
        let key = CacheKey::new(Q::NAME, path.clone());
        let request = ApiRequest::get(path);
        QueryHandle {
            subscription: self.cache.subscribe(&key, &request, Q::PROVIDES),
            _marker: PhantomData,
        }
    }

    /// Send a request with the current bearer token and unwrap the response
    /// to its JSON body.
    ///
    /// A 401 on an authenticated request tears down the session and clears
    /// the cache before surfacing `AuthError::TokenRejected`.
    pub(crate) async fn execute(&self, request: &ApiRequest) -> Result<Value> {
        let bearer = self.session.bearer();
        let response = self
            .transport
            .send(request, bearer.as_ref())
            .await
            .map_err(ClientError::Network)?;

        if response.status == 401 && bearer.is_some() {
            warn!(path = %request.path, "bearer rejected; tearing down session");
            self.session.logout();
            self.cache.clear();
            return Err(ClientError::Auth(AuthError::TokenRejected));
        }

        let envelope_failed = response
            .body
            .get("success")
            .and_then(Value::as_bool)
            .is_some_and(|ok| !ok);
        if !response.is_success() || envelope_failed {
            return Err(ClientError::Api {
                status: response.status,
                message: envelope_message(&response.body),
            });
        }

        Ok(response.body)
    }

    async fn fetch_and_apply<Q: QueryEndpoint>(
        &self,
        key: &CacheKey,
        request: &ApiRequest,
        seq: u64,
    ) -> Result<QueryData<Q::Data>> {
        match self.execute(request).await {
            Ok(body) => {
                if let Some(job) = self.cache.apply_success(key, seq, body.clone()) {
                    self.execute_refetch(job).await;
                }
                decode_query(&body)
            }
            Err(e) => {
                if let Some(job) = self.cache.apply_error(key, seq, e.to_string()) {
                    self.execute_refetch(job).await;
                }
                Err(e)
            }
        }
    }

    /// Resolve a joined request's outcome from the cache. `None` means the
    /// entry is loading again (a deferred refetch superseded the request the
    /// caller joined) and the caller should replan.
    fn joined_result<D: DeserializeOwned>(&self, key: &CacheKey) -> Option<Result<QueryData<D>>> {
        match self.cache.snapshot(key) {
            Some(snapshot) => match snapshot.status {
                EntryStatus::Success => {
                    let payload = snapshot.payload?;
                    Some(decode_query(&payload))
                }
                EntryStatus::Error => Some(Err(ClientError::Api {
                    status: 0,
                    message: snapshot
                        .error
                        .unwrap_or_else(|| "request failed".to_string()),
                })),
                EntryStatus::Loading | EntryStatus::Idle => None,
            },
            // Entry evicted between completion and read; the payload may have
            // been parked in the warm cache.
            None => {
                let payload = self.cache.read_payload(key)?;
                Some(decode_query(&payload))
            }
        }
    }

    /// Execute an invalidation refetch, applying its result to the cache.
    /// Chained jobs (an invalidation landing during the refetch) run until
    /// the entry settles. Errors land in the entry, not the caller.
    async fn execute_refetch(&self, job: RefetchJob) {
        let mut next = Some(job);
        while let Some(job) = next.take() {
            debug!(key = %job.key, "refetching invalidated entry");
            next = match self.execute(&job.request).await {
                Ok(body) => self.cache.apply_success(&job.key, job.seq, body),
                Err(e) => self.cache.apply_error(&job.key, job.seq, e.to_string()),
            };
        }
    }
}

/// Typed subscription to one query's cache entry.
pub struct QueryHandle<D> {
    subscription: Subscription,
    _marker: PhantomData<fn() -> D>,
}

impl<D: DeserializeOwned> QueryHandle<D> {
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        self.subscription.key()
    }

    /// Raw snapshot of the entry.
    #[must_use]
    pub fn snapshot(&self) -> Option<CacheSnapshot> {
        self.subscription.snapshot()
    }

    /// Lifecycle status; `Idle` when the entry has not been fetched.
    #[must_use]
    pub fn status(&self) -> EntryStatus {
        self.snapshot()
            .map_or(EntryStatus::Idle, |snapshot| snapshot.status)
    }

    /// Decode the current payload, if the entry holds one.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Decode` or `ClientError::Api` when the payload
    /// does not carry the expected data shape.
    pub fn data(&self) -> Result<Option<QueryData<D>>> {
        match self.snapshot().and_then(|snapshot| snapshot.payload) {
            Some(payload) => decode_query(&payload).map(Some),
            None => Ok(None),
        }
    }

    /// Last error message, if the entry is in the error state.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.snapshot().and_then(|snapshot| snapshot.error)
    }

    /// Wait for the next change to the entry. Returns `false` when no
    /// further changes will come.
    pub async fn changed(&mut self) -> bool {
        self.subscription.changed().await
    }
}

fn decode_query<D: DeserializeOwned>(payload: &Value) -> Result<QueryData<D>> {
    let envelope: ApiEnvelope<D> = serde_json::from_value(payload.clone())?;
    match envelope.data {
        Some(data) => Ok(QueryData {
            data,
            count: envelope.count,
        }),
        None => Err(ClientError::Api {
            status: 0,
            message: envelope
                .message
                .unwrap_or_else(|| "response missing data".to_string()),
        }),
    }
}

/// Best-effort user-visible message from an error body.
fn envelope_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .map_or_else(|| "request failed".to_string(), ToString::to_string)
}
