//! Test harness for the Parcelflow client and dashboard stacks.
//!
//! Tests run the full stack in-process against [`FakeTransport`], a scripted
//! [`Transport`] with a per-route response table, a call log, and a gate
//! that holds responses so tests can overlap in-flight requests
//! deterministically.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tokio::sync::watch;

use parcelflow_client::endpoint::Verb;
use parcelflow_client::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use parcelflow_client::{ApiClient, SessionStore};

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Call {
    pub verb: Verb,
    pub path: String,
    /// The bearer token attached, if any.
    pub bearer: Option<String>,
}

/// Scripted transport. Routes are keyed by verb and exact path (including
/// the query string); a route scripted with several responses serves them in
/// order and repeats the last one.
pub struct FakeTransport {
    routes: Mutex<HashMap<(Verb, String), VecDeque<ApiResponse>>>,
    calls: Mutex<Vec<Call>>,
    open: watch::Sender<bool>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        let (open, _) = watch::channel(true);
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            open,
        }
    }
}

impl FakeTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script one repeating response for a route.
    pub fn respond(&self, verb: Verb, path: &str, status: u16, body: Value) {
        self.respond_seq(verb, path, vec![(status, body)]);
    }

    /// Script a sequence of responses for a route; the last repeats.
    ///
    /// # Panics
    ///
    /// Panics if the route lock is poisoned.
    pub fn respond_seq(&self, verb: Verb, path: &str, responses: Vec<(u16, Value)>) {
        let queue = responses
            .into_iter()
            .map(|(status, body)| ApiResponse { status, body })
            .collect();
        self.routes
            .lock()
            .expect("route lock poisoned")
            .insert((verb, path.to_string()), queue);
    }

    /// Hold all responses until [`Self::release`]; requests still arrive and
    /// are logged immediately.
    pub fn hold(&self) {
        let _ = self.open.send(false);
    }

    /// Release held responses.
    pub fn release(&self) {
        let _ = self.open.send(true);
    }

    /// Every request seen so far, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the call lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("call lock poisoned").clone()
    }

    /// Number of requests that hit a specific route.
    #[must_use]
    pub fn count(&self, verb: Verb, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.verb == verb && c.path == path)
            .count()
    }

    /// Total number of requests seen.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls().len()
    }

    fn pop_response(&self, verb: Verb, path: &str) -> ApiResponse {
        let mut routes = self.routes.lock().expect("route lock poisoned");
        routes
            .get_mut(&(verb, path.to_string()))
            .and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
            .unwrap_or(ApiResponse {
                status: 404,
                body: json!({ "success": false, "message": format!("no route for {verb} {path}") }),
            })
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&SecretString>,
    ) -> Result<ApiResponse, TransportError> {
        self.calls.lock().expect("call lock poisoned").push(Call {
            verb: request.verb,
            path: request.path.clone(),
            bearer: bearer.map(|t| t.expose_secret().to_string()),
        });

        let mut open = self.open.subscribe();
        let _ = open.wait_for(|o| *o).await;

        Ok(self.pop_response(request.verb, &request.path))
    }
}

/// Install a test subscriber once per process so `RUST_LOG` works in tests.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A client over a fresh fake transport with no session persistence.
#[must_use]
pub fn test_client() -> (ApiClient, Arc<FakeTransport>) {
    init_tracing();
    let transport = FakeTransport::new();
    let client = ApiClient::new(transport.clone(), SessionStore::new(None));
    (client, transport)
}

/// Success envelope around a list payload with a total count.
#[must_use]
pub fn list_envelope(items: Value, count: u64) -> Value {
    json!({ "success": true, "data": items, "count": count })
}

/// Minimal parcel JSON in the backend wire format.
#[must_use]
pub fn parcel_json(id: &str, tracking: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "trackingNumber": tracking,
        "recipient": {
            "name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "+1-202-555-0101",
            "address": {
                "street": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "zipCode": "62701",
                "country": "US"
            }
        },
        "parcelDetails": {
            "weight": "2.5",
            "dimensions": { "length": "30", "width": "20", "height": "10" },
            "description": "Books",
            "value": "45.00",
            "category": "books"
        },
        "shipping": {
            "service": "standard",
            "cost": "9.99",
            "estimatedDelivery": "2024-05-10T00:00:00Z"
        },
        "status": status,
        "paymentStatus": "paid",
        "statusHistory": [],
        "createdAt": "2024-05-01T09:00:00Z",
        "updatedAt": "2024-05-01T09:00:00Z"
    })
}

/// Minimal user JSON in the backend wire format.
#[must_use]
pub fn user_json(id: &str, name: &str, email: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "email": email,
        "role": role,
        "isActive": true,
        "createdAt": "2024-05-01T09:00:00Z"
    })
}

/// Successful login envelope carrying tokens and the user.
#[must_use]
pub fn login_envelope(user: Value, token: &str) -> Value {
    json!({
        "success": true,
        "data": user,
        "token": token,
        "refresh_token": "refresh-1"
    })
}
