//! Shared test harness: a scripted platform and notification fixtures

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use call_control_core::{
    ApiRequest, ApiResponse, CallControlError, CallControlResult, Endpoints, HttpMethod,
    NotificationMessage, Platform,
};

pub const EXTENSION_ID: &str = "170848004";
pub const ACCOUNT_ID: &str = "170848004";
pub const SESSION_ID: &str = "Y3MxNzE4NTY2MzEzNDAzMzQxNjBAMTAuMTMuMjIuMjQx";
pub const TOPIC: &str = "/restapi/v1.0/account/170848004/extension/170848004/telephony/sessions";

/// Platform answering from a script keyed by method and path
///
/// Responses queued with [`MockPlatform::push`] are used once; responses set
/// with [`MockPlatform::set`] answer every time. Unscripted requests fail with
/// a network error.
#[derive(Default)]
pub struct MockPlatform {
    once: Mutex<HashMap<(HttpMethod, String), VecDeque<ApiResponse>>>,
    sticky: Mutex<HashMap<(HttpMethod, String), ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, method: HttpMethod, path: impl Into<String>, body: Value) {
        self.sticky.lock().insert((method, path.into()), ApiResponse::ok(body));
    }

    pub fn push(&self, method: HttpMethod, path: impl Into<String>, response: ApiResponse) {
        self.once.lock().entry((method, path.into())).or_default().push_back(response);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.method == method && r.path == path).count()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn send(&self, request: ApiRequest) -> CallControlResult<ApiResponse> {
        self.requests.lock().push(request.clone());
        let key = (request.method, request.path.clone());
        if let Some(response) = self.once.lock().get_mut(&key).and_then(VecDeque::pop_front) {
            return Ok(response);
        }
        if let Some(response) = self.sticky.lock().get(&key) {
            return Ok(response.clone());
        }
        Err(CallControlError::network_error(format!("no mock for {} {}", request.method, request.path)))
    }
}

/// Route library logs to the test output; set `RUST_LOG` to see them
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn endpoints() -> Endpoints {
    Endpoints::default()
}

// ===== FIXTURES =====

pub fn extension_info() -> Value {
    json!({
        "id": 170848004,
        "extensionNumber": "101",
        "account": { "id": 170848004 },
        "status": "Enabled",
        "type": "User"
    })
}

pub fn devices() -> Value {
    json!({
        "records": [
            { "id": "800", "name": "Existing Phone", "type": "SoftPhone", "status": "Online" }
        ]
    })
}

pub fn presence(session_ids: &[&str]) -> Value {
    let active_calls: Vec<Value> = session_ids
        .iter()
        .map(|id| json!({ "id": format!("call-{id}"), "direction": "Outbound", "telephonySessionId": id }))
        .collect();
    json!({ "activeCalls": active_calls })
}

pub fn account_presence(session_ids: &[&str]) -> Value {
    json!({ "records": [presence(session_ids), presence(&[])] })
}

pub fn outbound_party(code: &str) -> Value {
    json!({
        "id": "p-out",
        "direction": "Outbound",
        "status": { "code": code },
        "from": { "phoneNumber": "+16505550100", "extensionId": EXTENSION_ID },
        "to": { "phoneNumber": "+12345678900" },
        "extensionId": EXTENSION_ID,
        "accountId": ACCOUNT_ID,
        "missedCall": false,
        "standAlone": false,
        "muted": false
    })
}

pub fn inbound_party(code: &str) -> Value {
    json!({
        "id": "p-in",
        "direction": "Inbound",
        "status": { "code": code },
        "from": { "phoneNumber": "+16505550100" },
        "to": { "phoneNumber": "+12345678900" },
        "missedCall": false,
        "standAlone": false,
        "muted": false
    })
}

pub fn session_detail(id: &str, parties: Vec<Value>) -> Value {
    json!({
        "id": id,
        "sessionId": "1000001",
        "creationTime": "2019-07-19T07:38:02.579Z",
        "origin": { "type": "Call" },
        "parties": parties
    })
}

pub fn message(id: &str, sequence: u64, parties: Vec<Value>) -> NotificationMessage {
    NotificationMessage::new(
        TOPIC,
        json!({
            "sequence": sequence,
            "sessionId": "1000001",
            "telephonySessionId": id,
            "serverId": "10.13.22.241.TAM",
            "eventTime": "2019-07-19T07:38:03.123Z",
            "origin": { "type": "Call" },
            "parties": parties
        }),
    )
}

pub fn outbound_setup(sequence: u64) -> NotificationMessage {
    message(SESSION_ID, sequence, vec![outbound_party("Setup")])
}

pub fn inbound_proceeding(sequence: u64) -> NotificationMessage {
    message(SESSION_ID, sequence, vec![inbound_party("Proceeding")])
}

pub fn outbound_disconnected(sequence: u64) -> NotificationMessage {
    message(SESSION_ID, sequence, vec![outbound_party("Disconnected")])
}

pub fn with_reason(mut party: Value, reason: &str) -> Value {
    party["status"]["reason"] = json!(reason);
    party
}

/// Platform scripted for a full bootstrap with the given active sessions
pub fn bootstrapped_platform(active: &[(&str, Vec<Value>)]) -> Arc<MockPlatform> {
    let platform = MockPlatform::new();
    let endpoints = endpoints();
    platform.set(HttpMethod::Get, endpoints.extension_info(), extension_info());
    platform.set(HttpMethod::Get, endpoints.devices(), devices());
    let ids: Vec<&str> = active.iter().map(|(id, _)| *id).collect();
    platform.set(HttpMethod::Get, endpoints.extension_presence(), presence(&ids));
    platform.set(HttpMethod::Get, endpoints.account_presence(), account_presence(&ids));
    for (id, parties) in active {
        platform.set(HttpMethod::Get, endpoints.session(id), session_detail(id, parties.clone()));
    }
    platform
}
