//! Common test utilities for orchestration integration tests.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use meridian_control::{
    config::ControlConfig,
    transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, TransportError},
    AllowListChecker, ManualClock, Orchestrator, PermissionChecker, PlatformClient,
};
use meridian_secrets::{BackendSecretGetter, MemorySecrets, SecretContext, SecretGetter};

pub const PLATFORM_BASE: &str = "https://platform.test/api";
pub const GITOPS_BASE: &str = "https://gitops.test/api";

/// One request the transport saw, with the base URL stripped.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RecordedCall {
    /// `METHOD path`, for sequence assertions.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

pub type Reply = Result<ApiResponse, TransportError>;

#[derive(Default)]
struct Routes {
    replies: HashMap<(HttpMethod, String), VecDeque<Reply>>,
    calls: Vec<RecordedCall>,
}

/// In-memory transport with scripted replies per route.
///
/// Each route holds a queue of replies. The last reply of a queue is
/// repeated once the others are used up. Unscripted routes answer 404.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    routes: Arc<Mutex<Routes>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method path`.
    pub fn reply(&self, method: HttpMethod, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .replies
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Replace every queued reply for `method path`.
    pub fn script(&self, method: HttpMethod, path: &str, replies: Vec<Reply>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .replies
            .insert((method, path.to_owned()), replies.into());
        self
    }

    /// Queue a status and body for `method path`.
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: &str) -> &Self {
        self.reply(method, path, Ok(ApiResponse::new(status, body)))
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.routes.lock().unwrap().calls.clone()
    }

    /// Labels of every call so far.
    pub fn labels(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::label).collect()
    }

    /// Calls to one route.
    pub fn calls_to(&self, method: HttpMethod, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }
}

fn strip_base(url: &str) -> String {
    [PLATFORM_BASE, GITOPS_BASE]
        .iter()
        .find_map(|base| url.strip_prefix(base))
        .map_or_else(|| url.to_owned(), |rest| rest.trim_start_matches('/').to_owned())
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let path = strip_base(&request.url);
        let mut routes = self.routes.lock().unwrap();
        routes.calls.push(RecordedCall {
            method: request.method,
            path: path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
        });

        match routes.replies.get_mut(&(request.method, path)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(ApiResponse::new(404, "not scripted"))),
            None => Ok(ApiResponse::new(404, "not scripted")),
        }
    }
}

/// Config pointing at the scripted bases, with the default budgets.
pub fn test_config() -> ControlConfig {
    let mut config = ControlConfig::default();
    config.platform_api.base_url = PLATFORM_BASE.to_owned();
    config.gitops_api.base_url = GITOPS_BASE.to_owned();
    config
}

/// A secret getter backed by an in-memory store holding `name`.
pub fn token(name: &str) -> Arc<dyn SecretGetter> {
    let backend = Arc::new(MemorySecrets::with_global(name, "test-token"));
    Arc::new(BackendSecretGetter::new(backend, name, SecretContext::new()))
}

/// Orchestrator wired to a scripted transport and a manual clock.
pub struct TestOrchestrator {
    pub transport: ScriptedTransport,
    pub clock: ManualClock,
    pub client: Arc<PlatformClient>,
    pub orchestrator: Orchestrator,
}

impl TestOrchestrator {
    pub fn new() -> Self {
        Self::with_permissions(Arc::new(AllowListChecker::allow_all()))
    }

    pub fn with_permissions(permissions: Arc<dyn PermissionChecker>) -> Self {
        let config = test_config();
        let transport = ScriptedTransport::new();
        let clock = ManualClock::new();
        let client = Arc::new(PlatformClient::from_config(
            &config,
            Arc::new(transport.clone()),
            token(&config.platform_api.secret_name),
            token(&config.gitops_api.secret_name),
        ));
        let orchestrator = Orchestrator::new(
            Arc::clone(&client),
            config,
            Arc::new(clock.clone()),
            permissions,
        );

        Self {
            transport,
            clock,
            client,
            orchestrator,
        }
    }
}

impl Default for TestOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
