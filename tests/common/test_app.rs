//! In-memory application harness
//!
//! `TestApp` owns an in-memory `AppState` and the router built from it.
//! REST calls go through `tower::ServiceExt::oneshot`; messaging clients are
//! joined to the registry directly and drive a real `SessionHandler`.
//! `serve` binds the same router to a local port for WebSocket clients.

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use convoflow::backend::realtime::{ConnectionId, Outbox};
use convoflow::backend::routes::create_router;
use convoflow::backend::server::AppState;
use convoflow::backend::session::SessionHandler;
use convoflow::backend::BackendResult;
use convoflow::shared::{ClientEvent, ServerEvent};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

use super::auth_helpers::{create_test_token, test_config};

/// Registered user with a valid token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

/// One live messaging connection
pub struct TestClient {
    pub user_id: Uuid,
    pub connection_id: ConnectionId,
    pub handler: SessionHandler,
    outbox: Outbox,
}

impl TestClient {
    pub async fn send(&self, event: ClientEvent) -> BackendResult<()> {
        self.handler.handle(event).await
    }

    /// Everything queued for this connection so far
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.outbox.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn event_names(&mut self) -> Vec<&'static str> {
        self.drain().iter().map(ServerEvent::name).collect()
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::in_memory(test_config());
        let router = create_router(state.clone());
        Self { state, router }
    }

    /// Register a user and issue their token
    pub async fn user(&self, username: &str) -> TestUser {
        let profile = self
            .state
            .graph
            .register_user(username)
            .await
            .expect("Failed to register test user");
        TestUser {
            id: profile.id,
            username: profile.username,
            token: create_test_token(profile.id, username),
        }
    }

    /// Make two users friends through the graph store
    pub async fn befriend(&self, a: &TestUser, b: &TestUser) {
        self.state
            .graph
            .send_request(a.id, b.id)
            .await
            .expect("send_request");
        self.state
            .graph
            .accept_request(a.id, b.id)
            .await
            .expect("accept_request");
    }

    /// Serve the router on an ephemeral local port
    pub async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("bound address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("test server");
        });
        addr
    }

    /// Open a messaging connection for `user`
    pub fn connect(&self, user: &TestUser) -> TestClient {
        let (connection_id, outbox) = self.state.registry.join(user.id);
        TestClient {
            user_id: user.id,
            connection_id,
            handler: SessionHandler::new(&self.state, user.id, connection_id),
            outbox,
        }
    }

    pub fn disconnect(&self, client: TestClient) {
        self.state.registry.leave(client.connection_id);
    }

    /// Send a request and decode the JSON response body
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let (status, bytes) = self.send_raw(request).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Send a prepared request and return the raw body
    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        (status, bytes.to_vec())
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }
}
