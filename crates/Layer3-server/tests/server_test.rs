//! HTTP-level behavior: auth, payload limits, allowlisting, envelopes, and
//! the end-to-end provision path through the local executor.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use stackd_exec::{
    ExecutionContext, Executor, LocalExecutor, OperationError, OperationOutcome, OutputSink,
    StackRunner,
};
use stackd_foundation::{
    Config, DestroyRequest, Error, OperationResult, ProvisionRequest, StopRequest,
};
use stackd_server::{build_router, AppState, MAX_BODY_BYTES};
use tower::ServiceExt;

#[derive(Default)]
struct StubExecutor {
    provision_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
}

#[async_trait]
impl Executor for StubExecutor {
    async fn provision(&self, _req: &ProvisionRequest) -> OperationOutcome {
        self.provision_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OperationResult::default())
    }

    async fn stop(&self, _req: &StopRequest) -> OperationOutcome {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OperationResult::default())
    }

    async fn destroy(&self, _req: &DestroyRequest) -> OperationOutcome {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OperationResult::default())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn router_with(config: Config, executor: Arc<dyn Executor>) -> Router {
    build_router(AppState {
        config: Arc::new(config),
        executor,
    })
}

fn secured_config(projects_root: &Path) -> Config {
    Config {
        auth_token: Some("secret-token".into()),
        projects_root: Some(projects_root.to_path_buf()),
        ..Config::default()
    }
}

fn provision_body(project_root: &Path) -> String {
    serde_json::json!({
        "project_id": 1,
        "project_ref": "test-ref",
        "project_name": "test-name",
        "organization_slug": "org",
        "project_root": project_root.display().to_string(),
        "cloud_provider": "aws",
        "region": "region",
        "database_password": "pass",
        "excluded_services": [],
        "network_id": "net",
        "ignore_health_check": true,
    })
    .to_string()
}

fn post(uri: &str, body: impl Into<Body>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(body.into()).unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn auth_rejects_missing_token() {
    let root = tempfile::tempdir().unwrap();
    let project = root.path().join("proj");
    let executor = Arc::new(StubExecutor::default());
    let app = router_with(secured_config(root.path()), executor.clone());

    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            provision_body(&project),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(executor.provision_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auth_rejects_wrong_token() {
    let root = tempfile::tempdir().unwrap();
    let project = root.path().join("proj");
    let app = router_with(
        secured_config(root.path()),
        Arc::new(StubExecutor::default()),
    );

    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            provision_body(&project),
            Some("wrong-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_allows_valid_token() {
    let root = tempfile::tempdir().unwrap();
    let project = root.path().join("proj");
    let executor = Arc::new(StubExecutor::default());
    let app = router_with(secured_config(root.path()), executor.clone());

    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            provision_body(&project),
            Some("secret-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(executor.provision_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_token_config_disables_auth() {
    let root = tempfile::tempdir().unwrap();
    let project = root.path().join("proj");
    let config = Config {
        projects_root: Some(root.path().to_path_buf()),
        ..Config::default()
    };
    let app = router_with(config, Arc::new(StubExecutor::default()));

    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            provision_body(&project),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn healthz_does_not_require_auth() {
    let root = tempfile::tempdir().unwrap();
    let app = router_with(
        secured_config(root.path()),
        Arc::new(StubExecutor::default()),
    );

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn project_root_outside_allowlist_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let executor = Arc::new(StubExecutor::default());
    let app = router_with(secured_config(root.path()), executor.clone());

    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            provision_body(Path::new("/tmp/outside")),
            Some("secret-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(executor.provision_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected_before_decoding() {
    let root = tempfile::tempdir().unwrap();
    let executor = Arc::new(StubExecutor::default());
    let app = router_with(secured_config(root.path()), executor.clone());

    let oversized = "a".repeat(MAX_BODY_BYTES + 1);
    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            oversized,
            Some("secret-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(executor.provision_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_json_payload_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let executor = Arc::new(StubExecutor::default());
    let app = router_with(secured_config(root.path()), executor.clone());

    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            "{not json",
            Some("secret-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "invalid json payload");
    assert_eq!(executor.provision_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stop_requires_project_ref() {
    let root = tempfile::tempdir().unwrap();
    let executor = Arc::new(StubExecutor::default());
    let app = router_with(secured_config(root.path()), executor.clone());

    let body = serde_json::json!({
        "project_ref": "  ",
        "project_root": root.path().join("proj").display().to_string(),
    })
    .to_string();
    let response = app
        .oneshot(post("/v1/projects/stop", body, Some("secret-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"], "project_ref is required");
    assert_eq!(executor.stop_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn provision_requires_positive_project_id() {
    let root = tempfile::tempdir().unwrap();
    let app = router_with(
        secured_config(root.path()),
        Arc::new(StubExecutor::default()),
    );

    let mut body: serde_json::Value =
        serde_json::from_str(&provision_body(&root.path().join("proj"))).unwrap();
    body["project_id"] = serde_json::json!(0);
    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            body.to_string(),
            Some("secret-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

struct FailingExecutor;

#[async_trait]
impl Executor for FailingExecutor {
    async fn provision(&self, _req: &ProvisionRequest) -> OperationOutcome {
        Err(OperationError {
            source: Error::Runner("db refused to start".into()),
            result: OperationResult {
                stdout: "pulling images\n".into(),
                stderr: String::new(),
                duration_ms: 7,
            },
        })
    }

    async fn stop(&self, _req: &StopRequest) -> OperationOutcome {
        Ok(OperationResult::default())
    }

    async fn destroy(&self, _req: &DestroyRequest) -> OperationOutcome {
        Ok(OperationResult::default())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn executor_failure_returns_partial_output() {
    let root = tempfile::tempdir().unwrap();
    let project = root.path().join("proj");
    let app = router_with(secured_config(root.path()), Arc::new(FailingExecutor));

    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            provision_body(&project),
            Some("secret-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().unwrap().contains("db refused"));
    assert_eq!(body["result"]["stdout"], "pulling images\n");
}

#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<String>>,
    saw_stop: AtomicBool,
}

#[async_trait]
impl StackRunner for RecordingRunner {
    async fn start(
        &self,
        _ctx: &ExecutionContext,
        sink: &OutputSink,
        _excluded_services: &[String],
        _ignore_health_check: bool,
    ) -> stackd_foundation::Result<()> {
        self.calls.lock().unwrap().push("start".into());
        assert!(self.saw_stop.load(Ordering::SeqCst));
        sink.write_stdout("stack services ready\n");
        Ok(())
    }

    async fn stop(
        &self,
        _ctx: &ExecutionContext,
        _sink: &OutputSink,
        preserve_data: bool,
        _all: bool,
    ) -> stackd_foundation::Result<()> {
        let mut calls = self.calls.lock().unwrap();
        calls.push("stop".into());
        calls.push(format!("stop-preserves-data={preserve_data}"));
        self.saw_stop.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn provision_end_to_end_through_local_executor() {
    let root = tempfile::tempdir().unwrap();
    let project = root.path().join("proj");
    std::fs::create_dir(&project).unwrap();

    let runner = Arc::new(RecordingRunner::default());
    let executor = Arc::new(LocalExecutor::new(runner.clone()));
    let app = router_with(secured_config(root.path()), executor);

    let response = app
        .oneshot(post(
            "/v1/projects/provision",
            provision_body(&project),
            Some("secret-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "completed");
    assert!(body["result"]["duration_ms"].as_u64().is_some());
    assert!(body["result"]["stdout"]
        .as_str()
        .unwrap()
        .contains("stack services ready"));

    assert_eq!(
        runner.calls.lock().unwrap().clone(),
        vec!["stop", "stop-preserves-data=true", "start"]
    );
}
