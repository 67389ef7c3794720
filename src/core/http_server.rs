use super::file_serve::serve_static_file;
use super::service_manager::{Error as ServiceManagerError, Service};
use crate::configuration::Context;
use crate::registration::{RegistrationError, RegistrationPayload, RegistrationWorkflow};
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<RegistrationWorkflow>,
    pub static_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register_handler))
        .route("/static/{*filename}", get(serve_static_file))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct HttpService {
    port: u16,
    state: AppState,
}

#[async_trait]
impl Service for HttpService {
    type Context = Context;
    const NAME: &'static str = "http";

    async fn new(context: Context) -> Result<Self, ServiceManagerError> {
        let workflow = RegistrationWorkflow::new(
            context.database.clone(),
            context.notifier.clone(),
            context.config.telegram.admin_id,
            &context.config.timeouts,
        );

        Ok(Self {
            port: context.config.http.port,
            state: AppState {
                workflow: Arc::new(workflow),
                static_dir: PathBuf::from(&context.config.http.static_dir),
            },
        })
    }

    async fn run(self) -> Result<(), ServiceManagerError> {
        let listener = TcpListener::bind(format!("0.0.0.0:{}", self.port))
            .await
            .map_err(ServiceManagerError::from)?;

        info!("HTTP server running on port {}", self.port);

        axum::serve(listener, router(self.state))
            .await
            .map_err(ServiceManagerError::from)
    }
}

async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationPayload>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            return error_response(&RegistrationError::MalformedInput(rejection.body_text()))
        }
    };

    match state.workflow.submit(payload).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "ok": true }))),
        Err(e) => error_response(&e),
    }
}

fn error_response(error: &RegistrationError) -> (StatusCode, Json<Value>) {
    let status = match error {
        RegistrationError::MalformedInput(_) => StatusCode::BAD_REQUEST,
        RegistrationError::StorageFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(json!({
            "ok": false,
            "kind": error.kind(),
            "error": error.to_string(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::TimeoutConfig;
    use crate::registration::testing::{EventLog, MemoryStore, RecordingNotifier};
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request};
    use std::path::Path;
    use tower::ServiceExt;

    const ADMIN_ID: i64 = 123456789;

    struct TestApp {
        router: Router,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn test_app() -> TestApp {
        let events = Arc::new(EventLog::default());
        let store = Arc::new(MemoryStore::new(events.clone()));
        let notifier = Arc::new(RecordingNotifier::new(events));
        let workflow = RegistrationWorkflow::new(
            store.clone(),
            notifier.clone(),
            ADMIN_ID,
            &TimeoutConfig::default(),
        );
        let state = AppState {
            workflow: Arc::new(workflow),
            static_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("static"),
        };
        TestApp {
            router: router(state),
            store,
            notifier,
        }
    }

    fn register_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/register")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_register_success() {
        let app = test_app();

        let (status, body) = send(
            app.router,
            register_request(r#"{"tg_id": 42, "phone": "+15551234567", "lat": 10.0, "lon": 20.0}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
        assert!(app.store.user(42).is_some());
        let recipients: Vec<i64> = app.notifier.sent().into_iter().map(|(to, _)| to).collect();
        assert_eq!(recipients, vec![ADMIN_ID, 42]);
    }

    #[tokio::test]
    async fn test_register_malformed_id() {
        let app = test_app();

        let (status, body) = send(
            app.router,
            register_request(r#"{"tg_id": "not-a-number", "phone": "+1"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["kind"], json!("malformed_input"));
        assert_eq!(app.store.len(), 0);
        assert!(app.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_register_invalid_json() {
        let app = test_app();

        let (status, body) = send(app.router, register_request("{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], json!("malformed_input"));
        assert!(app.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_register_non_object_body() {
        let app = test_app();

        let (status, body) = send(app.router, register_request("42")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], json!("malformed_input"));
    }

    #[tokio::test]
    async fn test_register_storage_failure() {
        let app = test_app();
        app.store.set_failing(true);

        let (status, body) = send(app.router, register_request(r#"{"tg_id": 42}"#)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["kind"], json!("storage_failure"));
        assert!(app.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let response = app
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
