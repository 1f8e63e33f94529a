//! Dispatcher tests against an in-process calculation server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use obmiar_core::{
    Config, Fragment, ReportKind, ReportView, SelectedFile, UploadError, UploadEvent, UploadStats,
    dispatch_uploads,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
struct ServerState {
    hits: Arc<Hits>,
}

#[derive(Default)]
struct Hits {
    area: AtomicUsize,
    volume: AtomicUsize,
    luminosity: AtomicUsize,
}

/// Echo the first multipart field back so tests can assert what was sent.
async fn echo(endpoint: &str, mut multipart: Multipart) -> Json<Value> {
    let mut upload = Value::Null;
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.unwrap_or_default();
        upload = json!({
            "field": field_name,
            "file_name": file_name,
            "content": String::from_utf8_lossy(&content),
        });
    }
    Json(json!({"endpoint": endpoint, "upload": upload}))
}

async fn area(State(state): State<ServerState>, multipart: Multipart) -> Json<Value> {
    state.hits.area.fetch_add(1, Ordering::SeqCst);
    echo("area", multipart).await
}

async fn volume(State(state): State<ServerState>, multipart: Multipart) -> Json<Value> {
    state.hits.volume.fetch_add(1, Ordering::SeqCst);
    echo("volume", multipart).await
}

async fn luminosity(State(state): State<ServerState>, multipart: Multipart) -> Json<Value> {
    state.hits.luminosity.fetch_add(1, Ordering::SeqCst);
    echo("luminosity", multipart).await
}

fn calc_router(state: ServerState) -> Router {
    Router::new()
        .route("/calculateArea", post(area))
        .route("/calculateVolume", post(volume))
        .route("/calculateLuminosity", post(luminosity))
        .with_state(state)
}

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config_for(base_url: String) -> Config {
    Config {
        base_url,
        timeout_secs: None,
    }
}

fn sample_file() -> SelectedFile {
    SelectedFile::new("budynek.json", br#"{"building": null}"#.to_vec())
}

fn no_progress() -> impl Fn(UploadEvent) + Send + Sync + 'static {
    |_| {}
}

#[tokio::test]
async fn no_file_issues_no_requests_and_keeps_view() {
    let state = ServerState::default();
    let config = config_for(spawn_server(calc_router(state.clone())).await);

    let mut view = ReportView::new();
    view.push(Fragment::Failure {
        report: ReportKind::Area,
        message: "stale".into(),
    });

    let err = dispatch_uploads(
        None,
        &[ReportKind::Area, ReportKind::Volume],
        &config,
        &mut view,
        no_progress(),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, UploadError::NoFile));
    assert_eq!(state.hits.area.load(Ordering::SeqCst), 0);
    assert_eq!(state.hits.volume.load(Ordering::SeqCst), 0);
    // The precondition aborts before the view is cleared.
    assert_eq!(view.len(), 1);
}

#[tokio::test]
async fn one_request_per_selected_kind() {
    let state = ServerState::default();
    let config = config_for(spawn_server(calc_router(state.clone())).await);

    let events: Arc<Mutex<Vec<UploadEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let mut view = ReportView::new();

    let stats = dispatch_uploads(
        Some(sample_file()),
        &[ReportKind::Area, ReportKind::Luminosity],
        &config,
        &mut view,
        move |event| sink.lock().unwrap().push(event),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        stats,
        UploadStats {
            requested: 2,
            succeeded: 2,
            failed: 0
        }
    );
    assert_eq!(state.hits.area.load(Ordering::SeqCst), 1);
    assert_eq!(state.hits.volume.load(Ordering::SeqCst), 0);
    assert_eq!(state.hits.luminosity.load(Ordering::SeqCst), 1);

    assert_eq!(view.len(), 2);
    for fragment in view.fragments() {
        let Fragment::Report { report, body } = fragment else {
            panic!("expected a report fragment, got {fragment:?}");
        };
        let expected = match report {
            ReportKind::Area => "area",
            ReportKind::Volume => "volume",
            ReportKind::Luminosity => "luminosity",
        };
        assert_eq!(body["endpoint"], expected);
    }

    let events = events.lock().unwrap();
    let dispatched = events
        .iter()
        .filter(|e| matches!(e, UploadEvent::Dispatched { .. }))
        .count();
    let settled = events
        .iter()
        .filter(|e| matches!(e, UploadEvent::Settled { .. }))
        .count();
    assert_eq!(dispatched, 2);
    assert_eq!(settled, 2);
}

#[tokio::test]
async fn multipart_carries_file_under_file_field() {
    let state = ServerState::default();
    let config = config_for(spawn_server(calc_router(state)).await);

    let mut view = ReportView::new();
    dispatch_uploads(
        Some(sample_file()),
        &[ReportKind::Volume],
        &config,
        &mut view,
        no_progress(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let Fragment::Report { body, .. } = &view.fragments()[0] else {
        panic!("expected a report fragment");
    };
    assert_eq!(body["upload"]["field"], "file");
    assert_eq!(body["upload"]["file_name"], "budynek.json");
    assert_eq!(body["upload"]["content"], r#"{"building": null}"#);
}

#[tokio::test]
async fn failing_endpoint_is_isolated_from_siblings() {
    let state = ServerState::default();
    let app = Router::new()
        .route("/calculateArea", post(area))
        .route("/calculateVolume", post(|| async { "definitely not json" }))
        .with_state(state.clone());
    let config = config_for(spawn_server(app).await);

    let mut view = ReportView::new();
    let stats = dispatch_uploads(
        Some(sample_file()),
        &[ReportKind::Volume, ReportKind::Area],
        &config,
        &mut view,
        no_progress(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(stats.requested, 2);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 1);

    let failures: Vec<_> = view.fragments().iter().filter(|f| f.is_failure()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].report_kind(), ReportKind::Volume);

    let reports: Vec<_> = view
        .fragments()
        .iter()
        .filter(|f| !f.is_failure())
        .collect();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].report_kind(), ReportKind::Area);
}

#[tokio::test]
async fn status_code_is_not_inspected() {
    let app = Router::new().route(
        "/calculateLuminosity",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))) }),
    );
    let config = config_for(spawn_server(app).await);

    let mut view = ReportView::new();
    let stats = dispatch_uploads(
        Some(sample_file()),
        &[ReportKind::Luminosity],
        &config,
        &mut view,
        no_progress(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(stats.succeeded, 1);
    let Fragment::Report { body, .. } = &view.fragments()[0] else {
        panic!("a JSON body is a report regardless of status code");
    };
    assert_eq!(body["error"], "boom");
}

#[tokio::test]
async fn fragments_arrive_in_completion_order() {
    let app = Router::new()
        .route(
            "/calculateArea",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                Json(json!({"endpoint": "area"}))
            }),
        )
        .route(
            "/calculateVolume",
            post(|| async { Json(json!({"endpoint": "volume"})) }),
        );
    let config = config_for(spawn_server(app).await);

    let mut view = ReportView::new();
    dispatch_uploads(
        Some(sample_file()),
        &[ReportKind::Area, ReportKind::Volume],
        &config,
        &mut view,
        no_progress(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    // Dispatched area first, but volume answers first.
    assert_eq!(view.fragments()[0].report_kind(), ReportKind::Volume);
    assert_eq!(view.fragments()[1].report_kind(), ReportKind::Area);
}

#[tokio::test]
async fn empty_selection_clears_view_and_issues_nothing() {
    let state = ServerState::default();
    let config = config_for(spawn_server(calc_router(state.clone())).await);

    let mut view = ReportView::new();
    view.push(Fragment::Failure {
        report: ReportKind::Area,
        message: "stale".into(),
    });

    let stats = dispatch_uploads(
        Some(sample_file()),
        &[],
        &config,
        &mut view,
        no_progress(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(stats, UploadStats::default());
    assert!(view.is_empty());
    assert_eq!(state.hits.area.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rerun_replaces_previous_output() {
    let state = ServerState::default();
    let config = config_for(spawn_server(calc_router(state.clone())).await);

    let mut view = ReportView::new();
    for _ in 0..2 {
        dispatch_uploads(
            Some(sample_file()),
            &[ReportKind::Area],
            &config,
            &mut view,
            no_progress(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    }

    assert_eq!(state.hits.area.load(Ordering::SeqCst), 2);
    // Output reflects only the latest run.
    assert_eq!(view.len(), 1);
}

#[tokio::test]
async fn pre_cancelled_run_produces_no_fragments() {
    let state = ServerState::default();
    let config = config_for(spawn_server(calc_router(state.clone())).await);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut view = ReportView::new();
    let stats = dispatch_uploads(
        Some(sample_file()),
        &[ReportKind::Area, ReportKind::Volume],
        &config,
        &mut view,
        no_progress(),
        cancel,
    )
    .await
    .unwrap();

    assert_eq!(stats.requested, 2);
    assert_eq!(stats.succeeded + stats.failed, 0);
    assert!(view.is_empty());
}

#[tokio::test]
async fn unreachable_server_yields_failure_fragments() {
    let config = config_for("http://127.0.0.1:9".to_string());

    let mut view = ReportView::new();
    let stats = dispatch_uploads(
        Some(sample_file()),
        &[ReportKind::Area, ReportKind::Volume],
        &config,
        &mut view,
        no_progress(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(stats.failed, 2);
    assert_eq!(view.len(), 2);
    for fragment in view.fragments() {
        assert!(fragment.is_failure());
    }
}
