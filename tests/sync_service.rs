mod common;

use std::sync::{atomic::Ordering, Arc};

use serde_json::{json, Value};
use step_sync::error::SyncError;
use step_sync::service::{StepsService, StepsSyncService};
use step_sync::viewmodel::SyncViewModel;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{memory_store, remote_client, FakeSource};

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/local"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jwt": "jwt-abc" })))
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/steps"))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn sync_service(server: &MockServer, source: Arc<FakeSource>) -> StepsSyncService {
    StepsSyncService::new(source, remote_client(&server.uri(), memory_store()), 30)
}

async fn uploaded_counts(server: &MockServer) -> Vec<u64> {
    server.received_requests().await.unwrap()
        .iter()
        .filter(|r| r.url.path() == "/steps")
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["steps_count"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn hourly_fetch_returns_series_and_uploads_the_sum() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_upload(&server, 200, 1).await;

    let source = Arc::new(FakeSource::with_steps(vec![1, 2, 3, 4, 5]));
    let steps = sync_service(&server, source).fetch_steps_by_hour().await.unwrap();

    assert_eq!(steps, vec![1, 2, 3, 4, 5]);
    assert_eq!(uploaded_counts(&server).await, vec![15]);
}

#[tokio::test]
async fn rejected_upload_does_not_block_the_hourly_fetch() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_upload(&server, 503, 1).await;

    let source = Arc::new(FakeSource::with_steps(vec![40, 60]));
    assert_eq!(sync_service(&server, source).fetch_steps_by_hour().await, Ok(vec![40, 60]));
}

#[tokio::test]
async fn failed_upload_auth_does_not_block_the_hourly_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/local"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_upload(&server, 200, 0).await;

    let source = Arc::new(FakeSource::with_steps(vec![9]));
    assert_eq!(sync_service(&server, source).fetch_steps_by_hour().await, Ok(vec![9]));
}

#[tokio::test]
async fn step_source_failure_is_reported_and_nothing_is_uploaded() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_upload(&server, 200, 0).await;

    let source = Arc::new(FakeSource::failing());
    let err = sync_service(&server, source).fetch_steps_by_hour().await.unwrap_err();
    assert!(matches!(err, SyncError::StepSource(_)));
}

#[tokio::test]
async fn authorization_prompts_only_when_undetermined() {
    let server = MockServer::start().await;

    let source = Arc::new(FakeSource::undetermined(vec![]));
    let service = sync_service(&server, source.clone());
    assert!(!service.is_authorized().await);

    service.request_authorization().await.unwrap();
    service.request_authorization().await.unwrap();

    assert!(service.is_authorized().await);
    assert_eq!(source.prompts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unavailable_step_source_is_fatal() {
    let server = MockServer::start().await;

    let source = Arc::new(FakeSource::unavailable());
    let err = sync_service(&server, source.clone()).request_authorization().await.unwrap_err();

    assert_eq!(err, SyncError::HealthDataUnavailable);
    assert_eq!(source.prompts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn on_appear_with_unavailable_source_never_reads_or_calls_the_api() {
    let server = MockServer::start().await;

    let source = Arc::new(FakeSource::unavailable());
    let view_model = SyncViewModel::new(Arc::new(sync_service(&server, source.clone())));
    view_model.on_appear().await;
    view_model.refresh_hourly().await;

    let state = view_model.state().await;
    assert_eq!(state.fatal_error, Some(SyncError::HealthDataUnavailable));
    assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_with_failing_auth_is_non_fatal_and_keeps_days_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/local"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = Arc::new(FakeSource::with_steps(vec![]));
    let view_model = SyncViewModel::new(Arc::new(sync_service(&server, source)));
    view_model.refresh_history().await;

    let state = view_model.state().await;
    assert!(matches!(state.error, Some(SyncError::Auth(_))));
    assert_eq!(state.fatal_error, None);
    assert!(state.steps_by_day.is_empty());
}

#[tokio::test]
async fn full_cycle_publishes_hours_and_history() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_upload(&server, 200, 1).await;
    Mock::given(method("GET"))
        .and(path("/steps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "steps_datetime": "2025-01-12T08:00:00.000Z", "steps_total_by_day": 7000 },
            { "id": 1, "steps_datetime": "2025-01-11T08:00:00.000Z", "steps_total_by_day": 9000 }
        ])))
        .mount(&server)
        .await;

    let source = Arc::new(FakeSource::undetermined(vec![100, 250]));
    let view_model = SyncViewModel::new(Arc::new(sync_service(&server, source)));
    view_model.on_appear().await;
    view_model.refresh_history().await;

    let state = view_model.state().await;
    assert!(state.is_authorized);
    assert_eq!(state.steps_today(), 350);
    assert_eq!(state.steps_by_day.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(state.error, None);
}
