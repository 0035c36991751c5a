//! Integration tests for `POST /api/sync`

use chrono::{TimeZone, Utc};
use serde_json::json;

use studytrack_api::ApiError;
use studytrack_core::domain::{Assignment, SyncId};
use studytrack_core::ports::{IRemoteGateway, SyncRequest};

use crate::common;

fn request_with_ciphertext_grade() -> SyncRequest {
    let due = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
    let mut assignment = Assignment::new("Essay", SyncId::new("c1").unwrap(), due)
        .with_id(SyncId::new("a1").unwrap());
    assignment.set_encrypted_grade("v1:opaque");

    SyncRequest {
        assignments: vec![assignment],
        courses: vec![],
        study_sessions: vec![],
        deleted_ids: vec![SyncId::new("a9").unwrap()],
        last_sync_time: Some(Utc.with_ymd_and_hms(2026, 4, 30, 0, 0, 0).unwrap()),
    }
}

#[tokio::test]
async fn test_sync_push_sends_camel_case_body() {
    let (server, gateway) = common::setup_gateway().await;
    common::mount_sync(&server, json!({ "lastSync": "2026-05-01T10:00:00Z" })).await;

    gateway
        .sync_push(&request_with_ciphertext_grade())
        .await
        .expect("sync_push failed");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["deletedIds"], json!(["a9"]));
    assert_eq!(body["lastSyncTime"], json!("2026-04-30T00:00:00Z"));
    assert_eq!(body["assignments"][0]["courseId"], json!("c1"));
    assert_eq!(body["assignments"][0]["grade"], json!("v1:opaque"));
    assert_eq!(body["assignments"][0]["isGradeEncrypted"], json!(true));
    assert!(body["studySessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sync_push_parses_returned_collections() {
    let (server, gateway) = common::setup_gateway().await;
    common::mount_sync(
        &server,
        json!({
            "lastSync": "2026-05-01T10:00:00Z",
            "data": {
                "assignments": [{
                    "id": "a1",
                    "serverId": 17,
                    "title": "Essay",
                    "dueDate": "2026-05-01T09:00:00Z",
                    "courseId": "c1",
                    "grade": "v1:opaque",
                    "isGradeEncrypted": true
                }],
                "studySessions": []
            }
        }),
    )
    .await;

    let response = gateway
        .sync_push(&request_with_ciphertext_grade())
        .await
        .expect("sync_push failed");

    assert_eq!(
        response.last_sync,
        Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap()
    );
    let assignments = response.data.assignments.expect("assignments returned");
    assert_eq!(assignments[0].server_id, Some(17));
    assert!(assignments[0].is_grade_encrypted());
    assert!(response.data.courses.is_none());
    assert_eq!(response.data.study_sessions, Some(vec![]));
}

#[tokio::test]
async fn test_sync_push_unauthorized_maps_to_api_error() {
    let (server, gateway) = common::setup_gateway().await;
    common::mount_status(&server, "POST", "/api/sync", 401).await;

    let err = gateway
        .sync_push(&request_with_ciphertext_grade())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_sync_push_server_error_is_transient() {
    let (server, gateway) = common::setup_gateway().await;
    common::mount_status(&server, "POST", "/api/sync", 503).await;

    let err = gateway
        .sync_push(&request_with_ciphertext_grade())
        .await
        .unwrap_err();

    let api_err = err.downcast_ref::<ApiError>().expect("ApiError in chain");
    assert!(api_err.is_transient());
}
