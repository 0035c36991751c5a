//! Integration tests for `GET /api/data`

use serde_json::json;

use studytrack_api::ApiError;
use studytrack_core::ports::IRemoteGateway;

use crate::common;

#[tokio::test]
async fn test_fetch_all_returns_snapshot() {
    let (server, gateway) = common::setup_gateway().await;
    common::mount_data(
        &server,
        json!({
            "assignments": [],
            "courses": [{
                "id": "c1",
                "serverId": 4,
                "name": "Physics",
                "currentGrade": "v1:opaque",
                "isGradeEncrypted": true,
                "gradeHistory": [
                    { "date": "2026-03-01T00:00:00Z", "grade": "v1:older", "isEncrypted": true }
                ]
            }],
            "studySessions": [{
                "id": "s1",
                "courseId": "c1",
                "date": "2026-03-02T18:00:00Z",
                "durationMinutes": 45
            }]
        }),
    )
    .await;

    let snapshot = gateway.fetch_all().await.expect("fetch_all failed");

    assert!(snapshot.assignments.is_empty());
    assert_eq!(snapshot.courses.len(), 1);
    assert_eq!(snapshot.courses[0].name, "Physics");
    assert!(snapshot.courses[0].is_grade_encrypted());
    assert_eq!(snapshot.courses[0].grade_history().len(), 1);
    assert_eq!(snapshot.study_sessions[0].duration_minutes, 45);
}

#[tokio::test]
async fn test_fetch_all_tolerates_missing_collections() {
    let (server, gateway) = common::setup_gateway().await;
    common::mount_data(&server, json!({})).await;

    let snapshot = gateway.fetch_all().await.expect("fetch_all failed");
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn test_fetch_all_invalid_body() {
    let (server, gateway) = common::setup_gateway().await;
    common::mount_data(&server, json!({ "courses": "not-a-list" })).await;

    let err = gateway.fetch_all().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_fetch_all_not_found() {
    let (server, gateway) = common::setup_gateway().await;
    common::mount_status(&server, "GET", "/api/data", 404).await;

    let err = gateway.fetch_all().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::NotFound(m)) if m == "backend says no"
    ));
}
