//! Recording lookup integration tests.

use sharer_service::models::{Recording, Session, SessionStatus, SHARER_SESSION_COMMENTS};
use sharer_service::services::directory::mock::{DirectoryOp, MockSessionDirectory};
use sharer_test_utils::{TestServerOptions, TestSharerServer};
use std::sync::Arc;

fn ended_session() -> Session {
    Session {
        id: "s-1".to_string(),
        name: "standup".to_string(),
        status: SessionStatus::Ended,
        comments: Some(SHARER_SESSION_COMMENTS.to_string()),
        started_at: Some(1_700_000_000_000),
        auto_recording: true,
        max_participants: 100,
        empty_timeout: 20000,
    }
}

fn track_recording(id: &str) -> Recording {
    Recording {
        id: id.to_string(),
        track_id: Some(format!("TR_{}", id)),
        egress_id: format!("EG_{}", id),
        started_at: Some(1_700_000_001_000),
        egress_type: "track".to_string(),
        status: "EGRESS_COMPLETE".to_string(),
        destination: Some(format!("sharer-proj-1/standup/{}.ogg", id)),
        room_name: "standup".to_string(),
        session_id: "s-1".to_string(),
    }
}

async fn spawn_with_directory(
    directory: MockSessionDirectory,
) -> Result<TestSharerServer, anyhow::Error> {
    TestSharerServer::spawn_with(TestServerOptions {
        directory: Arc::new(directory),
        ..Default::default()
    })
    .await
}

/// Listing combines session detail, egresses and the project bucket.
#[tokio::test]
async fn test_list_recordings() -> Result<(), anyhow::Error> {
    let server = spawn_with_directory(
        MockSessionDirectory::new()
            .with_sessions(vec![ended_session()])
            .with_egresses("s-1", vec![track_recording("r-1"), track_recording("r-2")]),
    )
    .await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .get(format!("{}/api/recordings/s-1", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["s3BucketName"], "sharer-bucket");
    assert_eq!(body["session"]["name"], "standup");
    assert_eq!(body["recordings"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["recordings"][0]["egressId"], "EG_r-1");

    Ok(())
}

/// Missing project details leave the bucket name empty.
#[tokio::test]
async fn test_list_recordings_without_project_details() -> Result<(), anyhow::Error> {
    let server = spawn_with_directory(
        MockSessionDirectory::new()
            .with_sessions(vec![ended_session()])
            .failing_on(DirectoryOp::ProjectDetails),
    )
    .await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .get(format!("{}/api/recordings/s-1", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["s3BucketName"], "");
    assert_eq!(body["recordings"], serde_json::json!([]));

    Ok(())
}

/// Unknown session is 404; an egress failure is a gateway error.
#[tokio::test]
async fn test_list_recordings_failures() -> Result<(), anyhow::Error> {
    let server = spawn_with_directory(
        MockSessionDirectory::new()
            .with_sessions(vec![ended_session()])
            .failing_on(DirectoryOp::ListEgresses),
    )
    .await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .get(format!("{}/api/recordings/missing", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!("{}/api/recordings/s-1", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 502);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "UPSTREAM_FAILURE");

    Ok(())
}

/// Media URL is resolved by the provider for a given object path.
#[tokio::test]
async fn test_media_url() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .get(format!("{}/api/recordings/s-1/media-url", server.url()))
        .query(&[("path", "sharer-proj-1/standup/r-1.ogg")])
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["url"], "https://media.mock/s-1/sharer-proj-1/standup/r-1.ogg");

    let response = client
        .get(format!("{}/api/recordings/s-1/media-url", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    assert_eq!(server.directory().call_count(DirectoryOp::MediaUrl), 1);

    Ok(())
}
