//! Publication record integration tests.

use sharer_service::models::ProjectDetails;
use sharer_service::services::directory::mock::MockSessionDirectory;
use sharer_service::services::object_store::mock::MockObjectStore;
use sharer_test_utils::{TestServerOptions, TestSharerServer};
use std::sync::Arc;

fn record() -> serde_json::Value {
    serde_json::json!({
        "sessionName": "standup",
        "identity": "alice",
        "trackSid": "TR_1",
        "source": "screen_share",
    })
}

/// A record is echoed and stored under the project's publication prefix.
#[tokio::test]
async fn test_publication_record_is_stored() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/publication-records", server.url()))
        .json(&record())
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body, record());

    let objects = server.object_store().objects();
    assert_eq!(objects.len(), 1);

    let object = &objects[0];
    assert_eq!(object.bucket, "sharer-bucket");
    assert_eq!(object.content_type, "application/json");
    assert!(
        object
            .key
            .starts_with("sharer-proj-1/standup/publication-records/alice/"),
        "unexpected key {}",
        object.key
    );
    assert!(object.key.ends_with("/record.json"));

    let stored: serde_json::Value = serde_json::from_slice(&object.body)?;
    assert_eq!(stored, record());

    Ok(())
}

/// The project's bucket and name decide where records land.
#[tokio::test]
async fn test_publication_record_uses_project_bucket() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn_with(TestServerOptions {
        directory: Arc::new(MockSessionDirectory::new().with_project(Some(ProjectDetails {
            id: "p-9".to_string(),
            name: "events".to_string(),
            bucket_name: "events-media".to_string(),
        }))),
        ..Default::default()
    })
    .await?;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/publication-records", server.url()))
        .json(&record())
        .send()
        .await?;

    let objects = server.object_store().objects();
    assert_eq!(objects[0].bucket, "events-media");
    assert!(objects[0].key.starts_with("events-p-9/standup/"));

    Ok(())
}

/// Storage failures never fail the request.
#[tokio::test]
async fn test_publication_record_storage_is_best_effort() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn_with(TestServerOptions {
        object_store: Arc::new(MockObjectStore::failing()),
        ..Default::default()
    })
    .await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/publication-records", server.url()))
        .json(&record())
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let server = TestSharerServer::spawn_with(TestServerOptions {
        directory: Arc::new(MockSessionDirectory::new().with_project(None)),
        ..Default::default()
    })
    .await?;

    let response = client
        .post(format!("{}/api/publication-records", server.url()))
        .json(&record())
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    assert!(server.object_store().objects().is_empty());

    Ok(())
}

/// Relative path segments never reach the bucket; the record is still echoed.
#[tokio::test]
async fn test_publication_record_with_relative_identity() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();
    let body = serde_json::json!({
        "sessionName": "standup",
        "identity": "..",
    });

    let response = client
        .post(format!("{}/api/publication-records", server.url()))
        .json(&body)
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<serde_json::Value>().await?, body);
    assert!(server.object_store().objects().is_empty());

    Ok(())
}

/// Records without a session name or identity are rejected.
#[tokio::test]
async fn test_publication_record_requires_fields() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/publication-records", server.url()))
        .json(&serde_json::json!({ "identity": "alice" }))
        .send()
        .await?;

    assert!(response.status().is_client_error());
    assert!(server.object_store().objects().is_empty());

    Ok(())
}
