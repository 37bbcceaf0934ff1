//! Admin session management integration tests.

use sharer_service::models::{Session, SessionStatus, SHARER_SESSION_COMMENTS};
use sharer_service::services::directory::mock::{DirectoryOp, MockSessionDirectory};
use sharer_test_utils::{TestServerOptions, TestSharerServer};
use std::sync::Arc;

fn sharer_session(id: &str, name: &str, status: SessionStatus, started_at: i64) -> Session {
    Session {
        id: id.to_string(),
        name: name.to_string(),
        status,
        comments: Some(SHARER_SESSION_COMMENTS.to_string()),
        started_at: Some(started_at),
        auto_recording: true,
        max_participants: 100,
        empty_timeout: 20000,
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

/// Overview lists only sharer sessions, split into active and ended.
#[tokio::test]
async fn test_admin_overview_partitions_sessions() -> Result<(), anyhow::Error> {
    let mut foreign = sharer_session("other-1", "other", SessionStatus::Started, 5);
    foreign.comments = None;

    let server = spawn_with_directory(MockSessionDirectory::new().with_sessions(vec![
        sharer_session("s-old", "retro", SessionStatus::Ended, 1),
        sharer_session("s-live", "standup", SessionStatus::Started, 2),
        sharer_session("s-new", "planning", SessionStatus::Ended, 3),
        foreign,
    ]))
    .await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .get(format!("{}/api/admin", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["settings"]["enabled"], true);
    assert_eq!(body["sessions"]["active"][0]["id"], "s-live");
    assert_eq!(body["sessions"]["active"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["sessions"]["ended"][0]["id"], "s-new");
    assert_eq!(body["sessions"]["ended"][1]["id"], "s-old");
    assert_eq!(body["sessions"]["ended"].as_array().map(Vec::len), Some(2));

    Ok(())
}

/// A provider outage leaves the admin page usable with empty lists.
#[tokio::test]
async fn test_admin_overview_degrades_when_listing_fails() -> Result<(), anyhow::Error> {
    let server =
        spawn_with_directory(MockSessionDirectory::new().failing_on(DirectoryOp::ListSessions))
            .await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .get(format!("{}/api/admin", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["sessions"]["active"], serde_json::json!([]));
    assert_eq!(body["sessions"]["ended"], serde_json::json!([]));

    // The raw listing has no fallback
    let response = client
        .get(format!("{}/api/sessions", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 502);

    Ok(())
}

/// Checkbox values other than "yes" turn a setting off; absent fields stay.
#[tokio::test]
async fn test_update_settings() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .post(format!("{}/api/admin/settings", server.url()))
        .header("cookie", &cookie)
        .form(&[
            ("enabled", "no"),
            ("enableCamera", "yes"),
            ("sessionName", "  Weekly Sync "),
        ])
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["enabled"], false);
    assert_eq!(body["enableCamera"], true);
    assert_eq!(body["enableAudio"], true);
    assert_eq!(body["recordSession"], true);
    assert_eq!(body["sessionName"], "Weekly Sync");

    let settings = server.settings().get();
    assert!(!settings.enabled);
    assert_eq!(settings.session_name.as_deref(), Some("Weekly Sync"));

    Ok(())
}

/// Creating without a configured name is rejected before any provider call.
#[tokio::test]
async fn test_create_session_requires_name() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .post(format!("{}/api/admin/sessions", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    assert_eq!(server.directory().call_count(DirectoryOp::CreateSession), 0);

    Ok(())
}

/// Create adopts the provider's canonical name into the settings.
#[tokio::test]
async fn test_create_session_adopts_canonical_name() -> Result<(), anyhow::Error> {
    let server = spawn_with_directory(MockSessionDirectory::new().canonicalizing_names()).await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    client
        .post(format!("{}/api/admin/settings", server.url()))
        .header("cookie", &cookie)
        .form(&[("sessionName", "Weekly Sync"), ("recordSession", "no")])
        .send()
        .await?;

    let response = client
        .post(format!("{}/api/admin/sessions", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["id"], "session-1");
    assert_eq!(body["name"], "weekly-sync");
    assert_eq!(body["comments"], SHARER_SESSION_COMMENTS);

    let created = server.directory().created_params();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Weekly Sync");
    assert!(!created[0].auto_recording);
    assert_eq!(created[0].max_participants, 100);
    assert_eq!(created[0].empty_timeout, 20000);

    assert_eq!(
        server.settings().get().session_name.as_deref(),
        Some("weekly-sync")
    );

    Ok(())
}

/// A running sharer session with the same name blocks creation.
#[tokio::test]
async fn test_create_session_name_collision() -> Result<(), anyhow::Error> {
    let server = spawn_with_directory(MockSessionDirectory::new().with_sessions(vec![
        sharer_session("s-1", "standup", SessionStatus::Started, 1),
    ]))
    .await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    client
        .post(format!("{}/api/admin/settings", server.url()))
        .header("cookie", &cookie)
        .form(&[("sessionName", "standup")])
        .send()
        .await?;

    let response = client
        .post(format!("{}/api/admin/sessions", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 409);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "SESSION_EXISTS");
    assert_eq!(
        body["error"]["message"],
        "Session with name standup already exists and running, please end the session first."
    );
    assert_eq!(server.directory().call_count(DirectoryOp::CreateSession), 0);

    Ok(())
}

/// Simultaneous creates with one name produce a single session.
#[tokio::test]
async fn test_concurrent_creates_yield_one_session() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    client
        .post(format!("{}/api/admin/settings", server.url()))
        .header("cookie", &cookie)
        .form(&[("sessionName", "standup")])
        .send()
        .await?;

    let requests: Vec<_> = (0..4)
        .map(|_| {
            let request = client
                .post(format!("{}/api/admin/sessions", server.url()))
                .header("cookie", &cookie);
            tokio::spawn(async move { request.send().await })
        })
        .collect();

    let mut statuses = Vec::new();
    for request in requests {
        statuses.push(request.await??.status().as_u16());
    }
    statuses.sort_unstable();

    assert_eq!(statuses, vec![201, 409, 409, 409]);
    assert_eq!(server.directory().call_count(DirectoryOp::CreateSession), 1);

    Ok(())
}

/// An ended session with the same name does not block creation.
#[tokio::test]
async fn test_create_session_ignores_ended_namesake() -> Result<(), anyhow::Error> {
    let server = spawn_with_directory(MockSessionDirectory::new().with_sessions(vec![
        sharer_session("s-1", "standup", SessionStatus::Ended, 1),
    ]))
    .await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    client
        .post(format!("{}/api/admin/settings", server.url()))
        .header("cookie", &cookie)
        .form(&[("sessionName", "standup")])
        .send()
        .await?;

    let response = client
        .post(format!("{}/api/admin/sessions", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 201);

    Ok(())
}

/// A session that is slow to become readable is still returned.
#[tokio::test]
async fn test_create_session_waits_for_readability() -> Result<(), anyhow::Error> {
    let server = spawn_with_directory(MockSessionDirectory::new().eventually_consistent(2)).await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    client
        .post(format!("{}/api/admin/settings", server.url()))
        .header("cookie", &cookie)
        .form(&[("sessionName", "standup")])
        .send()
        .await?;

    let response = client
        .post(format!("{}/api/admin/sessions", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 201);
    assert!(server.directory().call_count(DirectoryOp::GetSession) >= 1);

    Ok(())
}

/// End stops the session; delete removes it; a second delete is 404.
#[tokio::test]
async fn test_end_and_delete_session() -> Result<(), anyhow::Error> {
    let server = spawn_with_directory(MockSessionDirectory::new().with_sessions(vec![
        sharer_session("s-1", "standup", SessionStatus::Started, 1),
    ]))
    .await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .post(format!("{}/api/admin/sessions/s-1/end", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "Ended");

    let response = client
        .delete(format!("{}/api/admin/sessions/s-1", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 204);
    assert!(server.directory().sessions().is_empty());

    let response = client
        .delete(format!("{}/api/admin/sessions/s-1", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 404);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    Ok(())
}

/// Ending an unknown session is 404.
#[tokio::test]
async fn test_end_unknown_session() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .post(format!("{}/api/admin/sessions/missing/end", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;

    assert_eq!(response.status(), 404);
    Ok(())
}
