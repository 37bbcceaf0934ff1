//! Admin login integration tests.

use sharer_test_utils::{TestSharerServer, TEST_ROOT_PASSWORD, TEST_ROOT_USER};

#[tokio::test]
async fn test_admin_routes_require_login() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();

    for path in [
        "/api/admin",
        "/api/sessions",
        "/api/preview/s-1",
        "/api/recordings/s-1",
    ] {
        let response = client.get(format!("{}{}", server.url(), path)).send().await?;
        assert_eq!(response.status(), 401, "{} should require login", path);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    let response = client
        .post(format!("{}/api/admin/sessions", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_login_cookie_attributes() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/login", server.url()))
        .form(&[("username", TEST_ROOT_USER), ("password", TEST_ROOT_PASSWORD)])
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.starts_with("sessionId="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=86400"));

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["user"], TEST_ROOT_USER);

    Ok(())
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();

    for (username, password) in [
        (TEST_ROOT_USER, "wrong-password"),
        ("someone-else", TEST_ROOT_PASSWORD),
        ("", ""),
    ] {
        let response = client
            .post(format!("{}/api/login", server.url()))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        assert_eq!(response.status(), 401);
        assert!(response.headers().get("set-cookie").is_none());
    }

    Ok(())
}

#[tokio::test]
async fn test_cookie_grants_access_until_logout() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();
    let cookie = server.login(&client).await?;

    let response = client
        .get(format!("{}/api/admin", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{}/api/logout", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/api/admin", server.url()))
        .header("cookie", &cookie)
        .send()
        .await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_forged_cookie_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestSharerServer::spawn().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/admin", server.url()))
        .header("cookie", "sessionId=00000000-0000-0000-0000-000000000000")
        .send()
        .await?;

    assert_eq!(response.status(), 401);
    Ok(())
}
