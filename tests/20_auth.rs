mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_me_logout() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let email = common::unique_email("auth");

    let res = client
        .post(server.url("/register"))
        .json(&json!({
            "name": "Auth Flow",
            "email": email,
            "password": common::PASSWORD,
            "password_confirmation": common::PASSWORD,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["user"]["role"], "user", "{}", body);
    assert!(body["data"]["user"].get("password_hash").is_none(), "hash leaked: {}", body);

    let res = client
        .post(server.url("/login"))
        .json(&json!({ "email": email, "password": common::PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let token = res.json::<Value>().await?["data"]["token"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    let res = client.get(server.url("/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["email"], email);

    let res = client.post(server.url("/logout")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "revoked token still accepted");

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_a_field_error() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let payload = json!({
        "name": "Twice",
        "email": common::unique_email("twice"),
        "password": common::PASSWORD,
        "password_confirmation": common::PASSWORD,
    });

    let first = client.post(server.url("/register")).json(&payload).send().await?;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client.post(server.url("/register")).json(&payload).send().await?;
    assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = second.json::<Value>().await?;
    assert_eq!(body["errors"]["email"][0], "The email has already been taken.");

    Ok(())
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/login"))
        .json(&json!({ "email": common::unique_email("ghost"), "password": "nope-nope" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<Value>().await?;
    assert_eq!(body["errors"]["email"][0], "Invalid credentials");

    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_token() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();

    for path in ["/me", "/customers", "/customers/dashboard/summary"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{} without token", path);
    }

    let res = client.get(server.url("/me")).bearer_auth("not-a-jwt").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
