mod common;

use anyhow::Result;
use reqwest::{multipart, StatusCode};
use serde_json::{json, Value};

fn customer_payload(tag: &str) -> Value {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    json!({
        "name": format!("{} Customer", tag),
        "email": format!("{}-{}@example.com", tag, suffix),
        "phone": format!("555-{}", &suffix[..12]),
        "company_name": format!("{} Corp", tag),
    })
}

#[tokio::test]
async fn customer_crud_round() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let token = common::register(server, &client, "crud").await?;
    let payload = customer_payload("crud");

    let res = client
        .post(server.url("/customers"))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<Value>().await?["data"].clone();
    assert_eq!(created["creator_name"], "crud", "{}", created);
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .get(server.url(&format!("/customers/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["email"], payload["email"]);

    let res = client
        .put(server.url(&format!("/customers/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "company_name": "Renamed Corp" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?["data"].clone();
    assert_eq!(updated["company_name"], "Renamed Corp");
    assert_eq!(updated["name"], payload["name"]);

    let res = client
        .delete(server.url(&format!("/customers/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url(&format!("/customers/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected_across_owners() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let first = common::register(server, &client, "owner-a").await?;
    let second = common::register(server, &client, "owner-b").await?;
    let payload = customer_payload("dup");

    let res = client
        .post(server.url("/customers"))
        .bearer_auth(&first)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(server.url("/customers"))
        .bearer_auth(&second)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<Value>().await?;
    assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
    assert_eq!(body["errors"]["phone"][0], "The phone has already been taken.");

    Ok(())
}

#[tokio::test]
async fn other_users_customers_are_forbidden() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let owner = common::register(server, &client, "mine").await?;
    let stranger = common::register(server, &client, "theirs").await?;

    let created = client
        .post(server.url("/customers"))
        .bearer_auth(&owner)
        .json(&customer_payload("private"))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let id = created["data"]["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .get(server.url(&format!("/customers/{}", id)))
        .bearer_auth(&stranger)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let list = client
        .get(server.url("/customers"))
        .bearer_auth(&stranger)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(list["data"]["total"], 0, "{}", list);

    Ok(())
}

#[tokio::test]
async fn import_export_and_summary() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let token = common::register(server, &client, "sheets").await?;

    let a = customer_payload("sheet-a");
    let b = customer_payload("sheet-b");
    let csv = format!(
        "Name,Email,Phone,Company Name\n{},{},{},{}\n{},{},{},{}\n,,,\nNo Email,,555-0000,Nowhere\n",
        a["name"].as_str().unwrap_or_default(),
        a["email"].as_str().unwrap_or_default(),
        a["phone"].as_str().unwrap_or_default(),
        a["company_name"].as_str().unwrap_or_default(),
        b["name"].as_str().unwrap_or_default(),
        b["email"].as_str().unwrap_or_default(),
        b["phone"].as_str().unwrap_or_default(),
        a["company_name"].as_str().unwrap_or_default(),
    );

    let upload = |bytes: Vec<u8>| {
        multipart::Form::new().part("file", multipart::Part::bytes(bytes).file_name("customers.csv"))
    };

    let res = client
        .post(server.url("/customers/process/import"))
        .bearer_auth(&token)
        .multipart(upload(csv.clone().into_bytes()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let report = res.json::<Value>().await?;
    assert_eq!(report["data"]["imported"], 2, "{}", report);
    assert_eq!(report["data"]["skipped_incomplete"], 1, "{}", report);

    // Same file again: every row is now a duplicate
    let res = client
        .post(server.url("/customers/process/import"))
        .bearer_auth(&token)
        .multipart(upload(csv.into_bytes()))
        .send()
        .await?;
    let report = res.json::<Value>().await?;
    assert_eq!(report["data"]["imported"], 0, "{}", report);
    assert_eq!(report["data"]["skipped_duplicate"], 2, "{}", report);

    let res = client
        .get(server.url("/customers/process/export"))
        .query(&[("format", "csv")])
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-disposition"]
        .to_str()?
        .contains("customers.csv"));
    let exported = res.text().await?;
    assert!(exported.contains(a["email"].as_str().unwrap_or_default()));
    assert!(exported.contains(b["email"].as_str().unwrap_or_default()));

    let summary = client
        .get(server.url("/customers/dashboard/summary"))
        .bearer_auth(&token)
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(summary["data"]["total_customers"], 2, "{}", summary);
    assert_eq!(summary["data"]["customers_today"], 2, "{}", summary);
    assert_eq!(summary["data"]["top_companies"][0]["company_name"], a["company_name"]);
    assert_eq!(summary["data"]["top_companies"][0]["total"], 2);

    Ok(())
}

#[tokio::test]
async fn unsupported_upload_type_is_a_file_error() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let token = common::register(server, &client, "pdf").await?;

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(b"%PDF-1.4".to_vec()).file_name("customers.pdf"),
    );
    let res = client
        .post(server.url("/customers/process/import"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<Value>().await?;
    assert_eq!(body["errors"]["file"][0], "The file field must be a file of type: csv, xlsx.");

    Ok(())
}

#[tokio::test]
async fn nul_cell_skips_its_row_and_keeps_the_rest() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let token = common::register(server, &client, "nul").await?;

    let good = customer_payload("nul-good");
    let bad = customer_payload("nul-bad");
    let csv = format!(
        "name,email,phone,company\n{},{},{},A\nBad\u{0}Name,{},{},A\n",
        good["name"].as_str().unwrap_or_default(),
        good["email"].as_str().unwrap_or_default(),
        good["phone"].as_str().unwrap_or_default(),
        bad["email"].as_str().unwrap_or_default(),
        bad["phone"].as_str().unwrap_or_default(),
    );
    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(csv.into_bytes()).file_name("customers.csv"),
    );
    let res = client
        .post(server.url("/customers/process/import"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let report = res.json::<Value>().await?;
    assert_eq!(report["data"]["imported"], 1, "{}", report);
    assert_eq!(report["data"]["skipped_incomplete"], 1, "{}", report);

    Ok(())
}

#[tokio::test]
async fn numeric_phone_is_stored_as_text() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let token = common::register(server, &client, "numeric").await?;

    let mut payload = customer_payload("numeric");
    let phone = u64::from_str_radix(&uuid::Uuid::new_v4().simple().to_string()[..12], 16)?;
    payload["phone"] = json!(phone);

    let res = client
        .post(server.url("/customers"))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["phone"], phone.to_string());

    payload["name"] = json!(true);
    let res = client
        .post(server.url("/customers"))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.json::<Value>().await?;
    assert_eq!(body["errors"]["name"][0], "The name field must be a string.");

    Ok(())
}
