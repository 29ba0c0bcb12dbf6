use std::time::Duration;

use reqwest::{header, multipart, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::cli::session::Session;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not logged in, run `desk auth login` first")]
    NotLoggedIn,

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {message}{}", render_field_errors(.errors))]
    Api {
        status: StatusCode,
        message: String,
        errors: Option<Value>,
    },
}

fn render_field_errors(errors: &Option<Value>) -> String {
    let Some(Value::Object(fields)) = errors else {
        return String::new();
    };

    let mut out = String::new();
    for (field, messages) in fields {
        for message in messages.as_array().into_iter().flatten() {
            out.push_str(&format!("\n  {}: {}", field, message.as_str().unwrap_or_default()));
        }
    }
    out
}

/// Downloaded attachment
pub struct Download {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Thin HTTP wrapper over the customer desk API
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(session: &Session) -> Result<Self, ClientError> {
        let mut base = Url::parse(&session.server_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base,
            token: session.token.clone(),
        })
    }

    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// GET /health; a 503 is an answer, not a failure
    pub async fn health(&self) -> Result<(StatusCode, Value), ClientError> {
        let response = self.http.get(self.url("health")?).send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let request = self.request(Method::GET, path)?.query(query);
        self.send(request).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let request = self.request(Method::POST, path)?.json(body);
        self.send(request).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let request = self.request(Method::PUT, path)?.json(body);
        self.send(request).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        let request = self.request(Method::DELETE, path)?;
        self.send(request).await
    }

    pub async fn upload(&self, path: &str, file_name: &str, bytes: Vec<u8>) -> Result<Value, ClientError> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let request = self.request(Method::POST, path)?.multipart(form);
        self.send(request).await
    }

    pub async fn download(&self, path: &str, query: &[(&str, String)]) -> Result<Download, ClientError> {
        let response = self.request(Method::GET, path)?.query(query).send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let file_name = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name);
        let bytes = response.bytes().await?.to_vec();

        Ok(Download { file_name, bytes })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let builder = self
            .http
            .request(method, self.url(path)?)
            .header(header::ACCEPT, "application/json");

        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Sends and unwraps the success envelope to its body
    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        Ok(response.json::<Value>().await?)
    }

    async fn failure(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        ClientError::Api {
            status,
            message: body["message"]
                .as_str()
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed"))
                .to_string(),
            errors: body.get("errors").cloned(),
        }
    }
}

/// `attachment; filename="customers.csv"` -> `customers.csv`
fn attachment_file_name(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
