use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::journal::{self, Outcome};
use super::schema::{ApiResponse, LoginData, LoginRequest};
use crate::config::RegistrarConfig;
use crate::error::{RegistrarError, Result};

const API_VERSION_PATH: &str = "/v1beta";
const LOGIN_PATH: &str = "/auth/login";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Bearer-token HTTP client for the OpenProvider REST API.
///
/// The token is requested on first use and kept for the lifetime of the
/// client. There is no expiry tracking and nothing is retried.
pub struct ApiClient {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
    debug: bool,
    token: Mutex<Option<String>>,
}

enum Payload {
    Query(Vec<(String, String)>),
    Json(Value),
}

impl Payload {
    fn journal_value(&self) -> Value {
        match self {
            Payload::Query(params) => Value::Object(
                params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<Map<_, _>>(),
            ),
            Payload::Json(body) => body.clone(),
        }
    }
}

impl ApiClient {
    pub fn new(config: &RegistrarConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}{}",
                config.api_url().trim_end_matches('/'),
                API_VERSION_PATH
            ),
            username: config.username().to_string(),
            password: config.password().to_string(),
            debug: config.debug(),
            token: Mutex::new(None),
        })
    }

    /// Versioned base URL every request path is appended to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Cached bearer token, logging in first if there is none yet.
    ///
    /// `None` when the login call failed or returned an empty token; the
    /// next call will try again.
    pub async fn access_token(&self) -> Option<String> {
        let mut token = self.token.lock().await;
        if let Some(existing) = token.as_ref() {
            return Some(existing.clone());
        }

        match self.login().await {
            Ok(fresh) if !fresh.is_empty() => {
                debug!("Obtained OpenProvider access token");
                *token = Some(fresh.clone());
                Some(fresh)
            }
            Ok(_) => {
                warn!("OpenProvider login returned an empty token");
                None
            }
            Err(e) => {
                warn!("OpenProvider login failed: {}", e);
                None
            }
        }
    }

    async fn login(&self) -> Result<String> {
        let url = format!("{}{}", self.endpoint, LOGIN_PATH);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await?;

        let body = response.bytes().await?;
        let parsed: ApiResponse = serde_json::from_slice(&body)
            .map_err(|e| RegistrarError::schema("POST /auth/login", e.to_string()))?;

        let data: LoginData = parsed.into_data("POST /auth/login")?;
        Ok(data.token)
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse> {
        let params = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.execute(Method::GET, path, Payload::Query(params)).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn delete<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        self.send_json(Method::DELETE, path, body).await
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse> {
        let body = serde_json::to_value(body)?;
        self.execute(method, path, Payload::Json(body)).await
    }

    async fn execute(&self, method: Method, path: &str, payload: Payload) -> Result<ApiResponse> {
        let data = payload.journal_value();

        let Some(token) = self.access_token().await else {
            let failed = ApiResponse::request_failed();
            let response = serde_json::to_value(&failed).unwrap_or_default();
            journal::record(method.as_str(), path, &data, Outcome::Response(&response));
            return Ok(failed);
        };

        let url = format!("{}{}", self.endpoint, path);

        let request = self.client.request(method.clone(), &url).bearer_auth(token);
        let request = match &payload {
            Payload::Query(params) => request.query(params),
            Payload::Json(body) => request.json(body),
        };

        debug!("{} {}", method, url);
        if self.debug {
            debug!(request = %data, "OpenProvider request body");
        }

        let result = self.dispatch(request, &method, path).await;

        match &result {
            Ok(response) => {
                let response = serde_json::to_value(response).unwrap_or_default();
                journal::record(method.as_str(), path, &data, Outcome::Response(&response));
            }
            Err(e) => {
                let error = e.to_string();
                journal::record(method.as_str(), path, &data, Outcome::Error(&error));
            }
        }

        result
    }

    async fn dispatch(
        &self,
        request: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<ApiResponse> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if self.debug {
            debug!(
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&body),
                "OpenProvider response body"
            );
        }

        match serde_json::from_slice::<ApiResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) if status.is_success() => Err(RegistrarError::schema(
                format!("{} {}", method, path),
                e.to_string(),
            )),
            Err(_) => Err(RegistrarError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = RegistrarConfig::new("user", "pw", "https://api.openprovider.eu/").unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "https://api.openprovider.eu/v1beta");
    }

    #[test]
    fn test_query_payload_journal_value() {
        let payload = Payload::Query(vec![("full_name".to_string(), "example.com".to_string())]);
        assert_eq!(
            payload.journal_value(),
            serde_json::json!({ "full_name": "example.com" })
        );
    }
}
