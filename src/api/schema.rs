//! Request and response bodies for the OpenProvider `v1beta` REST API.
//!
//! Every endpoint the adapter calls has its own response type here; the
//! `data` member of an [`ApiResponse`] is decoded into one of them and a
//! mismatch is reported as a schema error rather than read as empty.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RegistrarError, Result};

/// Message carried by the synthetic response produced when no token could
/// be obtained.
pub const REQUEST_FAILED: &str = "Request failed";

/// Envelope wrapped around every OpenProvider response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiResponse {
    /// Stand-in response returned when authentication did not yield a token.
    pub fn request_failed() -> Self {
        Self {
            error: Some(ErrorBody {
                message: REQUEST_FAILED.to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn message(&self) -> String {
        if let Some(error) = &self.error {
            return error.message.clone();
        }
        match (&self.desc, self.code) {
            (Some(desc), _) if !desc.is_empty() => desc.clone(),
            (_, Some(code)) => format!("request rejected with code {}", code),
            (_, None) => "response carried no status code".to_string(),
        }
    }

    /// Fail unless the upstream reported code 0.
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RegistrarError::Api {
                code: self.code,
                message: self.message(),
            })
        }
    }

    /// Check the status code and decode `data` into the endpoint's schema.
    pub fn into_data<T: DeserializeOwned>(self, endpoint: &str) -> Result<T> {
        let response = self.ensure_success()?;
        let data = response
            .data
            .ok_or_else(|| RegistrarError::schema(endpoint, "response has no data member"))?;

        serde_json::from_value(data).map_err(|e| RegistrarError::schema(endpoint, e.to_string()))
    }
}

// ---- requests -------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainName {
    pub name: String,
    pub extension: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CheckDomainsRequest {
    pub domains: Vec<DomainName>,
}

/// The four contact roles OpenProvider attaches to a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handles {
    pub owner_handle: String,
    pub admin_handle: String,
    pub tech_handle: String,
    pub billing_handle: String,
}

impl Handles {
    /// One customer in every role.
    pub fn uniform(handle: &str) -> Self {
        Self {
            owner_handle: handle.to_string(),
            admin_handle: handle.to_string(),
            tech_handle: handle.to_string(),
            billing_handle: handle.to_string(),
        }
    }
}

/// Body of both `POST /domains` and `POST /domains/transfer`.
#[derive(Debug, Serialize)]
pub struct CreateDomainRequest {
    pub domain: DomainName,
    pub period: u32,
    #[serde(flatten)]
    pub handles: Handles,
    pub ns_group: &'static str,
    pub autorenew: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenewDomainRequest {
    pub domain: DomainName,
    pub period: u32,
}

#[derive(Debug, Serialize)]
pub struct DeleteDomainRequest {
    pub skip_soft_quarantine: bool,
    pub force_delete: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Partial `PUT /domains/{id}`; only the fields that are set are sent.
#[derive(Debug, Default, Serialize)]
pub struct UpdateDomainRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_servers: Option<Vec<NameServer>>,
    #[serde(flatten)]
    pub handles: Option<Handles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private_whois_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameServer {
    pub name: String,
}

/// Body of `POST /customers` and `PUT /customers/{handle}`.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerPayload {
    pub email: String,
    pub phone: Phone,
    pub company_name: String,
    pub address: Address,
    pub name: PersonName,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub area_code: String,
    #[serde(default)]
    pub subscriber_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

// ---- responses ------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: String,
}

/// `data` of every list endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResultList<T> {
    #[serde(default)]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct DomainCheckResult {
    #[serde(default)]
    pub domain: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DomainSummary {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct DomainRecord {
    pub creation_date: String,
    pub expiration_date: String,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub is_private_whois_enabled: bool,
    #[serde(default)]
    pub name_servers: Vec<NameServer>,
    #[serde(default)]
    pub owner_handle: Option<String>,
    #[serde(default)]
    pub admin_handle: Option<String>,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerSummary {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerSummary {
    pub handle: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomerRecord {
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: PersonName,
    #[serde(default)]
    pub phone: Phone,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthCodeData {
    #[serde(default)]
    pub auth_code: Option<String>,
}
