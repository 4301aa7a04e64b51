// ============================================
// File: crates/fleetsim-api/src/http.rs
// ============================================
//! # HTTP Backend Client
//!
//! ## Creation Reason
//! The reqwest-backed implementation of [`DeviceApi`] used against a real
//! device-management service.
//!
//! ## Main Functionality
//! - `HttpDeviceApi`: one shared HTTP client for the whole fleet
//! - URL joining tolerant of stray slashes on either side
//! - Status-code mapping into the typed `ApiError` taxonomy
//!
//! ## ⚠️ Important Note for Next Developer
//! - The authorize request must send the pre-serialized body bytes from
//!   `SignedAuthRequest` verbatim; re-serializing would invalidate the
//!   signature
//! - 204 on the update poll means "no update", not an error
//!
//! ## Last Modified
//! v0.1.0 - Initial HTTP client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::models::{
    Credential, DeploymentLog, DeploymentStatus, InventoryAttribute, SignedAuthRequest,
    StatusReport, UpdateInfo,
};
use crate::traits::DeviceApi;

/// Header carrying the detached signature of the authorize body.
pub const SIGNATURE_HEADER: &str = "X-MEN-Signature";

// ============================================
// HttpDeviceApi
// ============================================

/// HTTP implementation of the device-management backend API.
///
/// One instance serves every device in the fleet; it holds no per-device
/// state, so sharing it behind an `Arc` is safe and keeps a single
/// connection pool.
pub struct HttpDeviceApi {
    base_url: String,
    http: Client,
}

impl HttpDeviceApi {
    /// Creates a client for the given backend base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Maps an authenticated-call response to the typed error taxonomy.
    async fn check_authenticated(response: Response) -> Result<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::CredentialRejected),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::status(status.as_u16(), body))
            }
        }
    }
}

impl std::fmt::Debug for HttpDeviceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDeviceApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl DeviceApi for HttpDeviceApi {
    async fn authorize(&self, request: &SignedAuthRequest) -> Result<Credential> {
        let url = self.url("/authentication/auth_requests");

        let response = self
            .http
            .post(&url)
            .header(SIGNATURE_HEADER, &request.signature)
            .header(CONTENT_TYPE, "application/json")
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let token = response.text().await?;
            debug!("authorization accepted");
            return Ok(Credential::new(token.trim()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::status(status.as_u16(), body))
    }

    async fn submit_inventory(
        &self,
        credential: &Credential,
        attributes: &[InventoryAttribute],
    ) -> Result<()> {
        let url = self.url("/inventory/device/attributes");

        let response = self
            .http
            .patch(&url)
            .bearer_auth(credential.as_str())
            .json(attributes)
            .send()
            .await?;

        Self::check_authenticated(response).await?;
        Ok(())
    }

    async fn poll_update(&self, credential: &Credential) -> Result<Option<UpdateInfo>> {
        let url = self.url("/deployments/device/update");

        let response = self
            .http
            .get(&url)
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let response = Self::check_authenticated(response).await?;
        let update: UpdateInfo = response
            .json()
            .await
            .map_err(|e| ApiError::decode("update poll body", e.to_string()))?;
        Ok(Some(update))
    }

    async fn report_status(
        &self,
        credential: &Credential,
        deployment_id: &str,
        status: DeploymentStatus,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/deployments/device/deployments/{deployment_id}/status"
        ));

        let response = self
            .http
            .put(&url)
            .bearer_auth(credential.as_str())
            .json(&StatusReport { status })
            .send()
            .await?;

        Self::check_authenticated(response).await?;
        Ok(())
    }

    async fn report_log(
        &self,
        credential: &Credential,
        deployment_id: &str,
        log: &DeploymentLog,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/deployments/device/deployments/{deployment_id}/log"
        ));

        let response = self
            .http
            .put(&url)
            .bearer_auth(credential.as_str())
            .json(log)
            .send()
            .await?;

        Self::check_authenticated(response).await?;
        Ok(())
    }

    async fn fetch_image(&self, uri: &str) -> Result<Vec<u8>> {
        let response = self.http.get(uri).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::status(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

// ============================================
// URL joining
// ============================================

/// Joins a base URL and a path with exactly one slash between them.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("foo", "bar"), "foo/bar");
        assert_eq!(join_url("foo/", "bar"), "foo/bar");
        assert_eq!(join_url("foo/", "/bar"), "foo/bar");
        assert_eq!(join_url("foo", "/bar"), "foo/bar");
    }

    #[test]
    fn test_endpoint_urls() {
        let api = HttpDeviceApi::new("http://backend:8080/api/devices/v1/", Duration::from_secs(5));
        assert_eq!(
            api.url("/deployments/device/update"),
            "http://backend:8080/api/devices/v1/deployments/device/update"
        );
    }
}
