//! Scripted in-memory backend used by the simulator integration tests.
//!
//! The mock enforces the same credential discipline as the real backend:
//! every authenticated call is checked against the set of tokens it has
//! issued and not revoked; a mismatch surfaces as `CredentialRejected`.

#![allow(dead_code)] // not every test binary uses every helper

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use fleetsim_api::error::{ApiError, Result};
use fleetsim_api::models::{
    Credential, DeploymentLog, DeploymentStatus, InventoryAttribute, SignedAuthRequest,
    UpdateImage, UpdateInfo,
};
use fleetsim_api::DeviceApi;
use fleetsim_client::SessionSettings;

/// One scripted response of the update poll.
pub enum Poll {
    /// HTTP 204: nothing pending.
    NoUpdate,
    /// A pending deployment with this id.
    Update(&'static str),
}

#[derive(Default)]
pub struct MockApi {
    auth_rejections: AtomicUsize,
    auth_attempts: AtomicUsize,
    tokens_issued: AtomicUsize,
    valid_tokens: Mutex<HashSet<String>>,
    polls: Mutex<VecDeque<Poll>>,
    revoke_at: Mutex<Option<DeploymentStatus>>,
    statuses: Mutex<Vec<(String, DeploymentStatus)>>,
    inventory: Mutex<Vec<Vec<InventoryAttribute>>>,
    logs: Mutex<Vec<(String, DeploymentLog)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the first `n` authorize attempts before accepting.
    pub fn with_auth_rejections(self, n: usize) -> Self {
        self.auth_rejections.store(n, Ordering::SeqCst);
        self
    }

    /// Queues a pending deployment for a later poll.
    pub fn queue_update(&self, id: &'static str) {
        self.polls.lock().unwrap().push_back(Poll::Update(id));
    }

    /// Queues one empty poll response.
    pub fn queue_no_update(&self) {
        self.polls.lock().unwrap().push_back(Poll::NoUpdate);
    }

    /// Arms a one-shot credential revocation that fires when the given
    /// status is next reported: the report is rejected and the token
    /// invalidated.
    pub fn revoke_when_reporting(&self, status: DeploymentStatus) {
        *self.revoke_at.lock().unwrap() = Some(status);
    }

    /// Marks a token as currently valid without going through authorize.
    pub fn set_valid_token(&self, token: &str) {
        self.valid_tokens.lock().unwrap().insert(token.to_string());
    }

    pub fn auth_attempts(&self) -> usize {
        self.auth_attempts.load(Ordering::SeqCst)
    }

    pub fn tokens_issued(&self) -> usize {
        self.tokens_issued.load(Ordering::SeqCst)
    }

    pub fn inventory_count(&self) -> usize {
        self.inventory.lock().unwrap().len()
    }

    pub fn statuses(&self) -> Vec<(String, DeploymentStatus)> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<(String, DeploymentLog)> {
        self.logs.lock().unwrap().clone()
    }

    fn check(&self, credential: &Credential) -> Result<()> {
        if self.valid_tokens.lock().unwrap().contains(credential.as_str()) {
            Ok(())
        } else {
            Err(ApiError::CredentialRejected)
        }
    }
}

#[async_trait]
impl DeviceApi for MockApi {
    async fn authorize(&self, _request: &SignedAuthRequest) -> Result<Credential> {
        let attempt = self.auth_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.auth_rejections.load(Ordering::SeqCst) {
            return Err(ApiError::status(401, "device not yet admitted"));
        }
        let serial = self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("token-{serial}");
        self.valid_tokens.lock().unwrap().insert(token.clone());
        Ok(Credential::new(token))
    }

    async fn submit_inventory(
        &self,
        credential: &Credential,
        attributes: &[InventoryAttribute],
    ) -> Result<()> {
        self.check(credential)?;
        self.inventory.lock().unwrap().push(attributes.to_vec());
        Ok(())
    }

    async fn poll_update(&self, credential: &Credential) -> Result<Option<UpdateInfo>> {
        self.check(credential)?;
        match self.polls.lock().unwrap().pop_front() {
            Some(Poll::Update(id)) => Ok(Some(UpdateInfo {
                id: id.to_string(),
                image: UpdateImage {
                    uri: format!("http://images.local/{id}"),
                },
            })),
            Some(Poll::NoUpdate) | None => Ok(None),
        }
    }

    async fn report_status(
        &self,
        credential: &Credential,
        deployment_id: &str,
        status: DeploymentStatus,
    ) -> Result<()> {
        self.check(credential)?;

        let mut revoke_at = self.revoke_at.lock().unwrap();
        if *revoke_at == Some(status) {
            // One-shot: the report is rejected and the token dies with it
            *revoke_at = None;
            self.valid_tokens.lock().unwrap().remove(credential.as_str());
            return Err(ApiError::CredentialRejected);
        }
        drop(revoke_at);

        self.statuses
            .lock()
            .unwrap()
            .push((deployment_id.to_string(), status));
        Ok(())
    }

    async fn report_log(
        &self,
        credential: &Credential,
        deployment_id: &str,
        log: &DeploymentLog,
    ) -> Result<()> {
        self.check(credential)?;
        self.logs
            .lock()
            .unwrap()
            .push((deployment_id.to_string(), log.clone()));
        Ok(())
    }

    async fn fetch_image(&self, _uri: &str) -> Result<Vec<u8>> {
        Ok(vec![0u8; 64])
    }
}

/// Session settings tuned for tests: no simulated waits, one update.
pub fn test_settings(state_dir: &Path) -> SessionSettings {
    SessionSettings {
        tenant_token: "dummy".to_string(),
        seq_no: 1,
        attributes: vec![InventoryAttribute {
            name: "device_type".to_string(),
            value: "fake-device".to_string(),
        }],
        inventory_interval: Duration::from_secs(60),
        max_wait: Duration::ZERO,
        fail_message: None,
        store_images: false,
        state_dir: state_dir.to_path_buf(),
        update_limit: 1,
    }
}

/// Yields to the runtime so spawned tasks can observe timer advances.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
