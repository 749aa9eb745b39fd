//! Authorization gate in front of every remote call.
//!
//! The host may or may not provide a key-selection capability. When it is
//! missing the session is unauthorized, never the other way around.
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Host-provided key selection.
#[async_trait]
pub trait KeyPortal: Send + Sync {
    async fn has_selected_api_key(&self) -> AppResult<bool>;

    /// Runs the interactive selection flow. Returning `Ok` says nothing about
    /// whether a key was actually chosen.
    async fn open_select_key(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub enum HostCapability {
    Available(Arc<dyn KeyPortal>),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum AuthOutcome {
    Authorized,
    /// The flow finished but no key was confirmed.
    Declined,
    Unavailable,
    Failed(String),
}

/// Polling used to confirm a key after the selection flow returns.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        ConfirmPolicy {
            attempts: 3,
            interval: Duration::from_millis(250),
        }
    }
}

pub struct AccessGate {
    capability: HostCapability,
    policy: ConfirmPolicy,
    confirmed: AtomicBool,
}

impl AccessGate {
    pub fn new(capability: HostCapability, policy: ConfirmPolicy) -> Self {
        AccessGate {
            capability,
            policy,
            confirmed: AtomicBool::new(false),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(HostCapability::Unavailable, ConfirmPolicy::default())
    }

    /// Queries the host. Errors and a missing capability both read as `false`.
    pub async fn is_authorized(&self) -> bool {
        let portal = match &self.capability {
            HostCapability::Available(portal) => portal,
            HostCapability::Unavailable => return false,
        };
        if self.confirmed.load(Ordering::Acquire) {
            return true;
        }
        match portal.has_selected_api_key().await {
            Ok(true) => {
                self.confirmed.store(true, Ordering::Release);
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!("API key check failed: {}", e);
                false
            }
        }
    }

    /// Runs the selection flow and waits for the host to confirm a key.
    pub async fn request_authorization(&self) -> AuthOutcome {
        let portal = match &self.capability {
            HostCapability::Available(portal) => portal.clone(),
            HostCapability::Unavailable => {
                tracing::warn!("Authorization requested but no key portal is available");
                return AuthOutcome::Unavailable;
            }
        };

        if let Err(e) = portal.open_select_key().await {
            tracing::error!("Key selection flow failed: {}", e);
            return AuthOutcome::Failed(e.to_string());
        }

        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            match portal.has_selected_api_key().await {
                Ok(true) => {
                    self.confirmed.store(true, Ordering::Release);
                    tracing::info!(attempt, "API key confirmed");
                    return AuthOutcome::Authorized;
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(attempt, "API key check failed: {}", e),
            }
            if attempt < attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }
        tracing::info!("No API key confirmed after {} checks", attempts);
        AuthOutcome::Declined
    }

    /// Forgets a cached confirmation, e.g. after the key was cleared.
    pub fn revoke(&self) {
        self.confirmed.store(false, Ordering::Release);
    }

    /// `Ok` only when authorized; used as the fail-closed check before remote calls.
    pub async fn ensure_authorized(&self) -> AppResult<()> {
        if self.is_authorized().await {
            Ok(())
        } else {
            Err(AppError::Unauthorized("no API key selected".to_string()))
        }
    }
}

/// In-memory key holder; the portal the HTTP shell drives and the Gemini
/// client reads from.
#[derive(Clone, Default)]
pub struct KeyStore {
    key: Arc<RwLock<Option<String>>>,
}

impl KeyStore {
    pub fn new(initial: Option<String>) -> Self {
        let initial = initial.filter(|k| !k.trim().is_empty());
        KeyStore {
            key: Arc::new(RwLock::new(initial)),
        }
    }

    pub async fn select(&self, key: impl Into<String>) {
        let key = key.into();
        let mut slot = self.key.write().await;
        *slot = Some(key.trim().to_string()).filter(|k| !k.is_empty());
    }

    pub async fn clear(&self) {
        *self.key.write().await = None;
    }

    pub async fn current(&self) -> Option<String> {
        self.key.read().await.clone()
    }
}

#[async_trait]
impl KeyPortal for KeyStore {
    async fn has_selected_api_key(&self) -> AppResult<bool> {
        Ok(self.key.read().await.is_some())
    }

    /// Keys arrive through [`KeyStore::select`]; nothing to open here.
    async fn open_select_key(&self) -> AppResult<()> {
        Ok(())
    }
}
