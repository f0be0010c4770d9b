//! Quota-aware API key rotation for the IP-fraud provider.
//!
//! A pool of individually quota-limited keys is presented to callers as one
//! reliable credential. On first use every key is probed concurrently
//! against a fixed low-cost request; afterwards the pool pointer only moves
//! forward, past keys whose responses carried the provider's quota-exceeded
//! signal. An exhausted key is never retried until a fresh process runs a
//! new startup check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::config::{KEY_PROBE_IP, STARTUP_PROBE_WAIT};
use crate::error_handling::ProviderError;
use crate::gateway::{GatewayResponse, ProviderGateway};

/// Health of one pooled API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Not yet probed.
    Untested,
    /// Probe succeeded, or could not reach the probe endpoint (fail open).
    Live,
    /// The provider reported this key's quota as exhausted.
    Exhausted,
}

/// One pooled credential with its health state.
#[derive(Debug, Clone)]
struct ApiKeyEntry {
    key: String,
    status: KeyStatus,
}

/// Ordered key pool with a forward-only current pointer.
///
/// Array order is priority order. The pointer only moves forward, except at
/// the startup probe where it may jump to the first Live entry.
#[derive(Debug)]
struct KeyPool {
    entries: Vec<ApiKeyEntry>,
    current: usize,
}

impl KeyPool {
    fn new(keys: Vec<String>) -> Self {
        let entries = keys
            .into_iter()
            .map(|key| ApiKeyEntry {
                key,
                status: KeyStatus::Untested,
            })
            .collect();
        Self {
            entries,
            current: 0,
        }
    }

    fn current_key(&self) -> Option<String> {
        self.entries.get(self.current).map(|e| e.key.clone())
    }

    /// Applies probe results and moves the pointer to the first Live key.
    /// When every key tested Exhausted the pointer stays at 0; requests are
    /// still attempted in case the provider serves stale-quota-window
    /// capacity.
    fn apply_probe_results(&mut self, statuses: &[KeyStatus]) {
        for (entry, status) in self.entries.iter_mut().zip(statuses) {
            entry.status = *status;
        }
        if let Some(first_live) = self
            .entries
            .iter()
            .position(|e| e.status == KeyStatus::Live)
        {
            self.current = first_live;
        }
    }

    /// Marks the given key Exhausted and advances the pointer to the next
    /// non-Exhausted key at or after the current position. If none exists
    /// the pointer does not move.
    fn mark_exhausted_and_advance(&mut self, used_key: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == used_key) {
            entry.status = KeyStatus::Exhausted;
        }
        let next = self
            .entries
            .iter()
            .enumerate()
            .skip(self.current)
            .find(|(_, e)| e.status != KeyStatus::Exhausted)
            .map(|(i, _)| i);
        if let Some(i) = next {
            self.current = i;
        }
    }
}

/// Makes a pool of quota-limited keys look like one reliable credential.
pub struct KeyRotationGateway {
    gateway: ProviderGateway,
    fraud_base: String,
    quota_signal: String,
    pool: Mutex<KeyPool>,
    probe_started: AtomicBool,
    probe_done_tx: watch::Sender<bool>,
    probe_done_rx: watch::Receiver<bool>,
}

impl KeyRotationGateway {
    /// Creates a gateway for the IP-fraud provider at `fraud_base` with the
    /// given key pool (priority order) and quota-signal substring.
    pub fn new(
        gateway: ProviderGateway,
        fraud_base: impl Into<String>,
        keys: Vec<String>,
        quota_signal: impl Into<String>,
    ) -> Self {
        let (probe_done_tx, probe_done_rx) = watch::channel(false);
        Self {
            gateway,
            fraud_base: fraud_base.into(),
            quota_signal: quota_signal.into().to_lowercase(),
            pool: Mutex::new(KeyPool::new(keys)),
            probe_started: AtomicBool::new(false),
            probe_done_tx,
            probe_done_rx,
        }
    }

    /// Pool access tolerant of a poisoned lock; pool mutations cannot panic
    /// so a poisoned guard's data is still consistent.
    fn pool(&self) -> std::sync::MutexGuard<'_, KeyPool> {
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fraud_url(&self, key: &str, ip: &str) -> String {
        format!(
            "{}/fraud/ip/{}/{}?strictness=1&allow_public_access_points=true&lighter_penalties=true",
            self.fraud_base, key, ip
        )
    }

    fn has_quota_signal(&self, body: &str) -> bool {
        body.to_lowercase().contains(&self.quota_signal)
    }

    /// Checks an IP against the fraud provider using the current pool key.
    ///
    /// The response is returned to the caller as-is; if its body carries the
    /// quota signal the used key is marked Exhausted and the pointer
    /// advances, affecting only the *next* request. There is no automatic
    /// retry within a call.
    pub async fn check_ip(self: &Arc<Self>, ip: &str) -> Result<GatewayResponse, ProviderError> {
        let key = self
            .pool()
            .current_key()
            .ok_or_else(|| ProviderError::Configuration("IPQS_API_KEY not set".to_string()))?;

        self.wait_for_startup_probe().await;

        // Re-read: the probe may have moved the pointer.
        let key = self.pool().current_key().unwrap_or(key);

        let response = self
            .gateway
            .get_with(
                &self.fraud_url(&key, ip),
                &[("Accept", "application/json")],
                self.gateway.timeout(),
            )
            .await?;

        if self.has_quota_signal(&response.body) {
            warn!("IP-fraud API key exhausted its quota, rotating to next key");
            let mut pool = self.pool();
            pool.mark_exhausted_and_advance(&key);
            debug!("key pool pointer now at index {}", pool.current);
        }

        Ok(response)
    }

    /// Blocks until the startup health check has finished, up to a fixed
    /// ceiling. If the check has not completed by then the request proceeds
    /// with the default pointer rather than hanging.
    async fn wait_for_startup_probe(self: &Arc<Self>) {
        if !self.probe_started.swap(true, Ordering::SeqCst) {
            let gateway = Arc::clone(self);
            tokio::spawn(async move {
                gateway.run_startup_probe().await;
            });
        }

        let mut done = self.probe_done_rx.clone();
        if !*done.borrow() {
            let _ = tokio::time::timeout(STARTUP_PROBE_WAIT, done.wait_for(|d| *d)).await;
        }
    }

    /// Probes every pooled key concurrently against the fixed low-cost
    /// target and applies the results.
    ///
    /// A quota signal in the probe body marks the key Exhausted; a network
    /// error counts as Live, since an unreachable test endpoint should not
    /// disable a key outright.
    pub async fn run_startup_probe(self: &Arc<Self>) {
        self.probe_started.store(true, Ordering::SeqCst);
        let keys: Vec<String> = self.pool().entries.iter().map(|e| e.key.clone()).collect();

        let probes = keys.iter().map(|key| {
            let url = self.fraud_url(key, KEY_PROBE_IP);
            async move {
                match self.gateway.get(&url).await {
                    Ok(response) if self.has_quota_signal(&response.body) => KeyStatus::Exhausted,
                    Ok(_) => KeyStatus::Live,
                    Err(_) => KeyStatus::Live,
                }
            }
        });
        let statuses: Vec<KeyStatus> = join_all(probes).await;

        let live = statuses.iter().filter(|s| **s == KeyStatus::Live).count();
        info!(
            "key health check complete: {}/{} keys live",
            live,
            statuses.len()
        );

        self.pool().apply_probe_results(&statuses);
        let _ = self.probe_done_tx.send(true);
    }

    /// Current pool statuses, in priority order.
    pub fn key_statuses(&self) -> Vec<KeyStatus> {
        self.pool().entries.iter().map(|e| e.status).collect()
    }

    /// Index of the key the next request will use.
    pub fn current_index(&self) -> usize {
        self.pool().current
    }

    /// Whether the pool holds any keys.
    pub fn has_keys(&self) -> bool {
        !self.pool().entries.is_empty()
    }
}
