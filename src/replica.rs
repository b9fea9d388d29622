use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::warn;

/// A static, ordered list of replica base URLs with a process-lifetime
/// rotation cursor. Membership never changes at runtime and there is no
/// health awareness: a down replica stays in the rotation.
#[derive(Debug, Clone)]
pub struct ReplicaSet {
    addrs: Vec<String>,
    cursor: Arc<AtomicUsize>,
}

impl ReplicaSet {
    /// Build a replica set from base URLs. The list must be non-empty.
    pub fn new(addrs: Vec<String>) -> ReplicaSet {
        assert!(!addrs.is_empty(), "replica set requires at least one address");
        ReplicaSet {
            addrs,
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Next address in round-robin order: the address at the current cursor,
    /// after which the cursor advances modulo the list length.
    pub fn next(&self) -> &str {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        &self.addrs[i % self.addrs.len()]
    }

    /// All addresses in fixed configuration order, for failover scans.
    pub fn all(&self) -> &[String] {
        &self.addrs
    }
}

/// Issue a best-effort POST whose outcome the caller never observes.
///
/// This is the propagation primitive of the whole system: cache
/// invalidations and peer sync calls go through here, and a failure is
/// logged and swallowed so the initiating write still reports success.
pub async fn propagate(client: &reqwest::Client, url: String) {
    if let Err(e) = client.post(&url).send().await {
        warn!(%url, "Propagation call failed: {e}");
    }
}
