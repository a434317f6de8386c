use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use quorumfs_core::{NodeId, NodeRegistry, QfsError, Result};

use crate::client::RpcClient;

/// Lazily-populated, `node_id`-keyed connection pool.
///
/// Created once per process and shared by the Quorum Engine's
/// `PeerHandle::Remote` variants and the client-facing forwarding path, so
/// repeated calls to the same peer reuse one `RpcClient` instead of
/// reconnecting every time.
pub struct PeerClientPool {
    registry: Arc<NodeRegistry>,
    clients: RwLock<HashMap<NodeId, Arc<RpcClient>>>,
}

impl PeerClientPool {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, id: &NodeId) -> Result<Arc<RpcClient>> {
        if let Some(client) = self.clients.read().await.get(id) {
            return Ok(Arc::clone(client));
        }

        let addr = self
            .registry
            .lookup(id)
            .ok_or_else(|| QfsError::ConfigError(format!("unknown node id {id}")))?
            .clone();

        let mut clients = self.clients.write().await;
        let client = clients
            .entry(id.clone())
            .or_insert_with(|| Arc::new(RpcClient::new(addr)));
        Ok(Arc::clone(client))
    }
}
