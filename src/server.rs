use std::sync::Arc;

use quorumfs_core::{NodeRegistry, PeerCapability, Result};
use quorumfs_quorum::Coordinator;
use quorumfs_replica::ReplicaStore;
use quorumfs_rpc::{ClientService, PeerService};

use crate::config::QuorumfsConfig;

/// Top-level node process: owns the Replica Store and Coordinator for
/// this node and drives the bootstrap sequence (§4.6) before serving.
pub struct QuorumfsServer {
    config: QuorumfsConfig,
    registry: Arc<NodeRegistry>,
    local_store: Arc<ReplicaStore>,
    coordinator: Arc<Coordinator>,
}

impl QuorumfsServer {
    /// Validates the config, seeds this node's replica set from
    /// `filesSource`, and builds the registry and coordinator. Does not
    /// yet bind a socket — call `start` for that.
    pub async fn bootstrap(config: QuorumfsConfig) -> Result<Self> {
        let registry = Arc::new(config.build_registry()?);

        tracing::info!(
            node = %registry.local(),
            coordinator = %registry.coordinator(),
            is_coordinator = registry.is_coordinator(),
            "bootstrapping node"
        );

        let output_dir = std::path::PathBuf::from("./created_files");
        let local_store = Arc::new(
            ReplicaStore::bootstrap(
                registry.local().clone(),
                output_dir,
                &config.files_source,
            )
            .await?,
        );

        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&registry),
            Arc::clone(&local_store),
            config.n_r,
            config.n_w,
        ));

        Ok(Self {
            config,
            registry,
            local_store,
            coordinator,
        })
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Binds this node's TCP listener and serves both multiplexed
    /// namespaces forever.
    pub async fn start(&self) -> Result<()> {
        let addr = self.config.local_addr()?;

        let client: Arc<dyn ClientService> = Arc::clone(&self.coordinator) as Arc<dyn ClientService>;
        let peer: Arc<dyn PeerService> = Arc::clone(&self.coordinator) as Arc<dyn PeerService>;
        let local: Arc<dyn PeerCapability> =
            Arc::clone(&self.local_store) as Arc<dyn PeerCapability>;

        quorumfs_rpc::serve(&addr.socket_addr_string(), client, peer, local).await
    }
}
