use std::sync::Arc;

use async_trait::async_trait;

use quorumfs_core::{FileName, PeerCapability, Result, Version};
use quorumfs_replica::ReplicaStore;
use quorumfs_rpc::RpcClient;

/// A quorum member reached either in-process or over the wire.
///
/// The Quorum Engine's fan-out logic is written entirely against
/// `PeerCapability` and never branches on which variant it holds — the
/// self-call optimization is just "this variant happens to be `Local`".
pub enum PeerHandle {
    Local(Arc<ReplicaStore>),
    Remote(Arc<RpcClient>),
}

#[async_trait]
impl PeerCapability for PeerHandle {
    async fn get_file_version(&self, file: &FileName) -> Result<Version> {
        match self {
            PeerHandle::Local(store) => store.get_file_version(file).await,
            PeerHandle::Remote(client) => client.get_file_version(file).await,
        }
    }

    async fn read_file_from_node(&self, file: &FileName) -> Result<String> {
        match self {
            PeerHandle::Local(store) => store.read_file_from_node(file).await,
            PeerHandle::Remote(client) => client.read_file_from_node(file).await,
        }
    }

    async fn append_with_version(
        &self,
        file: &FileName,
        update: &str,
        new_version: Version,
    ) -> Result<String> {
        match self {
            PeerHandle::Local(store) => store.append_with_version(file, update, new_version).await,
            PeerHandle::Remote(client) => {
                client.append_with_version(file, update, new_version).await
            }
        }
    }

    async fn overwrite_with_version(
        &self,
        file: &FileName,
        content: &str,
        new_version: Version,
    ) -> Result<String> {
        match self {
            PeerHandle::Local(store) => {
                store.overwrite_with_version(file, content, new_version).await
            }
            PeerHandle::Remote(client) => {
                client.overwrite_with_version(file, content, new_version).await
            }
        }
    }
}
