use async_trait::async_trait;

use quorumfs_core::{FileName, Result};

/// The `client_server` namespace: operations a client issues against
/// whichever node it happens to be connected to.
#[async_trait]
pub trait ClientService: Send + Sync {
    async fn read_from_file(&self, file: &FileName) -> Result<String>;
    async fn write_to_file(&self, file: &FileName, update: &str) -> Result<String>;
}

/// The `server` namespace: peer-to-peer operations, including the
/// forwarding path a non-coordinator node uses to reach the coordinator.
#[async_trait]
pub trait PeerService: Send + Sync {
    async fn forwarded_read_from_file(
        &self,
        file: &FileName,
        exclude: Option<&str>,
    ) -> Result<String>;

    async fn forwarded_write_to_file(
        &self,
        file: &FileName,
        update: &str,
        exclude: Option<&str>,
    ) -> Result<String>;
}
