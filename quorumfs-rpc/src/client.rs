use tokio::net::TcpStream;
use tokio::sync::Mutex;

use async_trait::async_trait;
use quorumfs_core::{FileName, NodeAddr, PeerCapability, QfsError, Result, Version};

use crate::api::{ClientService, PeerService};
use crate::framing::{read_frame, write_frame};
use crate::wire::{WireRequest, WireResponse};

/// A peer connection, lazily established and reconnected on failure.
///
/// One `RpcClient` speaks to exactly one remote node's multiplexed TCP
/// endpoint; it serves both the `client_server` and `server` namespaces
/// over the same connection, since the wire envelope distinguishes them.
pub struct RpcClient {
    target: NodeAddr,
    conn: Mutex<Option<TcpStream>>,
}

impl RpcClient {
    pub fn new(target: NodeAddr) -> Self {
        Self {
            target,
            conn: Mutex::new(None),
        }
    }

    async fn call(&self, request: WireRequest) -> Result<WireResponse> {
        let mut guard = self.conn.lock().await;

        if guard.is_none() {
            let stream = TcpStream::connect(self.target.socket_addr_string())
                .await
                .map_err(|e| QfsError::TransportError(e.to_string()))?;
            *guard = Some(stream);
        }

        let result = self.send_on(guard.as_mut().unwrap(), &request).await;
        if result.is_err() {
            // Drop the connection so the next call reconnects from scratch.
            *guard = None;
        }
        result
    }

    async fn send_on(&self, stream: &mut TcpStream, request: &WireRequest) -> Result<WireResponse> {
        let payload = bincode::serialize(request)
            .map_err(|e| QfsError::TransportError(e.to_string()))?;
        write_frame(stream, &payload).await?;

        let response_bytes = read_frame(stream).await?;
        let response: WireResponse = bincode::deserialize(&response_bytes)
            .map_err(|e| QfsError::TransportError(e.to_string()))?;
        Ok(response)
    }

    fn text(response: WireResponse) -> Result<String> {
        match response {
            WireResponse::Text(s) => Ok(s),
            WireResponse::Err(msg) => Err(QfsError::TransportError(msg)),
            WireResponse::Version(_) => Err(QfsError::TransportError(
                "peer returned a version where text was expected".to_string(),
            )),
        }
    }

    fn version(response: WireResponse) -> Result<Version> {
        match response {
            WireResponse::Version(v) => Ok(v),
            WireResponse::Err(msg) => Err(QfsError::TransportError(msg)),
            WireResponse::Text(_) => Err(QfsError::TransportError(
                "peer returned text where a version was expected".to_string(),
            )),
        }
    }
}

#[async_trait]
impl PeerCapability for RpcClient {
    async fn get_file_version(&self, file: &FileName) -> Result<Version> {
        let response = self
            .call(WireRequest::GetFileVersion { file: file.clone() })
            .await?;
        Self::version(response)
    }

    async fn read_file_from_node(&self, file: &FileName) -> Result<String> {
        let response = self
            .call(WireRequest::ReadFileFromNode { file: file.clone() })
            .await?;
        Self::text(response)
    }

    async fn append_with_version(
        &self,
        file: &FileName,
        update: &str,
        new_version: Version,
    ) -> Result<String> {
        let response = self
            .call(WireRequest::AppendToSpecificFile {
                file: file.clone(),
                update: update.to_string(),
                new_version,
            })
            .await?;
        Self::text(response)
    }

    async fn overwrite_with_version(
        &self,
        file: &FileName,
        content: &str,
        new_version: Version,
    ) -> Result<String> {
        let response = self
            .call(WireRequest::UpdateFileToText {
                file: file.clone(),
                full_content: content.to_string(),
                new_version,
            })
            .await?;
        Self::text(response)
    }
}

#[async_trait]
impl ClientService for RpcClient {
    async fn read_from_file(&self, file: &FileName) -> Result<String> {
        let response = self
            .call(WireRequest::ReadFromFile { file: file.clone() })
            .await?;
        Self::text(response)
    }

    async fn write_to_file(&self, file: &FileName, update: &str) -> Result<String> {
        let response = self
            .call(WireRequest::WriteToFile {
                file: file.clone(),
                update: update.to_string(),
            })
            .await?;
        Self::text(response)
    }
}

#[async_trait]
impl PeerService for RpcClient {
    async fn forwarded_read_from_file(
        &self,
        file: &FileName,
        exclude: Option<&str>,
    ) -> Result<String> {
        let response = self
            .call(WireRequest::ForwardedReadFromFile {
                file: file.clone(),
                exclude: exclude.map(|s| s.to_string()),
            })
            .await?;
        Self::text(response)
    }

    async fn forwarded_write_to_file(
        &self,
        file: &FileName,
        update: &str,
        exclude: Option<&str>,
    ) -> Result<String> {
        let response = self
            .call(WireRequest::ForwardedWriteToFile {
                file: file.clone(),
                update: update.to_string(),
                exclude: exclude.map(|s| s.to_string()),
            })
            .await?;
        Self::text(response)
    }
}
