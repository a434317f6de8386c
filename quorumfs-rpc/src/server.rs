use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use quorumfs_core::{PeerCapability, QfsError, Result};

use crate::api::{ClientService, PeerService};
use crate::framing::{read_frame, write_frame};
use crate::wire::{WireRequest, WireResponse};

/// Dispatches one decoded request against the local node's handlers.
///
/// `client` and `peer` are backed by the same `Coordinator` in practice
/// (it implements both namespaces), while `local` is the node's own
/// `ReplicaStore` servicing the leaf peer capability ops directly —
/// kept as a separate parameter so this function never has to know
/// about `quorumfs-quorum` or `quorumfs-replica` at all.
pub async fn dispatch_request(
    request: WireRequest,
    client: &dyn ClientService,
    peer: &dyn PeerService,
    local: &dyn PeerCapability,
) -> WireResponse {
    match request {
        WireRequest::ReadFromFile { file } => {
            WireResponse::from_result(client.read_from_file(&file).await.map(WireResponse::Text))
        }
        WireRequest::WriteToFile { file, update } => WireResponse::from_result(
            client
                .write_to_file(&file, &update)
                .await
                .map(WireResponse::Text),
        ),
        WireRequest::ForwardedReadFromFile { file, exclude } => WireResponse::from_result(
            peer.forwarded_read_from_file(&file, exclude.as_deref())
                .await
                .map(WireResponse::Text),
        ),
        WireRequest::ForwardedWriteToFile {
            file,
            update,
            exclude,
        } => WireResponse::from_result(
            peer.forwarded_write_to_file(&file, &update, exclude.as_deref())
                .await
                .map(WireResponse::Text),
        ),
        WireRequest::GetFileVersion { file } => WireResponse::from_result(
            local
                .get_file_version(&file)
                .await
                .map(WireResponse::Version),
        ),
        WireRequest::ReadFileFromNode { file } => WireResponse::from_result(
            local
                .read_file_from_node(&file)
                .await
                .map(WireResponse::Text),
        ),
        WireRequest::AppendToSpecificFile {
            file,
            update,
            new_version,
        } => WireResponse::from_result(
            local
                .append_with_version(&file, &update, new_version)
                .await
                .map(WireResponse::Text),
        ),
        WireRequest::UpdateFileToText {
            file,
            full_content,
            new_version,
        } => WireResponse::from_result(
            local
                .overwrite_with_version(&file, &full_content, new_version)
                .await
                .map(WireResponse::Text),
        ),
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    client: Arc<dyn ClientService>,
    peer: Arc<dyn PeerService>,
    local: Arc<dyn PeerCapability>,
) -> Result<()> {
    loop {
        let payload = match read_frame(&mut stream).await {
            Ok(bytes) => bytes,
            Err(_) => return Ok(()), // peer closed the connection
        };

        let request: WireRequest = bincode::deserialize(&payload)
            .map_err(|e| QfsError::TransportError(e.to_string()))?;

        let response = dispatch_request(request, client.as_ref(), peer.as_ref(), local.as_ref()).await;
        let response_bytes =
            bincode::serialize(&response).map_err(|e| QfsError::TransportError(e.to_string()))?;
        write_frame(&mut stream, &response_bytes).await?;
    }
}

/// Binds `addr` and serves both multiplexed namespaces on it forever, one
/// Tokio task per inbound connection.
pub async fn serve(
    addr: &str,
    client: Arc<dyn ClientService>,
    peer: Arc<dyn PeerService>,
    local: Arc<dyn PeerCapability>,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| QfsError::TransportError(e.to_string()))?;

    tracing::info!(%addr, "peer RPC listener bound");

    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "failed to accept connection");
                continue;
            }
        };

        tracing::debug!(%peer_addr, "accepted connection");

        let client = Arc::clone(&client);
        let peer_handle = Arc::clone(&peer);
        let local = Arc::clone(&local);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, client, peer_handle, local).await {
                tracing::warn!(%peer_addr, error = %e, "connection ended with error");
            }
        });
    }
}
