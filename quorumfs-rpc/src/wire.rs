use serde::{Deserialize, Serialize};

use quorumfs_core::{FileName, Version};

/// The wire-level request envelope. One enum carries both multiplexed
/// service namespaces (`client_server` and `server`) so a single
/// `TcpListener` can dispatch either without a second port — the Rust
/// stand-in for the original system's `TMultiplexedProcessor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WireRequest {
    // client_server namespace
    ReadFromFile {
        file: FileName,
    },
    WriteToFile {
        file: FileName,
        update: String,
    },

    // server (peer) namespace
    ForwardedReadFromFile {
        file: FileName,
        exclude: Option<String>,
    },
    ForwardedWriteToFile {
        file: FileName,
        update: String,
        exclude: Option<String>,
    },
    GetFileVersion {
        file: FileName,
    },
    ReadFileFromNode {
        file: FileName,
    },
    AppendToSpecificFile {
        file: FileName,
        update: String,
        new_version: Version,
    },
    UpdateFileToText {
        file: FileName,
        full_content: String,
        new_version: Version,
    },
}

/// The wire-level response envelope. `Err` carries the stringified
/// `QfsError` display form; the receiving end re-wraps it as a
/// `QfsError::TransportError` since the original variant tag does not
/// survive the wire (matching the single-tagged-failure model of §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WireResponse {
    Text(String),
    Version(Version),
    Err(String),
}

impl WireResponse {
    pub fn from_result(result: Result<WireResponse, quorumfs_core::QfsError>) -> WireResponse {
        match result {
            Ok(resp) => resp,
            Err(e) => WireResponse::Err(e.to_string()),
        }
    }
}
