use std::sync::Arc;

use quorumfs_core::{FileName, QfsError};
use quorumfs_rpc::{ClientService, RpcClient};

use crate::config::QuorumfsConfig;

/// Command-file driven CLI client (§4.9).
///
/// Reads a command file line by line against a fixed node topology:
///   `client <id>`      — switch the active target node
///   `read <file>`      — issue `read_from_file` against the active node
///   `write <file> <text...>` — issue `write_to_file` against the active node
///
/// Malformed lines and connection failures are reported to stderr and do
/// not abort the run, mirroring the original script's tolerant handling.
/// Malformed commands surface as `QfsError::ClientUsageError` (§7), same
/// tagged-failure type the RPC paths use for everything else.
pub async fn run_commands(config: &QuorumfsConfig, script: &str) {
    let mut active: Option<Arc<RpcClient>> = None;

    for (line_no, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        match command {
            "client" => match select_client(config, rest) {
                Ok(client) => active = Some(client),
                Err(e) => eprintln!("line {}: {e}", line_no + 1),
            },
            "read" => {
                if let Err(e) = run_read(&active, rest).await {
                    eprintln!("line {}: {e}", line_no + 1);
                }
            }
            "write" => {
                if let Err(e) = run_write(&active, rest).await {
                    eprintln!("line {}: {e}", line_no + 1);
                }
            }
            other => {
                eprintln!(
                    "line {}: {}",
                    line_no + 1,
                    QfsError::ClientUsageError(format!("malformed command {other:?}"))
                );
            }
        }
    }
}

async fn run_read(active: &Option<Arc<RpcClient>>, rest: &str) -> Result<(), QfsError> {
    if rest.is_empty() {
        return Err(QfsError::ClientUsageError("usage: read <file>".to_string()));
    }
    let client = active
        .as_ref()
        .ok_or_else(|| QfsError::ClientUsageError("no client selected, run `client <id>` first".to_string()))?;

    match client.read_from_file(&FileName::new(rest)).await {
        Ok(content) => {
            println!("{content}");
            Ok(())
        }
        Err(e) => Err(QfsError::ClientUsageError(format!("read failed: {e}"))),
    }
}

async fn run_write(active: &Option<Arc<RpcClient>>, rest: &str) -> Result<(), QfsError> {
    let mut write_parts = rest.splitn(2, char::is_whitespace);
    let file = write_parts.next().unwrap_or("");
    let text = write_parts.next().unwrap_or("").trim();
    if file.is_empty() || text.is_empty() {
        return Err(QfsError::ClientUsageError(
            "usage: write <file> <text>".to_string(),
        ));
    }
    let client = active
        .as_ref()
        .ok_or_else(|| QfsError::ClientUsageError("no client selected, run `client <id>` first".to_string()))?;

    match client.write_to_file(&FileName::new(file), text).await {
        Ok(content) => {
            println!("{content}");
            Ok(())
        }
        Err(e) => Err(QfsError::ClientUsageError(format!("write failed: {e}"))),
    }
}

fn select_client(config: &QuorumfsConfig, id: &str) -> Result<Arc<RpcClient>, QfsError> {
    if id.is_empty() {
        return Err(QfsError::ClientUsageError("usage: client <id>".to_string()));
    }
    let (host, port) = config
        .node_info
        .get(id)
        .ok_or_else(|| QfsError::ClientUsageError(format!("unknown node id {id}")))?;
    Ok(Arc::new(RpcClient::new(quorumfs_core::NodeAddr::new(
        host.clone(),
        *port,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config() -> QuorumfsConfig {
        let mut node_info = HashMap::new();
        node_info.insert("1".to_string(), ("127.0.0.1".to_string(), 9001));

        QuorumfsConfig {
            max_nodes: 1,
            node_info,
            coordinator: "1".to_string(),
            current_node: "1".to_string(),
            node_set: "manual".to_string(),
            n_r: 1,
            n_w: 1,
            files_source: PathBuf::from("./files"),
        }
    }

    #[test]
    fn select_client_rejects_unknown_node_with_usage_error() {
        let err = select_client(&config(), "9").unwrap_err();
        assert!(matches!(err, QfsError::ClientUsageError(_)));
    }

    #[test]
    fn select_client_rejects_empty_id_with_usage_error() {
        let err = select_client(&config(), "").unwrap_err();
        assert!(matches!(err, QfsError::ClientUsageError(_)));
    }

    #[tokio::test]
    async fn read_without_selected_client_is_usage_error() {
        let err = run_read(&None, "a.txt").await.unwrap_err();
        assert!(matches!(err, QfsError::ClientUsageError(_)));
    }

    #[tokio::test]
    async fn write_with_missing_text_is_usage_error() {
        let err = run_write(&None, "a.txt").await.unwrap_err();
        assert!(matches!(err, QfsError::ClientUsageError(_)));
    }
}
