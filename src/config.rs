use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use quorumfs_core::{NodeAddr, NodeId, NodeRegistry, QfsError, Result};

/// On-disk JSON configuration, loaded once per process at startup.
///
/// Field names match the original deployment's config file format
/// exactly (`maxNodes`, `nodeInfo`, ...) so existing config files work
/// unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuorumfsConfig {
    #[serde(rename = "maxNodes")]
    pub max_nodes: u32,

    #[serde(rename = "nodeInfo")]
    pub node_info: HashMap<String, (String, u16)>,

    pub coordinator: String,

    #[serde(rename = "currentNode")]
    pub current_node: String,

    #[serde(rename = "nodeSet")]
    pub node_set: String,

    #[serde(rename = "Nr")]
    pub n_r: usize,

    #[serde(rename = "Nw")]
    pub n_w: usize,

    #[serde(rename = "filesSource")]
    pub files_source: PathBuf,
}

impl QuorumfsConfig {
    /// Loads and validates a configuration file. Validation failures are
    /// fatal (§6): node count mismatch, missing coordinator, missing
    /// current node, or a violated quorum inequality.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| QfsError::ConfigError(format!("reading config file: {e}")))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| QfsError::ConfigError(format!("parsing config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.node_info.len() != self.max_nodes as usize {
            return Err(QfsError::ConfigError(format!(
                "nodeInfo has {} entries, maxNodes says {}",
                self.node_info.len(),
                self.max_nodes
            )));
        }

        if !self.node_info.contains_key(&self.coordinator) {
            return Err(QfsError::ConfigError(format!(
                "coordinator {} is not present in nodeInfo",
                self.coordinator
            )));
        }

        let reserved_next = (self.max_nodes + 1).to_string();
        if !self.node_info.contains_key(&self.current_node) && self.current_node != reserved_next
        {
            return Err(QfsError::ConfigError(format!(
                "currentNode {} is neither in nodeInfo nor the reserved next-assign id {}",
                self.current_node, reserved_next
            )));
        }

        let n = self.max_nodes as usize;
        if self.n_w * 2 <= n {
            return Err(QfsError::ConfigError(format!(
                "Nw={} must be greater than N/2 (N={n})",
                self.n_w
            )));
        }
        if self.n_r + self.n_w <= n {
            return Err(QfsError::ConfigError(format!(
                "Nr + Nw ({} + {}) must be greater than N ({n})",
                self.n_r, self.n_w
            )));
        }

        Ok(())
    }

    /// Builds the static node registry described by this config.
    pub fn build_registry(&self) -> Result<NodeRegistry> {
        let nodes: HashMap<NodeId, NodeAddr> = self
            .node_info
            .iter()
            .map(|(id, (host, port))| (NodeId::new(id.clone()), NodeAddr::new(host.clone(), *port)))
            .collect();

        NodeRegistry::new(
            nodes,
            NodeId::new(self.coordinator.clone()),
            NodeId::new(self.current_node.clone()),
            self.n_r,
            self.n_w,
        )
    }

    pub fn local_addr(&self) -> Result<NodeAddr> {
        self.node_info
            .get(&self.current_node)
            .map(|(host, port)| NodeAddr::new(host.clone(), *port))
            .ok_or_else(|| {
                QfsError::ConfigError(format!("currentNode {} missing from nodeInfo", self.current_node))
            })
    }

    /// If `nodeSet == "auto"`, rewrites the config file in place with
    /// `currentNode` incremented by one — convenience for launching
    /// successive nodes off the same config file. Advisory only, not
    /// safe for concurrent multi-writer startup (§9).
    pub fn maybe_rewrite_next_node(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.node_set != "auto" {
            return Ok(());
        }

        let next_id: u32 = self
            .current_node
            .parse()
            .map_err(|_| QfsError::ConfigError("currentNode is not numeric; cannot auto-advance".into()))?;

        let mut next = self.clone();
        next.current_node = (next_id + 1).to_string();

        let content = serde_json::to_string_pretty(&next)
            .map_err(|e| QfsError::ConfigError(format!("serializing rewritten config: {e}")))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| QfsError::ConfigError(format!("rewriting config file: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuorumfsConfig {
        let mut node_info = HashMap::new();
        node_info.insert("1".to_string(), ("127.0.0.1".to_string(), 9001));
        node_info.insert("2".to_string(), ("127.0.0.1".to_string(), 9002));
        node_info.insert("3".to_string(), ("127.0.0.1".to_string(), 9003));

        QuorumfsConfig {
            max_nodes: 3,
            node_info,
            coordinator: "1".to_string(),
            current_node: "2".to_string(),
            node_set: "manual".to_string(),
            n_r: 2,
            n_w: 2,
            files_source: PathBuf::from("./files"),
        }
    }

    #[test]
    fn validates_a_well_formed_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn rejects_node_count_mismatch() {
        let mut config = sample();
        config.max_nodes = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_majority_write_quorum() {
        let mut config = sample();
        config.n_w = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn builds_registry_from_valid_config() {
        let registry = sample().build_registry().unwrap();
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_coordinator());
    }
}
