use std::collections::HashMap;

use crate::error::{QfsError, Result};
use crate::node::{NodeAddr, NodeId};

/// Static node-id → address mapping, fixed for the lifetime of the process group.
///
/// Built once at bootstrap and never mutated afterward; every component that
/// needs topology (the Quorum Engine, the peer client factory) holds a shared
/// reference to the same registry instead of consulting ambient config state.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, NodeAddr>,
    coordinator: NodeId,
    local: NodeId,
}

impl NodeRegistry {
    /// Builds the registry, validating the quorum invariants:
    /// `Nw > N/2` and `Nr + Nw > N`, plus presence of the coordinator and
    /// local node ids.
    pub fn new(
        nodes: HashMap<NodeId, NodeAddr>,
        coordinator: NodeId,
        local: NodeId,
        n_r: usize,
        n_w: usize,
    ) -> Result<Self> {
        let n = nodes.len();

        if !nodes.contains_key(&coordinator) {
            return Err(QfsError::ConfigError(format!(
                "coordinator node {coordinator} is not present in nodeInfo"
            )));
        }

        if !nodes.contains_key(&local) {
            return Err(QfsError::ConfigError(format!(
                "current node {local} is not present in nodeInfo"
            )));
        }

        if n_w * 2 <= n {
            return Err(QfsError::ConfigError(format!(
                "write quorum Nw={n_w} must be greater than N/2 (N={n})"
            )));
        }

        if n_r + n_w <= n {
            return Err(QfsError::ConfigError(format!(
                "Nr + Nw ({n_r} + {n_w}) must be greater than N ({n})"
            )));
        }

        Ok(Self {
            nodes,
            coordinator,
            local,
        })
    }

    pub fn lookup(&self, id: &NodeId) -> Option<&NodeAddr> {
        self.nodes.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn coordinator(&self) -> &NodeId {
        &self.coordinator
    }

    pub fn local(&self) -> &NodeId {
        &self.local
    }

    pub fn is_coordinator(&self) -> bool {
        self.local == self.coordinator
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(ids: &[&str]) -> HashMap<NodeId, NodeAddr> {
        ids.iter()
            .map(|id| (NodeId::from(*id), NodeAddr::new("127.0.0.1", 9000)))
            .collect()
    }

    #[test]
    fn accepts_valid_quorum_config() {
        let registry = NodeRegistry::new(
            nodes(&["1", "2", "3", "4", "5"]),
            NodeId::from("1"),
            NodeId::from("3"),
            2,
            3,
        );
        assert!(registry.is_ok());
        assert!(!registry.unwrap().is_coordinator());
    }

    #[test]
    fn rejects_write_quorum_not_majority() {
        let registry = NodeRegistry::new(
            nodes(&["1", "2", "3", "4", "5"]),
            NodeId::from("1"),
            NodeId::from("1"),
            2,
            2,
        );
        assert!(registry.is_err());
    }

    #[test]
    fn rejects_non_overlapping_quorums() {
        let registry = NodeRegistry::new(
            nodes(&["1", "2", "3", "4", "5"]),
            NodeId::from("1"),
            NodeId::from("1"),
            1,
            3,
        );
        assert!(registry.is_err());
    }

    #[test]
    fn rejects_missing_coordinator() {
        let registry = NodeRegistry::new(
            nodes(&["1", "2", "3"]),
            NodeId::from("9"),
            NodeId::from("1"),
            2,
            2,
        );
        assert!(registry.is_err());
    }
}
