use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use quorumfs_core::{
    FileName, NodeId, NodeRegistry, PeerCapability, QfsError, Result, Version, UNKNOWN_VERSION,
};
use quorumfs_replica::ReplicaStore;
use quorumfs_rpc::{ClientService, PeerClientPool, PeerService};

use crate::peer_handle::PeerHandle;
use crate::sampling::sample_quorum;

/// The quorum-mediated read/write protocol, plus the forwarding rule that
/// lets a non-coordinator node participate transparently.
///
/// Owns one `tokio::sync::Mutex<()>` per file, entirely separate from the
/// Replica Store's own per-file mutex: this one serializes an entire
/// fan-out (possibly several peer RPCs) rather than a single disk op, so
/// it must be held across `.await` points.
pub struct Coordinator {
    registry: Arc<NodeRegistry>,
    local_store: Arc<ReplicaStore>,
    pool: Arc<PeerClientPool>,
    file_locks: RwLock<HashMap<FileName, Arc<Mutex<()>>>>,
    n_r: usize,
    n_w: usize,
}

impl Coordinator {
    pub fn new(
        registry: Arc<NodeRegistry>,
        local_store: Arc<ReplicaStore>,
        n_r: usize,
        n_w: usize,
    ) -> Self {
        let pool = Arc::new(PeerClientPool::new(Arc::clone(&registry)));
        Self {
            registry,
            local_store,
            pool,
            file_locks: RwLock::new(HashMap::new()),
            n_r,
            n_w,
        }
    }

    async fn file_lock(&self, file: &FileName) -> Arc<Mutex<()>> {
        if let Some(lock) = self.file_locks.read().await.get(file) {
            return Arc::clone(lock);
        }
        let mut locks = self.file_locks.write().await;
        Arc::clone(
            locks
                .entry(file.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Resolves a quorum member to a handle, applying the self-call
    /// optimization when the id matches this node.
    async fn handle_for(&self, id: &NodeId) -> Result<PeerHandle> {
        if id == self.registry.local() {
            Ok(PeerHandle::Local(Arc::clone(&self.local_store)))
        } else {
            Ok(PeerHandle::Remote(self.pool.get(id).await?))
        }
    }

    async fn handles_for(&self, ids: &[NodeId]) -> Result<Vec<PeerHandle>> {
        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            handles.push(self.handle_for(id).await?);
        }
        Ok(handles)
    }

    fn eligible_ids(&self) -> Vec<NodeId> {
        self.registry.ids().cloned().collect()
    }

    /// Implements §4.4.2: the coordinator's read fan-out.
    async fn run_coordinated_read(&self, file: &FileName, exclude: Option<&NodeId>) -> Result<String> {
        if !self.local_store.is_tracked(file).await {
            return Err(QfsError::UnknownFile(file.to_string()));
        }

        let lock = self.file_lock(file).await;
        let _guard = lock.lock().await;

        let quorum = self.registry_quorum(exclude, self.n_r)?;
        let handles = self.handles_for(&quorum).await?;

        let (freshest_idx, version) = self.probe_freshest(file, &handles).await?;
        if version == UNKNOWN_VERSION {
            return Err(QfsError::QuorumUnavailable(format!(
                "no quorum member reported a valid version for {file}"
            )));
        }

        handles[freshest_idx].read_file_from_node(file).await
    }

    /// Implements §4.4.3: the coordinator's write fan-out.
    async fn run_coordinated_write(
        &self,
        file: &FileName,
        update: &str,
        exclude: Option<&NodeId>,
    ) -> Result<String> {
        if !self.local_store.is_tracked(file).await {
            return Err(QfsError::UnknownFile(file.to_string()));
        }

        let lock = self.file_lock(file).await;
        let _guard = lock.lock().await;

        let quorum = self.registry_quorum(exclude, self.n_w)?;
        let handles = self.handles_for(&quorum).await?;

        let (freshest_idx, version) = self.probe_freshest(file, &handles).await?;
        if version == UNKNOWN_VERSION {
            return Err(QfsError::QuorumUnavailable(format!(
                "no quorum member reported a valid version for {file}"
            )));
        }

        let new_version = version + 1;
        let new_content = handles[freshest_idx]
            .append_with_version(file, update, new_version)
            .await?;

        for (i, handle) in handles.iter().enumerate() {
            if i == freshest_idx {
                continue;
            }
            handle
                .overwrite_with_version(file, &new_content, new_version)
                .await?;
        }

        Ok(new_content)
    }

    async fn probe_freshest(
        &self,
        file: &FileName,
        handles: &[PeerHandle],
    ) -> Result<(usize, Version)> {
        let mut best: Option<(usize, Version)> = None;
        for (i, handle) in handles.iter().enumerate() {
            let version = handle.get_file_version(file).await?;
            tracing::trace!(file = %file, member = i, version, "probed quorum member version");
            match best {
                Some((_, best_version)) if version <= best_version => {}
                _ => best = Some((i, version)),
            }
        }
        best.ok_or_else(|| {
            QfsError::QuorumUnavailable(format!("empty quorum probed for {file}"))
        })
    }

    fn registry_quorum(&self, exclude: Option<&NodeId>, k: usize) -> Result<Vec<NodeId>> {
        let all = self.eligible_ids();
        sample_quorum(&all, exclude, k)
    }
}

#[async_trait]
impl ClientService for Coordinator {
    async fn read_from_file(&self, file: &FileName) -> Result<String> {
        let start = Instant::now();
        tracing::info!(file = %file, "read_from_file: start");

        let result = if self.registry.is_coordinator() {
            self.run_coordinated_read(file, None).await
        } else {
            let coordinator = self.pool.get(self.registry.coordinator()).await?;
            coordinator.forwarded_read_from_file(file, None).await
        };

        tracing::info!(file = %file, elapsed_ms = start.elapsed().as_millis() as u64, ok = result.is_ok(), "read_from_file: end");
        result
    }

    async fn write_to_file(&self, file: &FileName, update: &str) -> Result<String> {
        let start = Instant::now();
        tracing::info!(file = %file, "write_to_file: start");

        let result = if self.registry.is_coordinator() {
            self.run_coordinated_write(file, update, None).await
        } else {
            let coordinator = self.pool.get(self.registry.coordinator()).await?;
            coordinator
                .forwarded_write_to_file(file, update, None)
                .await
        };

        tracing::info!(file = %file, elapsed_ms = start.elapsed().as_millis() as u64, ok = result.is_ok(), "write_to_file: end");
        result
    }
}

#[async_trait]
impl PeerService for Coordinator {
    async fn forwarded_read_from_file(
        &self,
        file: &FileName,
        exclude: Option<&str>,
    ) -> Result<String> {
        if !self.registry.is_coordinator() {
            return Err(QfsError::NotCoordinator);
        }
        let exclude = exclude.map(NodeId::from);
        self.run_coordinated_read(file, exclude.as_ref()).await
    }

    async fn forwarded_write_to_file(
        &self,
        file: &FileName,
        update: &str,
        exclude: Option<&str>,
    ) -> Result<String> {
        if !self.registry.is_coordinator() {
            return Err(QfsError::NotCoordinator);
        }
        let exclude = exclude.map(NodeId::from);
        self.run_coordinated_write(file, update, exclude.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    use quorumfs_core::NodeAddr;

    async fn single_node_coordinator() -> (Coordinator, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let node = NodeId::from("1");

        let store = ReplicaStore::empty(node.clone(), dir.path().to_path_buf());
        store.track(FileName::new("a.txt"), "").await.unwrap();

        let mut nodes = Map::new();
        nodes.insert(node.clone(), NodeAddr::new("127.0.0.1", 9000));
        let registry =
            Arc::new(NodeRegistry::new(nodes, node.clone(), node.clone(), 1, 1).unwrap());

        (
            Coordinator::new(registry, Arc::new(store), 1, 1),
            dir,
        )
    }

    #[tokio::test]
    async fn write_then_read_round_trips_via_self_call() {
        let (coordinator, _dir) = single_node_coordinator().await;
        let file = FileName::new("a.txt");

        let content = coordinator.write_to_file(&file, "hello").await.unwrap();
        assert_eq!(content, "hello\n");

        let read_back = coordinator.read_from_file(&file).await.unwrap();
        assert_eq!(read_back, "hello\n");
    }

    #[tokio::test]
    async fn unknown_file_is_rejected() {
        let (coordinator, _dir) = single_node_coordinator().await;
        let file = FileName::new("missing.txt");
        assert!(matches!(
            coordinator.read_from_file(&file).await,
            Err(QfsError::UnknownFile(_))
        ));
    }

    #[tokio::test]
    async fn forwarded_call_on_non_coordinator_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let local = NodeId::from("2");
        let coordinator_id = NodeId::from("1");

        let store = ReplicaStore::empty(local.clone(), dir.path().to_path_buf());
        store.track(FileName::new("a.txt"), "").await.unwrap();

        let mut nodes = Map::new();
        nodes.insert(coordinator_id.clone(), NodeAddr::new("127.0.0.1", 9000));
        nodes.insert(local.clone(), NodeAddr::new("127.0.0.1", 9001));
        let registry = Arc::new(
            NodeRegistry::new(nodes, coordinator_id, local, 2, 2).unwrap(),
        );

        let coordinator = Coordinator::new(registry, Arc::new(store), 2, 2);
        let file = FileName::new("a.txt");
        assert!(matches!(
            coordinator.forwarded_read_from_file(&file, None).await,
            Err(QfsError::NotCoordinator)
        ));
    }

    /// Quorum members that the coordinator never calls `client_server` or
    /// forwarding operations on in this test — only the four leaf
    /// `PeerCapability` RPCs reach them, so both service impls just error.
    struct UnusedService;

    #[async_trait]
    impl ClientService for UnusedService {
        async fn read_from_file(&self, _file: &FileName) -> Result<String> {
            Err(QfsError::NotCoordinator)
        }
        async fn write_to_file(&self, _file: &FileName, _update: &str) -> Result<String> {
            Err(QfsError::NotCoordinator)
        }
    }

    #[async_trait]
    impl PeerService for UnusedService {
        async fn forwarded_read_from_file(
            &self,
            _file: &FileName,
            _exclude: Option<&str>,
        ) -> Result<String> {
            Err(QfsError::NotCoordinator)
        }
        async fn forwarded_write_to_file(
            &self,
            _file: &FileName,
            _update: &str,
            _exclude: Option<&str>,
        ) -> Result<String> {
            Err(QfsError::NotCoordinator)
        }
    }

    async fn reserve_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Exercises the core algorithm (§4.4) across three real participants:
    /// the coordinator's own replica plus two peers reached over a real
    /// TCP socket, one of which starts strictly ahead in version. Covers
    /// freshest-wins selection among several candidates and propagation
    /// to every *other* quorum member (§8 invariants 2-4), not just the
    /// single-node self-call path the other tests above exercise.
    #[tokio::test]
    async fn write_resolves_freshest_peer_and_propagates_to_the_rest() {
        let file = FileName::new("a.txt");

        let dir1 = tempfile::tempdir().unwrap();
        let node1 = NodeId::from("1");
        let store1 = ReplicaStore::empty(node1.clone(), dir1.path().to_path_buf());
        store1.track(file.clone(), "").await.unwrap();

        // node 2 is seeded ahead of the others, so it must be resolved as
        // freshest regardless of the random order the quorum is probed in.
        let dir2 = tempfile::tempdir().unwrap();
        let node2 = NodeId::from("2");
        let store2 = Arc::new(ReplicaStore::empty(node2.clone(), dir2.path().to_path_buf()));
        store2.track(file.clone(), "").await.unwrap();
        store2.append_with_version(&file, "x", 2).await.unwrap();
        store2.append_with_version(&file, "y", 3).await.unwrap();

        let dir3 = tempfile::tempdir().unwrap();
        let node3 = NodeId::from("3");
        let store3 = Arc::new(ReplicaStore::empty(node3.clone(), dir3.path().to_path_buf()));
        store3.track(file.clone(), "").await.unwrap();

        let port2 = reserve_port().await;
        let port3 = reserve_port().await;

        for (store, port) in [(Arc::clone(&store2), port2), (Arc::clone(&store3), port3)] {
            let local: Arc<dyn PeerCapability> = store;
            let client: Arc<dyn ClientService> = Arc::new(UnusedService);
            let peer: Arc<dyn PeerService> = Arc::new(UnusedService);
            let addr = format!("127.0.0.1:{port}");
            tokio::spawn(async move {
                let _ = quorumfs_rpc::serve(&addr, client, peer, local).await;
            });
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let mut nodes = Map::new();
        nodes.insert(node1.clone(), NodeAddr::new("127.0.0.1", 0));
        nodes.insert(node2.clone(), NodeAddr::new("127.0.0.1", port2));
        nodes.insert(node3.clone(), NodeAddr::new("127.0.0.1", port3));

        let registry =
            Arc::new(NodeRegistry::new(nodes, node1.clone(), node1.clone(), 3, 3).unwrap());
        let coordinator = Coordinator::new(registry, Arc::new(store1), 3, 3);

        let written = coordinator.write_to_file(&file, "z").await.unwrap();
        assert_eq!(written, "x\ny\nz\n");

        // every quorum member now agrees on (content, version) — invariant 2.
        assert_eq!(store2.read_file_from_node(&file).await.unwrap(), "x\ny\nz\n");
        assert_eq!(store3.read_file_from_node(&file).await.unwrap(), "x\ny\nz\n");
        assert_eq!(store2.get_file_version(&file).await.unwrap(), 4);
        assert_eq!(store3.get_file_version(&file).await.unwrap(), 4);

        let read_back = coordinator.read_from_file(&file).await.unwrap();
        assert_eq!(read_back, "x\ny\nz\n");
    }
}
