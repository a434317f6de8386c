use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use quorumfs_core::{
    error::{QfsError, Result},
    file::FileName,
    node::NodeId,
    traits::PeerCapability,
    version::{Version, FIRST_VERSION, UNKNOWN_VERSION},
};

/// One node's view of one file: the version counter plus the mutex that
/// brackets the local disk operation touching it.
///
/// This mutex is deliberately narrow in scope (§4.2 of the design): it is
/// acquired and released within a single `local_append`/`local_overwrite`
/// call. It is *not* the same lock as the coordinator's per-file protocol
/// mutex in `quorumfs-quorum`, which spans an entire fan-out.
struct FileEntry {
    version: Mutex<Version>,
}

/// Per-node on-disk replica set plus in-memory version map.
///
/// `ReplicaStore` implements `PeerCapability` directly, so the Quorum
/// Engine's `PeerHandle::Local` variant can hold an `Arc<ReplicaStore>` and
/// call these methods without any network round trip.
pub struct ReplicaStore {
    node_id: NodeId,
    base_dir: PathBuf,
    files: RwLock<HashMap<FileName, Arc<FileEntry>>>,
}

impl ReplicaStore {
    /// Creates the node-scoped output directory if absent.
    pub async fn create_output_dir(base_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(base_dir).await?;
        Ok(())
    }

    /// Seeds this node's replica set by copying every `.txt` file found in
    /// `source_dir` into `base_dir`, named `<stem>_node<id>.txt`, and
    /// initializing each file's version to 1.
    pub async fn bootstrap(node_id: NodeId, base_dir: PathBuf, source_dir: &Path) -> Result<Self> {
        Self::create_output_dir(&base_dir).await?;

        let mut files = HashMap::new();
        let mut read_dir = tokio::fs::read_dir(source_dir).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let file_name = FileName::new(file_name);

            let dest = replica_path(&base_dir, &file_name, &node_id);
            tokio::fs::copy(&path, &dest).await?;

            tracing::debug!(file = %file_name, node = %node_id, "seeded replica from source directory");
            files.insert(
                file_name,
                Arc::new(FileEntry {
                    version: Mutex::new(FIRST_VERSION),
                }),
            );
        }

        Ok(Self {
            node_id,
            base_dir,
            files: RwLock::new(files),
        })
    }

    /// Constructs an empty store without touching disk — used in tests that
    /// seed replicas directly via `local_overwrite`/`track`.
    pub fn empty(node_id: NodeId, base_dir: PathBuf) -> Self {
        Self {
            node_id,
            base_dir,
            files: RwLock::new(HashMap::new()),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub async fn is_tracked(&self, file: &FileName) -> bool {
        self.files.read().await.contains_key(file)
    }

    /// Registers a file with an initial version, creating it on disk if
    /// necessary. Used by tests and by explicit file-creation flows.
    pub async fn track(&self, file: FileName, initial_content: &str) -> Result<()> {
        {
            let mut files = self.files.write().await;
            files
                .entry(file.clone())
                .or_insert_with(|| Arc::new(FileEntry {
                    version: Mutex::new(FIRST_VERSION),
                }));
        }
        let path = replica_path(&self.base_dir, &file, &self.node_id);
        tokio::fs::write(&path, initial_content).await?;
        Ok(())
    }

    async fn entry(&self, file: &FileName) -> Option<Arc<FileEntry>> {
        self.files.read().await.get(file).cloned()
    }

    fn path_for(&self, file: &FileName) -> PathBuf {
        replica_path(&self.base_dir, file, &self.node_id)
    }

    async fn local_version_impl(&self, file: &FileName) -> Version {
        match self.entry(file).await {
            Some(entry) => *entry.version.lock().await,
            None => UNKNOWN_VERSION,
        }
    }

    async fn local_read_impl(&self, file: &FileName) -> Result<String> {
        let entry = self
            .entry(file)
            .await
            .ok_or_else(|| QfsError::UnknownFile(file.to_string()))?;

        // Hold the version lock while reading so a concurrent append/overwrite
        // on this same node cannot interleave with the read.
        let _guard = entry.version.lock().await;
        let content = tokio::fs::read_to_string(self.path_for(file)).await?;
        Ok(content)
    }

    async fn local_append_impl(
        &self,
        file: &FileName,
        update: &str,
        new_version: Version,
    ) -> Result<String> {
        let entry = self
            .entry(file)
            .await
            .ok_or_else(|| QfsError::UnknownFile(file.to_string()))?;

        let mut version = entry.version.lock().await;
        let path = self.path_for(file);

        let mut handle = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await?;
        handle.write_all(update.as_bytes()).await?;
        handle.write_all(b"\n").await?;
        handle.flush().await?;
        drop(handle);

        *version = new_version;
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(content)
    }

    async fn local_overwrite_impl(
        &self,
        file: &FileName,
        content: &str,
        new_version: Version,
    ) -> Result<String> {
        let entry = self
            .entry(file)
            .await
            .ok_or_else(|| QfsError::UnknownFile(file.to_string()))?;

        let mut version = entry.version.lock().await;
        let path = self.path_for(file);

        tokio::fs::write(&path, content).await?;
        *version = new_version;

        Ok(content.to_string())
    }
}

fn replica_path(base_dir: &Path, file: &FileName, node_id: &NodeId) -> PathBuf {
    base_dir.join(format!("{}_node{}.txt", file.stem(), node_id))
}

#[async_trait]
impl PeerCapability for ReplicaStore {
    async fn get_file_version(&self, file: &FileName) -> Result<Version> {
        Ok(self.local_version_impl(file).await)
    }

    async fn read_file_from_node(&self, file: &FileName) -> Result<String> {
        self.local_read_impl(file).await
    }

    async fn append_with_version(
        &self,
        file: &FileName,
        update: &str,
        new_version: Version,
    ) -> Result<String> {
        self.local_append_impl(file, update, new_version).await
    }

    async fn overwrite_with_version(
        &self,
        file: &FileName,
        content: &str,
        new_version: Version,
    ) -> Result<String> {
        self.local_overwrite_impl(file, content, new_version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (ReplicaStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (
            ReplicaStore::empty(NodeId::from("1"), dir.path().to_path_buf()),
            dir,
        )
    }

    #[tokio::test]
    async fn untracked_file_reports_unknown_version() {
        let (store, _dir) = store();
        let file = FileName::new("a.txt");
        assert_eq!(store.get_file_version(&file).await.unwrap(), UNKNOWN_VERSION);
        assert!(store.read_file_from_node(&file).await.is_err());
    }

    #[tokio::test]
    async fn append_bumps_version_and_content() {
        let (store, _dir) = store();
        let file = FileName::new("a.txt");
        store.track(file.clone(), "").await.unwrap();

        let content = store.append_with_version(&file, "hello", 2).await.unwrap();
        assert_eq!(content, "hello\n");
        assert_eq!(store.get_file_version(&file).await.unwrap(), 2);

        let content = store.append_with_version(&file, "world", 3).await.unwrap();
        assert_eq!(content, "hello\nworld\n");
        assert_eq!(store.get_file_version(&file).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn overwrite_replaces_content() {
        let (store, _dir) = store();
        let file = FileName::new("a.txt");
        store.track(file.clone(), "stale\n").await.unwrap();

        let content = store
            .overwrite_with_version(&file, "fresh\n", 5)
            .await
            .unwrap();
        assert_eq!(content, "fresh\n");
        assert_eq!(store.get_file_version(&file).await.unwrap(), 5);
        assert_eq!(store.read_file_from_node(&file).await.unwrap(), "fresh\n");
    }

    #[tokio::test]
    async fn bootstrap_copies_and_versions_source_files() {
        let source = tempfile::tempdir().unwrap();
        tokio::fs::write(source.path().join("notes.txt"), "seed\n")
            .await
            .unwrap();
        tokio::fs::write(source.path().join("ignored.md"), "skip\n")
            .await
            .unwrap();

        let replica_dir = tempfile::tempdir().unwrap();
        let store = ReplicaStore::bootstrap(
            NodeId::from("1"),
            replica_dir.path().to_path_buf(),
            source.path(),
        )
        .await
        .unwrap();

        let file = FileName::new("notes.txt");
        assert!(store.is_tracked(&file).await);
        assert_eq!(store.get_file_version(&file).await.unwrap(), FIRST_VERSION);
        assert_eq!(store.read_file_from_node(&file).await.unwrap(), "seed\n");
        assert!(!store.is_tracked(&FileName::new("ignored.md")).await);
    }
}
