use async_trait::async_trait;

use crate::error::Result;
use crate::file::FileName;
use crate::version::Version;

/// The capability set every quorum member exposes, whether it is reached
/// in-process (the self-call optimization) or over the wire.
///
/// The Quorum Engine is written entirely against this trait so that its
/// fan-out logic never needs to know whether a given member is local or
/// remote — see the `PeerHandle` enum in `quorumfs-quorum`.
#[async_trait]
pub trait PeerCapability: Send + Sync {
    /// `get_file_version`: returns `UNKNOWN_VERSION` if the file is untracked.
    async fn get_file_version(&self, file: &FileName) -> Result<Version>;

    /// `read_file_from_node`: full on-disk content of the file.
    async fn read_file_from_node(&self, file: &FileName) -> Result<String>;

    /// `append_to_specific_file`: appends `update + "\n"` and sets the version.
    async fn append_with_version(
        &self,
        file: &FileName,
        update: &str,
        new_version: Version,
    ) -> Result<String>;

    /// `update_file_to_text`: overwrites the file with `content` and sets the version.
    async fn overwrite_with_version(
        &self,
        file: &FileName,
        content: &str,
        new_version: Version,
    ) -> Result<String>;
}
