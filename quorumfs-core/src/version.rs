/// Per-node, per-file version counter. `UNKNOWN` is the sentinel reported by
/// `get_file_version` for a file the node has never seen.
pub type Version = i64;

pub const UNKNOWN_VERSION: Version = -1;
pub const FIRST_VERSION: Version = 1;
