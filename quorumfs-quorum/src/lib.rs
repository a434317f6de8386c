//! QuorumFS Quorum Engine - randomized quorum selection and the
//! coordinator-mediated read/write protocol.
//!
//! This is the core of the system (§4.4 of the design): the coordinator
//! assembles a random quorum, resolves the freshest replica by version,
//! performs the write on it, and propagates the result to the rest of
//! the quorum. Reads and writes of the same file serialize through the
//! coordinator's per-file protocol lock.

pub mod coordinator;
pub mod peer_handle;
pub mod sampling;

pub use coordinator::Coordinator;
pub use peer_handle::PeerHandle;
pub use sampling::sample_quorum;
