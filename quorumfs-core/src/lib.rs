//! QuorumFS Core - Fundamental abstractions for the replicated file store
//!
//! This module provides the core types, traits, and interfaces shared by
//! every other QuorumFS crate: node identity, the static node registry,
//! file/version types, the error type, and the peer capability trait that
//! the Quorum Engine dispatches through.

pub mod error;
pub mod file;
pub mod node;
pub mod registry;
pub mod traits;
pub mod version;

pub use error::{QfsError, Result};
pub use file::FileName;
pub use node::{NodeAddr, NodeId};
pub use registry::NodeRegistry;
pub use traits::PeerCapability;
pub use version::{Version, FIRST_VERSION, UNKNOWN_VERSION};
