//! QuorumFS RPC - Peer and client transport
//!
//! Length-prefixed bincode framing over TCP, multiplexing the
//! `client_server` and `server` (peer) namespaces over a single listener
//! per node, plus a lazily-populated connection pool for outbound calls.

pub mod api;
pub mod client;
pub mod framing;
pub mod pool;
pub mod server;
pub mod wire;

pub use api::{ClientService, PeerService};
pub use client::RpcClient;
pub use pool::PeerClientPool;
pub use server::{dispatch_request, serve};
pub use wire::{WireRequest, WireResponse};
