//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for the Loket queue engine.

pub mod error;
pub mod handler;
mod rate_limiter;
pub mod server;
pub mod types;

pub use jsonrpsee::server::ServerHandle;
pub use server::{RpcServer, RpcServerConfig};
