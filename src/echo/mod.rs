//! Echo demonstration harness
//!
//! A QUIC echo server and a load client that exercises the session pool.

mod client;
mod server;

pub use client::{echo_exchange, run_call, run_load, LoadOptions, LoadReport};
pub use server::EchoServer;
