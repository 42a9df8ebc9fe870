#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod error;
mod router;

pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
pub use router::{ROUTER_STREAM, RouterPublisher};

/// Tracing target for NATS operations.
pub const TRACING_TARGET: &str = "usagehub_nats";
