#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for core operations.
pub const TRACING_TARGET: &str = "usagehub_core";

pub mod archive;
mod error;
mod identity;
pub mod ports;
pub mod types;

pub use error::{BoxedError, Error, ErrorKind, Result, codes};
pub use identity::RequestId;
