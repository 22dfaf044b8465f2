//! # Dispersy Node
//! The message-exchange engine for a single overlay node: message store,
//! ingress pipeline, candidate walker, and request cache.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub mod candidate;
pub mod community;
pub mod config;
pub mod error;
pub mod node;
pub mod pipeline;
pub mod request_cache;
pub mod responders;
pub mod signature;
pub mod stats;
pub mod store;
pub mod timeline;
pub mod undo;

pub use community::{Community, LifecycleState};
pub use config::{BatchConfig, NodeConfig};
pub use node::{Node, NodeEvents};
pub use stats::Statistics;
