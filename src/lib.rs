//! Command line access to an Esplora block explorer and to elements/bitcoin nodes.
//!
//! A command line is looked up in the [`registry`], its arguments are resolved
//! (prompting for missing ones), and the command runs as an explorer request, a single
//! node call or a multi-step flow. See [`dispatch::Dispatcher`].

pub use {
    // export globals
    bitcoincore_rpc::{self, Client, RpcApi},
    config::{Config, RpcConnection},
    error::{Error, Result},
    network::NetworkPrefix,
    render::{render_value, Rendered},
    rpc::RpcNode,
    std::collections::HashMap,
};

pub mod config;
pub mod dispatch;
pub mod error;
pub mod explorer;
pub mod network;
pub mod node;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod rest;
pub mod rpc;
pub mod tools;
pub mod types;
