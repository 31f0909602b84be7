//! Configuration loading for the knowledge-base engine: `.kb/config.yaml`
//! discovery and the explicit-path/env/discovery/defaults resolution chain.

pub mod config;
pub mod discovery;

pub use config::Config;
